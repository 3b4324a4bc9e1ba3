// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Follows a game server log across rotations and forwards player join,
//! leave, and whitelist-rejection events to ntfy or Discord.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod follow;
pub mod matcher;
pub mod run;
pub mod sink;
#[cfg(test)]
pub mod test_support;
