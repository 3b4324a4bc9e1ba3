// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation-aware log following.
//!
//! [`RotatingReader`] tails whatever file currently lives at the target
//! path. It starts at end of file, re-checks the file's identity on a fixed
//! cadence, reopens when the file is replaced, and keeps retrying while the
//! file is missing. Files opened after that first one are read from their
//! start. A read that finds the file truncated in place restarts at offset 0.

pub mod fingerprint;
pub mod identity;
pub mod locate;
pub mod reader;

use std::time::Duration;

pub use fingerprint::Fingerprint;
pub use identity::{FileIdentity, IdentityChange, ReplaceReason};
pub use reader::RotatingReader;

/// Timing and fallback knobs for a [`RotatingReader`].
#[derive(Debug, Clone)]
pub struct FollowSettings {
    /// Filename prefix for the directory fallback. Empty disables it.
    pub rotation_prefix: String,
    /// Idle wait between reads when no new data is available.
    pub poll_tick: Duration,
    /// How often the file's identity is re-checked.
    pub identity_interval: Duration,
    /// Wait before retrying after the file went missing or a read failed.
    pub retry_backoff: Duration,
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            rotation_prefix: String::new(),
            poll_tick: Duration::from_millis(100),
            identity_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Observable state of the reader's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No handle held; waiting for the file to (re)appear.
    NoFile,
    /// Handle held, identity checked within the last interval.
    Open,
    /// Handle held, identity check overdue.
    Stale,
}

/// Outcome of one synchronous step of the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// One complete line, newline stripped.
    Line(String),
    /// File open, no complete line available yet.
    Idle,
    /// Neither the target nor a fallback file exists.
    Unavailable,
    /// An I/O error released the handle.
    Fault,
}
