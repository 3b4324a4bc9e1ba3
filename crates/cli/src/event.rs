// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// A player event recognized in the server log.
///
/// `server` is only populated by grammars that route players between
/// several backends (the proxy log names the destination server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    Join { player: String, server: Option<String> },
    Leave { player: String, server: Option<String> },
    WhitelistReject { player: String, server: Option<String> },
}

impl PlayerEvent {
    pub fn player(&self) -> &str {
        match self {
            Self::Join { player, .. }
            | Self::Leave { player, .. }
            | Self::WhitelistReject { player, .. } => player,
        }
    }

    pub fn server(&self) -> Option<&str> {
        match self {
            Self::Join { server, .. }
            | Self::Leave { server, .. }
            | Self::WhitelistReject { server, .. } => server.as_deref(),
        }
    }

    /// Short category name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::WhitelistReject { .. } => "whitelist",
        }
    }

    /// Human-readable notification text.
    pub fn message(&self) -> String {
        match self {
            Self::Join { player, server: None } => format!("{player} joined the server"),
            Self::Join { player, server: Some(server) } => format!("{player} joined {server}"),
            Self::Leave { player, server: None } => format!("{player} left the server"),
            Self::Leave { player, server: Some(server) } => format!("{player} left {server}"),
            Self::WhitelistReject { player, server: None } => {
                format!("{player} failed to join (not whitelisted)")
            }
            Self::WhitelistReject { player, server: Some(server) } => {
                format!("{player} failed to join {server} (not whitelisted)")
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
