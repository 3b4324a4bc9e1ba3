// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use std::fmt;
use std::path::PathBuf;

/// Transient faults raised while following the log file.
///
/// Neither variant is fatal: the reader releases its handle and retries
/// after the configured backoff.
#[derive(Debug)]
pub enum SourceError {
    /// Neither the target path nor any fallback candidate resolves to a file.
    Unavailable(PathBuf),
    /// An I/O fault on the open handle or while inspecting the file.
    Read { path: PathBuf, source: std::io::Error },
}

impl SourceError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "SOURCE_UNAVAILABLE",
            Self::Read { .. } => "READ_ERROR",
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(path) => write!(f, "log file unavailable: {}", path.display()),
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Read { source, .. } => Some(source),
        }
    }
}

/// Notification delivery failure. Logged by the dispatcher and discarded.
#[derive(Debug)]
pub enum SinkError {
    /// Connection, TLS or timeout failure before a response arrived.
    Transport(reqwest::Error),
    /// The endpoint answered with a non-2xx status.
    Status { status: u16, body: String },
}

impl SinkError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT",
            Self::Status { .. } => "BAD_STATUS",
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Status { status, body } if body.is_empty() => write!(f, "HTTP {status}"),
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
