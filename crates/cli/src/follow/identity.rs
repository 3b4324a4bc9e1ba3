// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::{File, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Metadata snapshot used to decide whether the followed file was replaced.
///
/// `dev`/`ino` survive renames, so a rotated file that happens to have the
/// same size as its predecessor is still told apart by inode. On platforms
/// without inode numbers both are zero and only the mtime/length rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
    modified: Option<SystemTime>,
    len: u64,
}

/// Why a file is considered replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceReason {
    /// The path now points at a different inode (rename + recreate).
    NewInode,
    /// Same inode, but shorter than what was already consumed.
    Truncated,
    /// Same inode, but the modification time moved backward.
    MtimeRewound,
    /// The effective path changed (fallback file vs. primary path).
    PathChanged,
}

impl std::fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewInode => f.write_str("new-inode"),
            Self::Truncated => f.write_str("truncated"),
            Self::MtimeRewound => f.write_str("mtime-rewound"),
            Self::PathChanged => f.write_str("path-changed"),
        }
    }
}

/// Result of comparing the recorded identity against a fresh snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityChange {
    Same,
    /// Same file, appended to (mtime and/or length moved forward).
    Advanced,
    Replaced(ReplaceReason),
}

impl FileIdentity {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self { dev: meta.dev(), ino: meta.ino(), modified: meta.modified().ok(), len: meta.len() }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self { dev: 0, ino: 0, modified: meta.modified().ok(), len: meta.len() }
    }

    /// Snapshot an open handle. Preferred right after opening, since it
    /// describes exactly the file that was opened.
    pub fn from_file(file: &File) -> io::Result<Self> {
        Ok(Self::from_metadata(&file.metadata()?))
    }

    /// Snapshot whatever `path` currently points at.
    pub fn of_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_metadata(&std::fs::metadata(path)?))
    }

    pub fn same_file(&self, other: &Self) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Compare the recorded snapshot (`self`) with `current`, given that
    /// `offset` bytes of the recorded file have been consumed.
    pub fn compare(&self, current: &Self, offset: u64) -> IdentityChange {
        if !self.same_file(current) {
            return IdentityChange::Replaced(ReplaceReason::NewInode);
        }
        if current.len < offset {
            return IdentityChange::Replaced(ReplaceReason::Truncated);
        }
        if let (Some(before), Some(now)) = (self.modified, current.modified) {
            if now < before {
                return IdentityChange::Replaced(ReplaceReason::MtimeRewound);
            }
        }
        if self == current {
            IdentityChange::Same
        } else {
            IdentityChange::Advanced
        }
    }
}

impl std::fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
