// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolving the file to follow, with a directory fallback for log rollers
//! that briefly leave the target path empty during rotation.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Rotated archives are never followed.
const ARCHIVE_EXTENSIONS: &[&str] = &["gz", "zip", "bz2", "xz", "zst"];

/// Resolve the effective file to follow.
///
/// Returns `target` when it is a regular file. Otherwise scans the parent
/// directory for regular files whose name starts with `prefix` and picks the
/// most recently modified one. An empty prefix disables the fallback.
pub fn resolve(target: &Path, prefix: &str) -> Option<PathBuf> {
    if target.is_file() {
        return Some(target.to_path_buf());
    }
    if prefix.is_empty() {
        return None;
    }
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    newest_with_prefix(dir, prefix)
}

/// Most recently modified non-archive regular file in `dir` whose name
/// starts with `prefix`. Ties keep the first entry seen.
pub fn newest_with_prefix(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(prefix) || is_archive(name) {
            continue;
        }
        // Follow symlinks: a `latest.log` symlink to the live file is fine.
        let Ok(meta) = std::fs::metadata(entry.path()) else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let newer = best.as_ref().map_or(true, |(t, _)| modified > *t);
        if newer {
            best = Some((modified, entry.path()));
        }
    }

    best.map(|(_, path)| path)
}

fn is_archive(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

#[cfg(test)]
#[path = "locate_tests.rs"]
mod tests;
