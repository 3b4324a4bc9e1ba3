// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leading-bytes fingerprint of the followed file.
//!
//! An in-place truncation that is refilled past the read offset before the
//! next check leaves inode and length looking like a plain append. The first
//! bytes of the file do not survive that, so they are compared instead.

use std::fs::File;
use std::io;
use std::path::Path;

/// Number of leading bytes recorded per file.
pub const FINGERPRINT_BYTES: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    head: Vec<u8>,
}

impl Fingerprint {
    /// Record the first bytes currently in `file`. `path` is only used on
    /// platforms without positional reads.
    pub fn read(file: &File, path: &Path) -> io::Result<Self> {
        Ok(Self { head: read_head(file, path, FINGERPRINT_BYTES)? })
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self { head: bytes[..bytes.len().min(FINGERPRINT_BYTES)].to_vec() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.head
    }

    pub fn len(&self) -> usize {
        self.head.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty()
    }

    /// Grow a short fingerprint with `bytes` consumed at `offset`, as long as
    /// they overlap or directly follow what is already recorded.
    pub fn extend(&mut self, offset: u64, bytes: &[u8]) {
        let recorded = self.head.len() as u64;
        let room = FINGERPRINT_BYTES.saturating_sub(self.head.len());
        if room == 0 || offset > recorded || offset + (bytes.len() as u64) <= recorded {
            return;
        }
        let fresh = &bytes[(recorded - offset) as usize..];
        self.head.extend_from_slice(&fresh[..fresh.len().min(room)]);
    }

    /// True when `self` begins with everything `earlier` recorded, i.e. the
    /// file may have grown since but was not rewritten.
    pub fn continues(&self, earlier: &Fingerprint) -> bool {
        self.head.starts_with(&earlier.head)
    }

    /// Re-read the file's leading bytes and check they are unchanged.
    pub fn matches(&self, file: &File, path: &Path) -> io::Result<bool> {
        if self.head.is_empty() {
            return Ok(true);
        }
        Ok(read_head(file, path, self.head.len())? == self.head)
    }
}

#[cfg(unix)]
fn read_head(file: &File, _path: &Path, n: usize) -> io::Result<Vec<u8>> {
    use std::os::unix::fs::FileExt;

    // Positional reads leave the handle's cursor where the reader put it.
    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        match file.read_at(&mut buf[filled..], filled as u64) {
            Ok(0) => break,
            Ok(k) => filled += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

#[cfg(not(unix))]
fn read_head(_file: &File, path: &Path, n: usize) -> io::Result<Vec<u8>> {
    use std::io::Read;

    let mut buf = Vec::with_capacity(n);
    File::open(path)?.take(n as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
