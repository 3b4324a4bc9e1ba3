// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SourceError;

use super::fingerprint::Fingerprint;
use super::identity::{FileIdentity, IdentityChange, ReplaceReason};
use super::{locate, FollowSettings, Phase, Step};

/// Result of one read attempt on the open handle.
enum ReadOutcome {
    Line(String),
    /// No complete line available yet.
    Pending,
    /// The file no longer holds the bytes already consumed from it.
    Truncated,
}

/// Where a released handle stopped, so a reopen of the same file resumes
/// there instead of repeating or skipping lines.
struct Resume {
    identity: FileIdentity,
    offset: u64,
    head: Fingerprint,
}

/// The single open position into the followed file.
struct OpenLog {
    path: PathBuf,
    reader: BufReader<File>,
    identity: FileIdentity,
    offset: u64,
    head: Fingerprint,
    /// Bytes of a line whose newline has not been written yet.
    partial: Vec<u8>,
}

impl OpenLog {
    /// Read one complete line. A trailing fragment stays buffered until its
    /// newline arrives.
    fn read_line(&mut self) -> std::io::Result<ReadOutcome> {
        // Only consult the file when the next read will actually hit it;
        // buffered bytes were valid when they were read.
        if self.reader.buffer().is_empty() && self.rewritten()? {
            return Ok(ReadOutcome::Truncated);
        }

        let start = self.offset;
        let before = self.partial.len();
        let n = self.reader.read_until(b'\n', &mut self.partial)?;
        if n == 0 {
            return Ok(ReadOutcome::Pending);
        }
        self.head.extend(start, &self.partial[before..]);
        self.offset += n as u64;
        if self.partial.last() != Some(&b'\n') {
            return Ok(ReadOutcome::Pending);
        }
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Ok(ReadOutcome::Line(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Same inode, but shorter than the offset or with different leading
    /// bytes than were consumed.
    fn rewritten(&self) -> std::io::Result<bool> {
        let file = self.reader.get_ref();
        if file.metadata()?.len() < self.offset {
            return Ok(true);
        }
        Ok(!self.head.matches(file, &self.path)?)
    }

    /// Everything still readable from this handle, including a final
    /// unterminated fragment. Used when the file is about to be released.
    fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match self.read_line() {
                Ok(ReadOutcome::Line(line)) => lines.push(line),
                Ok(ReadOutcome::Pending | ReadOutcome::Truncated) => break,
                Err(e) => {
                    debug!(path = %self.path.display(), err = %e, "read failed while draining");
                    break;
                }
            }
        }
        if !self.partial.is_empty() {
            lines.push(String::from_utf8_lossy(&std::mem::take(&mut self.partial)).into_owned());
        }
        lines
    }

    /// Resume point at the start of any unfinished line.
    fn into_resume(self) -> Resume {
        Resume {
            identity: self.identity,
            offset: self.offset - self.partial.len() as u64,
            head: self.head,
        }
    }
}

/// Filesystem notifications used to cut idle waits short.
struct Wake {
    _watcher: notify::RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

/// Tails the file at a target path across rotation, truncation and
/// temporary absence.
///
/// Lines that existed before monitoring started are never produced: the
/// first open seeks to the end. Every later open reads a new file from its
/// start, or resumes where the previous handle stopped when it is the same
/// file with the same leading bytes. The file's identity is re-checked every
/// `identity_interval`; when it was replaced, any lines still unread in the
/// old handle are produced first.
pub struct RotatingReader {
    target: PathBuf,
    settings: FollowSettings,
    open: Option<OpenLog>,
    last_check: Option<Instant>,
    /// Lines drained from a released handle, produced before anything else.
    pending: VecDeque<String>,
    /// Set until the first open attempt; only that open tails.
    tail_on_open: bool,
    resume: Option<Resume>,
    /// Set while the file is missing so the absence is logged once.
    absent: bool,
    wake: Option<Wake>,
}

impl RotatingReader {
    pub fn new(target: PathBuf, settings: FollowSettings) -> Self {
        let wake = setup_notify_watcher(&target);
        Self {
            target,
            settings,
            open: None,
            last_check: None,
            pending: VecDeque::new(),
            tail_on_open: true,
            resume: None,
            absent: false,
            wake,
        }
    }

    /// Path of the file currently held open, which may be a fallback file.
    pub fn current_path(&self) -> Option<&Path> {
        self.open.as_ref().map(|o| o.path.as_path())
    }

    /// Byte offset into the currently open file.
    pub fn offset(&self) -> Option<u64> {
        self.open.as_ref().map(|o| o.offset)
    }

    pub fn phase(&self) -> Phase {
        match self.open {
            None => Phase::NoFile,
            Some(_) if self.identity_due() => Phase::Stale,
            Some(_) => Phase::Open,
        }
    }

    /// Run one step of the state machine without waiting.
    pub fn poll_step(&mut self) -> Step {
        if let Some(line) = self.pending.pop_front() {
            return Step::Line(line);
        }

        if self.open.is_none() {
            // No handle held: open whenever the file is present, regardless
            // of what identity was last seen.
            if let Err(e) = self.open_current() {
                return self.fail(e);
            }
        } else if self.identity_due() {
            self.check_identity();
            if let Some(line) = self.pending.pop_front() {
                return Step::Line(line);
            }
        }

        // At most one reopen per step: a truncation found by the read.
        for _ in 0..2 {
            let Some(open) = self.open.as_mut() else {
                return Step::Unavailable;
            };
            match open.read_line() {
                Ok(ReadOutcome::Line(line)) => return Step::Line(line),
                Ok(ReadOutcome::Pending) => return Step::Idle,
                Ok(ReadOutcome::Truncated) => {
                    let path = open.path.clone();
                    info!(
                        path = %path.display(),
                        reason = %ReplaceReason::Truncated,
                        "log file replaced, reopening"
                    );
                    self.discard();
                    if let Err(e) = self.open_path(path) {
                        return self.fail(e);
                    }
                }
                Err(source) => {
                    let path = open.path.clone();
                    self.resume = self.open.take().map(OpenLog::into_resume);
                    return self.fail(SourceError::Read { path, source });
                }
            }
        }
        Step::Idle
    }

    /// Wait for the next line. Never returns while no line is available.
    pub async fn next_line(&mut self) -> String {
        loop {
            match self.poll_step() {
                Step::Line(line) => return line,
                Step::Idle => self.idle_wait().await,
                Step::Unavailable | Step::Fault => {
                    tokio::time::sleep(self.settings.retry_backoff).await
                }
            }
        }
    }

    /// Infinite stream of lines.
    pub fn lines(self) -> impl Stream<Item = String> {
        futures_util::stream::unfold(self, |mut reader| async move {
            let line = reader.next_line().await;
            Some((line, reader))
        })
    }

    fn identity_due(&self) -> bool {
        self.last_check.map_or(true, |t| t.elapsed() >= self.settings.identity_interval)
    }

    fn open_current(&mut self) -> Result<(), SourceError> {
        let Some(path) = locate::resolve(&self.target, &self.settings.rotation_prefix) else {
            // Absent at startup: whatever appears later is new content.
            self.tail_on_open = false;
            return Err(SourceError::Unavailable(self.target.clone()));
        };
        self.open_path(path)
    }

    fn open_path(&mut self, path: PathBuf) -> Result<(), SourceError> {
        let opened = File::open(&path).and_then(|file| {
            let identity = FileIdentity::from_file(&file)?;
            let head = Fingerprint::read(&file, &path)?;
            Ok((file, identity, head))
        });
        let (mut file, identity, head) =
            opened.map_err(|source| SourceError::Read { path: path.clone(), source })?;

        let offset = self.start_position(&identity, &head);
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| SourceError::Read { path: path.clone(), source })?;

        info!(path = %path.display(), file = %identity, offset, "following log file");
        self.open = Some(OpenLog {
            path,
            reader: BufReader::new(file),
            identity,
            offset,
            head,
            partial: Vec::new(),
        });
        self.last_check = Some(Instant::now());
        self.absent = false;
        Ok(())
    }

    /// End of file on the first open, the previous position when the same
    /// unmodified file comes back, otherwise the start of the file.
    fn start_position(&mut self, identity: &FileIdentity, head: &Fingerprint) -> u64 {
        if std::mem::take(&mut self.tail_on_open) {
            return identity.len();
        }
        match self.resume.take() {
            Some(r)
                if r.identity.same_file(identity)
                    && identity.len() >= r.offset
                    && head.continues(&r.head) =>
            {
                r.offset
            }
            _ => 0,
        }
    }

    /// Compare the open file's identity with what the path resolves to now,
    /// reopening or releasing as needed.
    fn check_identity(&mut self) {
        self.last_check = Some(Instant::now());

        let current = locate::resolve(&self.target, &self.settings.rotation_prefix)
            .and_then(|path| FileIdentity::of_path(&path).ok().map(|id| (path, id)));
        let Some((path, identity)) = current else {
            info!(path = %self.target.display(), "log file disappeared");
            self.release();
            return;
        };
        let Some(open) = self.open.as_mut() else {
            return;
        };

        let change = if path != open.path {
            IdentityChange::Replaced(ReplaceReason::PathChanged)
        } else {
            open.identity.compare(&identity, open.offset)
        };
        match change {
            IdentityChange::Same => {}
            IdentityChange::Advanced => open.identity = identity,
            IdentityChange::Replaced(reason) => {
                info!(path = %path.display(), %reason, "log file replaced, reopening");
                if reason == ReplaceReason::Truncated {
                    self.discard();
                } else {
                    self.release();
                }
                if let Err(e) = self.open_path(path) {
                    self.report(&e);
                }
            }
        }
    }

    /// Drop the handle, queueing whatever it still had to offer.
    fn release(&mut self) {
        if let Some(mut open) = self.open.take() {
            self.pending.extend(open.drain());
            self.resume = Some(open.into_resume());
        }
    }

    /// Drop the handle without reading from it; its offset is meaningless.
    fn discard(&mut self) {
        self.open = None;
        self.resume = None;
    }

    fn fail(&mut self, err: SourceError) -> Step {
        self.report(&err);
        match err {
            SourceError::Unavailable(_) => Step::Unavailable,
            SourceError::Read { .. } => Step::Fault,
        }
    }

    fn report(&mut self, err: &SourceError) {
        match err {
            SourceError::Unavailable(_) => {
                if self.absent {
                    debug!("{err}, retrying");
                } else {
                    warn!("{err}, waiting for it to appear");
                    self.absent = true;
                }
            }
            SourceError::Read { .. } => warn!(code = err.as_str(), "{err}, retrying"),
        }
    }

    /// Sleep for one poll tick, waking early on filesystem activity.
    async fn idle_wait(&mut self) {
        let duration = self.settings.poll_tick;
        let Some(wake) = self.wake.as_mut() else {
            tokio::time::sleep(duration).await;
            return;
        };
        let closed = tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            woke = wake.rx.recv() => woke.is_none(),
        };
        if closed {
            self.wake = None;
        }
    }
}

/// Set up a `notify` watcher on the target's parent directory so creation
/// and rotation are noticed too. Returns `None` when watching is unavailable;
/// the reader then relies on timed polling alone.
fn setup_notify_watcher(target: &Path) -> Option<Wake> {
    use notify::{RecursiveMode, Watcher};

    let (wake_tx, rx) = mpsc::channel::<()>(1);
    let mut watcher = notify::recommended_watcher(move |_: notify::Result<notify::Event>| {
        let _ = wake_tx.try_send(());
    })
    .ok()?;

    let watch_path = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher.watch(watch_path, RecursiveMode::NonRecursive).ok()?;

    Some(Wake { _watcher: watcher, rx })
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
