// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `mcnotify` binary against a temporary log directory and
//! a local HTTP server standing in for ntfy.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, Uri};
use tokio::sync::Mutex;

/// Resolve the path to the compiled `mcnotify` binary.
pub fn mcnotify_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("mcnotify")
}

/// One request received by a [`MockNtfy`].
#[derive(Debug, Clone)]
pub struct Received {
    pub path: String,
    pub title: Option<String>,
    pub body: String,
}

/// Local HTTP server that records every request and answers 200.
pub struct MockNtfy {
    url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl MockNtfy {
    pub async fn start() -> anyhow::Result<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&received);
        let app = axum::Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: String| {
            let store = Arc::clone(&store);
            async move {
                let title =
                    headers.get("title").and_then(|v| v.to_str().ok()).map(str::to_owned);
                store.lock().await.push(Received { path: uri.path().to_owned(), title, body });
                StatusCode::OK
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self { url, received })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait until at least `n` requests have arrived, returning all of them.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> anyhow::Result<Vec<Received>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let received = self.received.lock().await.clone();
            if received.len() >= n {
                return Ok(received);
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("expected {n} requests within {timeout:?}, got {received:?}");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    pub async fn count(&self) -> usize {
        self.received.lock().await.len()
    }
}

/// A running `mcnotify` process that is killed on drop.
pub struct McnotifyProcess {
    child: Child,
    output: mpsc::Receiver<String>,
}

/// Builder for the environment an [`McnotifyProcess`] runs with.
pub struct McnotifyBuilder {
    envs: Vec<(String, String)>,
}

impl McnotifyBuilder {
    /// Follow `log_file` and publish to topic `mc` on `ntfy_url`.
    pub fn new(log_file: &Path, ntfy_url: &str) -> Self {
        let envs = [
            ("LOG_FILE", log_file.to_string_lossy().into_owned()),
            ("NOTIFY_SERVICE", "ntfy".to_owned()),
            ("NTFY_URL", ntfy_url.to_owned()),
            ("NTFY_TOPIC", "mc".to_owned()),
            ("MCNOTIFY_LOG_LEVEL", "info".to_owned()),
            ("MCNOTIFY_POLL_TICK_MS", "20".to_owned()),
            ("MCNOTIFY_IDENTITY_CHECK_MS", "50".to_owned()),
            ("MCNOTIFY_RETRY_BACKOFF_MS", "50".to_owned()),
            ("NO_COLOR", "1".to_owned()),
        ];
        Self { envs: envs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect() }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.retain(|(k, _)| k != key);
        self.envs.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn spawn(self) -> anyhow::Result<McnotifyProcess> {
        let binary = mcnotify_binary();
        anyhow::ensure!(binary.exists(), "mcnotify binary not found at {}", binary.display());

        let mut child = Command::new(&binary)
            .env_clear()
            .envs(self.envs)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (tx, output) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }
        Ok(McnotifyProcess { child, output })
    }
}

fn forward_lines(stream: impl std::io::Read + Send + 'static, tx: mpsc::Sender<String>) {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

impl McnotifyProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Wait until a line of the process's output contains `needle`.
    pub async fn wait_for_output(&self, needle: &str, timeout: Duration) -> anyhow::Result<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            while let Ok(line) = self.output.try_recv() {
                if line.contains(needle) {
                    return Ok(line);
                }
            }
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("output never contained {needle:?} within {timeout:?}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<ExitStatus> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("mcnotify did not exit within {timeout:?}");
            }
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for McnotifyProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
