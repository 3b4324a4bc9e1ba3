// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: mock sinks, a capturing HTTP server, and
//! assertion helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, Uri};
use tokio::sync::Mutex;

use crate::error::SinkError;
use crate::sink::{NotificationSink, SendFuture};

/// One request received by [`spawn_capture_server`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

/// Start an HTTP server on an ephemeral port that records every request
/// and answers with `status`. Returns its base URL.
pub async fn spawn_capture_server(status: StatusCode) -> anyhow::Result<(String, Captured)> {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&captured);
    let app = axum::Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: String| {
        let store = Arc::clone(&store);
        async move {
            store.lock().await.push(CapturedRequest { path: uri.path().to_owned(), headers, body });
            status
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), captured))
}

/// Sink that records `(message, title)` pairs, optionally failing every send.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub attempts: Arc<AtomicUsize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }
}

impl NotificationSink for RecordingSink {
    fn send<'a>(&'a self, message: &'a str, title: &'a str) -> SendFuture<'a> {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SinkError::Status { status: 503, body: "unavailable".to_owned() });
            }
            self.sent.lock().await.push((message.to_owned(), title.to_owned()));
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
