// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification sinks: where formatted player events are delivered.

pub mod discord;
pub mod ntfy;

use std::future::Future;
use std::pin::Pin;
use std::sync::Once;
use std::time::Duration;

use crate::config::{Config, NotifyService};
use crate::error::SinkError;

pub use discord::DiscordSink;
pub use ntfy::NtfySink;

/// Boxed future returned by [`NotificationSink::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>;

/// A destination for notifications. Delivery is best effort: callers log
/// failures and move on.
pub trait NotificationSink: Send + Sync {
    fn send<'a>(&'a self, message: &'a str, title: &'a str) -> SendFuture<'a>;

    /// Short name used in log fields.
    fn name(&self) -> &'static str;
}

/// Build the sink selected by `config`. Expects a validated config.
pub fn build_sink(config: &Config) -> anyhow::Result<Box<dyn NotificationSink>> {
    let timeout = config.sink_timeout();
    match config.service_enum()? {
        NotifyService::Ntfy => {
            let topic = config
                .ntfy_topic
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("ntfy topic is not configured"))?;
            Ok(Box::new(NtfySink::new(&config.ntfy_url, topic, config.ntfy_token.clone(), timeout)?))
        }
        NotifyService::Discord => {
            let url = config
                .discord_webhook_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("discord webhook URL is not configured"))?;
            Ok(Box::new(DiscordSink::new(url, timeout)?))
        }
    }
}

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Shared HTTP client construction with a per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    ensure_crypto_provider();
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Map a non-2xx response to [`SinkError::Status`], keeping a short excerpt
/// of the body for the log.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<(), SinkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > 200 {
        let mut cut = 200;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(SinkError::Status { status: status.as_u16(), body: body.trim().to_owned() })
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
