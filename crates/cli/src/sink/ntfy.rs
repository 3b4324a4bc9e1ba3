// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::{check_status, http_client, NotificationSink, SendFuture};

/// Publishes plain-text messages to an ntfy topic.
pub struct NtfySink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl NtfySink {
    pub fn new(
        base_url: &str,
        topic: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let endpoint = format!("{}/{}", base_url.trim_end_matches('/'), topic);
        let token = token.filter(|t| !t.is_empty());
        Ok(Self { client: http_client(timeout)?, endpoint, token })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NotificationSink for NtfySink {
    fn send<'a>(&'a self, message: &'a str, title: &'a str) -> SendFuture<'a> {
        Box::pin(async move {
            let mut req = self
                .client
                .post(&self.endpoint)
                .header("Title", title)
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(message.to_owned());
            if let Some(ref token) = self.token {
                req = req.bearer_auth(token);
            }
            let resp = req.send().await?;
            check_status(resp).await
        })
    }

    fn name(&self) -> &'static str {
        "ntfy"
    }
}
