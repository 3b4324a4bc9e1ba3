// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde::Serialize;

use super::{check_status, http_client, NotificationSink, SendFuture};

/// Embed sidebar color (green).
pub const EMBED_COLOR: u32 = 0x00ff00;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
}

/// Posts each message as a single embed to a Discord webhook.
pub struct DiscordSink {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordSink {
    pub fn new(webhook_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self { client: http_client(timeout)?, webhook_url: webhook_url.to_owned() })
    }
}

impl NotificationSink for DiscordSink {
    fn send<'a>(&'a self, message: &'a str, title: &'a str) -> SendFuture<'a> {
        Box::pin(async move {
            let payload = WebhookPayload {
                embeds: [Embed { title, description: message, color: EMBED_COLOR }],
            };
            let resp = self.client.post(&self.webhook_url).json(&payload).send().await?;
            check_status(resp).await
        })
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
