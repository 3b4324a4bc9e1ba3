// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::dispatch::EventFilter;
use crate::follow::FollowSettings;
use crate::matcher::Grammar;

/// Discord webhook URLs must point at the official API host.
const DISCORD_WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

/// Which notification backend receives messages.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NotifyService {
    #[default]
    Ntfy,
    Discord,
}

impl std::fmt::Display for NotifyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ntfy => f.write_str("ntfy"),
            Self::Discord => f.write_str("discord"),
        }
    }
}

impl std::str::FromStr for NotifyService {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ntfy" => Ok(Self::Ntfy),
            "discord" => Ok(Self::Discord),
            other => anyhow::bail!("invalid notify service: {other} (expected ntfy or discord)"),
        }
    }
}

/// Game server log monitor that forwards player events to ntfy or Discord.
#[derive(Debug, Parser)]
#[command(name = "mcnotify", version, about)]
pub struct Config {
    /// Path to the server log file to follow.
    #[arg(long, env = "LOG_FILE", default_value = "/logs/latest.log")]
    pub log_file: PathBuf,

    /// Filename prefix used to find a replacement file while the log file
    /// is missing during rotation. Defaults to the log file's stem.
    #[arg(long, env = "LOG_ROTATION_PREFIX")]
    pub rotation_prefix: Option<String>,

    /// Log grammar (standard, velocity).
    #[arg(long, env = "LOG_GRAMMAR", default_value = "standard")]
    pub grammar: String,

    /// Notification service (ntfy, discord).
    #[arg(long, env = "NOTIFY_SERVICE", default_value = "ntfy")]
    pub notify_service: String,

    /// Base URL of the ntfy server.
    #[arg(long, env = "NTFY_URL", default_value = "https://ntfy.sh")]
    pub ntfy_url: String,

    /// ntfy topic to publish to.
    #[arg(long, env = "NTFY_TOPIC")]
    pub ntfy_topic: Option<String>,

    /// Bearer token for ntfy access control.
    #[arg(long, env = "NTFY_TOKEN")]
    pub ntfy_token: Option<String>,

    /// Discord webhook URL.
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    pub discord_webhook_url: Option<String>,

    /// Title attached to every notification.
    #[arg(long, env = "NOTIFY_SUBJECT", default_value = "Minecraft Server")]
    pub notify_subject: String,

    /// Notify when a player joins.
    #[arg(long, env = "NOTIFY_JOIN", default_value_t = true, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    pub notify_join: bool,

    /// Notify when a player leaves.
    #[arg(long, env = "NOTIFY_LEAVE", default_value_t = true, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    pub notify_leave: bool,

    /// Notify when a player is rejected by the whitelist.
    #[arg(long, env = "NOTIFY_WHITELIST", default_value_t = true, value_parser = BoolishValueParser::new(), action = clap::ArgAction::Set)]
    pub notify_whitelist: bool,

    /// Log format (json or text).
    #[arg(long, env = "MCNOTIFY_LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MCNOTIFY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    // -- Duration overrides (skip from CLI; set in Config::test()) --------
    #[clap(skip)]
    pub poll_tick_ms: Option<u64>,
    #[clap(skip)]
    pub identity_check_ms: Option<u64>,
    #[clap(skip)]
    pub retry_backoff_ms: Option<u64>,
    #[clap(skip)]
    pub sink_timeout_ms: Option<u64>,
}

fn env_duration_ms(var: &str, default: u64) -> Duration {
    let ms = std::env::var(var).ok().and_then(|v| v.parse().ok()).unwrap_or(default);
    Duration::from_millis(ms)
}

macro_rules! duration_field {
    ($method:ident, $field:ident, $env:literal, $default:expr) => {
        pub fn $method(&self) -> Duration {
            match self.$field {
                Some(ms) => Duration::from_millis(ms),
                None => env_duration_ms($env, $default),
            }
        }
    };
}

impl Config {
    /// Validate the configuration after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        let parent = log_dir(&self.log_file);
        if !parent.is_dir() {
            anyhow::bail!("log file directory does not exist: {}", parent.display());
        }

        if self.notify_subject.trim().is_empty() {
            anyhow::bail!("notify subject cannot be empty");
        }

        self.grammar_enum()?;

        match self.service_enum()? {
            NotifyService::Ntfy => {
                if self.ntfy_topic.as_deref().unwrap_or_default().is_empty() {
                    anyhow::bail!("--ntfy-topic (NTFY_TOPIC) is required for ntfy");
                }
                if !(self.ntfy_url.starts_with("http://") || self.ntfy_url.starts_with("https://"))
                {
                    anyhow::bail!("ntfy URL must start with http:// or https://");
                }
            }
            NotifyService::Discord => {
                let Some(url) = self.discord_webhook_url.as_deref().filter(|u| !u.is_empty())
                else {
                    anyhow::bail!(
                        "--discord-webhook-url (DISCORD_WEBHOOK_URL) is required for discord"
                    );
                };
                if !url.starts_with(DISCORD_WEBHOOK_PREFIX) {
                    anyhow::bail!(
                        "discord webhook URL appears invalid: expected {DISCORD_WEBHOOK_PREFIX}..."
                    );
                }
            }
        }

        Ok(())
    }

    // -- Tuning knobs (field override → env var → compiled default) --------

    duration_field!(poll_tick, poll_tick_ms, "MCNOTIFY_POLL_TICK_MS", 100);
    duration_field!(identity_check, identity_check_ms, "MCNOTIFY_IDENTITY_CHECK_MS", 1_000);
    duration_field!(retry_backoff, retry_backoff_ms, "MCNOTIFY_RETRY_BACKOFF_MS", 1_000);
    duration_field!(sink_timeout, sink_timeout_ms, "MCNOTIFY_SINK_TIMEOUT_MS", 10_000);

    /// Build a minimal `Config` for tests (ntfy on localhost, fast polling).
    #[doc(hidden)]
    pub fn test() -> Self {
        Self {
            log_file: std::env::temp_dir().join("latest.log"),
            rotation_prefix: None,
            grammar: "standard".into(),
            notify_service: "ntfy".into(),
            ntfy_url: "http://127.0.0.1:9".into(),
            ntfy_topic: Some("test".into()),
            ntfy_token: None,
            discord_webhook_url: None,
            notify_subject: "Minecraft Server".into(),
            notify_join: true,
            notify_leave: true,
            notify_whitelist: true,
            log_format: "text".into(),
            log_level: "debug".into(),
            poll_tick_ms: Some(10),
            identity_check_ms: Some(20),
            retry_backoff_ms: Some(20),
            sink_timeout_ms: Some(1_000),
        }
    }

    /// Parse the grammar string into an enum.
    pub fn grammar_enum(&self) -> anyhow::Result<Grammar> {
        self.grammar.parse()
    }

    /// Parse the notification service string into an enum.
    pub fn service_enum(&self) -> anyhow::Result<NotifyService> {
        self.notify_service.parse()
    }

    /// Effective prefix for the rotation fallback scan.
    pub fn rotation_prefix(&self) -> String {
        match self.rotation_prefix {
            Some(ref prefix) if !prefix.is_empty() => prefix.clone(),
            _ => self
                .log_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    pub fn event_filter(&self) -> EventFilter {
        EventFilter {
            join: self.notify_join,
            leave: self.notify_leave,
            whitelist: self.notify_whitelist,
        }
    }

    pub fn follow_settings(&self) -> FollowSettings {
        FollowSettings {
            rotation_prefix: self.rotation_prefix(),
            poll_tick: self.poll_tick(),
            identity_interval: self.identity_check(),
            retry_backoff: self.retry_backoff(),
        }
    }
}

/// Directory containing the log file; a bare filename lives in the cwd.
fn log_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
