// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level monitor runner, shared by `main` and integration tests.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dispatch::{Delivery, Dispatcher};
use crate::follow::RotatingReader;
use crate::matcher::Matcher;
use crate::sink::build_sink;

/// Install the global tracing subscriber. Repeated calls are no-ops.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// A monitor with its reader, matcher, and dispatcher wired up.
pub struct Monitor {
    reader: RotatingReader,
    matcher: Matcher,
    dispatcher: Dispatcher,
}

impl Monitor {
    pub fn new(reader: RotatingReader, matcher: Matcher, dispatcher: Dispatcher) -> Self {
        Self { reader, matcher, dispatcher }
    }

    /// Match one log line and dispatch the resulting event, if any.
    pub async fn handle_line(&self, line: &str) -> Option<Delivery> {
        process_line(&self.matcher, &self.dispatcher, line).await
    }

    /// Follow the log until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let Self { reader, matcher, dispatcher } = self;
        let lines = reader.lines();
        tokio::pin!(lines);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutting down");
                    break;
                }
                line = lines.next() => {
                    let Some(line) = line else { break };
                    process_line(&matcher, &dispatcher, &line).await;
                }
            }
        }
        Ok(())
    }
}

/// Match `line` and hand any event to the dispatcher. Returns `None` for
/// lines that match no rule.
pub async fn process_line(
    matcher: &Matcher,
    dispatcher: &Dispatcher,
    line: &str,
) -> Option<Delivery> {
    let event = matcher.match_line(line)?;
    debug!(kind = event.kind(), player = event.player(), "matched log line");
    Some(dispatcher.notify(&event).await)
}

/// Build the monitor from a validated config.
pub fn prepare(config: &Config) -> anyhow::Result<Monitor> {
    let grammar = config.grammar_enum()?;
    let matcher = Matcher::new(grammar)?;
    let sink = build_sink(config)?;
    let dispatcher =
        Dispatcher::new(sink, config.event_filter(), config.notify_subject.clone());
    let reader = RotatingReader::new(config.log_file.clone(), config.follow_settings());

    info!(
        log_file = %config.log_file.display(),
        %grammar,
        service = %config.notify_service,
        join = config.notify_join,
        leave = config.notify_leave,
        whitelist = config.notify_whitelist,
        "monitor configured"
    );
    Ok(Monitor::new(reader, matcher, dispatcher))
}

/// Prepare and run the monitor until `shutdown` fires.
pub async fn run(config: &Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    prepare(config)?.run(shutdown).await
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
