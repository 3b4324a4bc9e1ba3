// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tracing::{debug, error, info};

use crate::event::PlayerEvent;
use crate::sink::NotificationSink;

/// Per-category enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub join: bool,
    pub leave: bool,
    pub whitelist: bool,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self { join: true, leave: true, whitelist: true }
    }
}

impl EventFilter {
    pub fn allows(&self, event: &PlayerEvent) -> bool {
        match event {
            PlayerEvent::Join { .. } => self.join,
            PlayerEvent::Leave { .. } => self.leave,
            PlayerEvent::WhitelistReject { .. } => self.whitelist,
        }
    }
}

/// What happened to one event handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The event's category is disabled.
    Suppressed,
    /// The sink reported an error; it was logged and dropped.
    Failed,
}

/// Formats events and hands them to the sink, best effort.
pub struct Dispatcher {
    sink: Box<dyn NotificationSink>,
    filter: EventFilter,
    title: String,
}

impl Dispatcher {
    pub fn new(sink: Box<dyn NotificationSink>, filter: EventFilter, title: String) -> Self {
        Self { sink, filter, title }
    }

    /// Deliver `event` once. Sink failures are logged, never retried.
    pub async fn notify(&self, event: &PlayerEvent) -> Delivery {
        if !self.filter.allows(event) {
            debug!(kind = event.kind(), player = event.player(), "category disabled, skipping");
            return Delivery::Suppressed;
        }

        let message = event.message();
        match self.sink.send(&message, &self.title).await {
            Ok(()) => {
                info!(sink = self.sink.name(), kind = event.kind(), "notification sent: {message}");
                Delivery::Sent
            }
            Err(e) => {
                error!(
                    sink = self.sink.name(),
                    code = e.as_str(),
                    kind = event.kind(),
                    "failed to send notification: {e}"
                );
                Delivery::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
