//! Display events over a broadcast channel.
//!
//! [`EventBus`] is a [`DisplaySink`] that turns every callback into a
//! [`DisplayEvent`] so any number of subscribers can render or record it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::display::DisplaySink;
use crate::message::Role;

/// Everything a front end may need to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    Message {
        role: Role,
        text: String,
        timestamp: DateTime<Utc>,
    },

    ToolStarted {
        tool_name: String,
        timestamp: DateTime<Utc>,
    },

    ToolFinished {
        tool_name: String,
        formatted: String,
        timestamp: DateTime<Utc>,
    },

    ToolFailed {
        tool_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for display events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<DisplayEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DisplayEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DisplayEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl DisplaySink for EventBus {
    fn on_message(&self, role: Role, text: &str) {
        self.publish(DisplayEvent::Message {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn on_tool_started(&self, name: &str) {
        self.publish(DisplayEvent::ToolStarted {
            tool_name: name.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn on_tool_finished(&self, name: &str, formatted: &str) {
        self.publish(DisplayEvent::ToolFinished {
            tool_name: name.to_string(),
            formatted: formatted.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn on_tool_failed(&self, name: &str, error: &str) {
        self.publish(DisplayEvent::ToolFailed {
            tool_name: name.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn on_error(&self, message: &str) {
        self.publish(DisplayEvent::Error {
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }
}
