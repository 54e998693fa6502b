//! Display sink: the narrow surface through which the agent talks to a UI.
//!
//! The agent never renders anything itself. Whatever front end is attached
//! (terminal, event bus, test recorder) receives these callbacks.

use crate::message::Role;

/// Receives user-visible events produced while a turn runs.
///
/// Callbacks are synchronous and must not block; sinks that need async work
/// should forward into a channel (see [`crate::event::EventBus`]).
pub trait DisplaySink: Send + Sync {
    /// A message to show in the conversation view.
    fn on_message(&self, role: Role, text: &str);

    /// A tool invocation has started.
    fn on_tool_started(&self, name: &str);

    /// A tool finished successfully. `formatted` is display-ready text.
    fn on_tool_finished(&self, name: &str, formatted: &str);

    /// A tool failed. The failure is also written into the conversation.
    fn on_tool_failed(&self, name: &str, error: &str);

    /// A turn-level error (provider failure, round limit).
    fn on_error(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn on_message(&self, _role: Role, _text: &str) {}
    fn on_tool_started(&self, _name: &str) {}
    fn on_tool_finished(&self, _name: &str, _formatted: &str) {}
    fn on_tool_failed(&self, _name: &str, _error: &str) {}
    fn on_error(&self, _message: &str) {}
}
