//! Tool dispatcher: turns one `ToolCall` into one `ToolResult`.
//!
//! Never fails outward. Unknown tools, bad arguments, handler errors and
//! timeouts all become error content for the model to read, and are
//! reported to the display.

use std::sync::Arc;
use std::time::Duration;

use agentflow_core::display::DisplaySink;
use agentflow_core::error::{ToolDispatchError, ToolError};
use agentflow_core::message::ToolCall;
use agentflow_core::tool::{ToolRegistry, ToolResult};
use agentflow_tools::format_for_display;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
enum InvokeError {
    #[error(transparent)]
    Dispatch(#[from] ToolDispatchError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    display: Arc<dyn DisplaySink>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(tools: Arc<ToolRegistry>, display: Arc<dyn DisplaySink>, timeout: Duration) -> Self {
        Self {
            tools,
            display,
            timeout,
        }
    }

    /// Run a single tool call.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        self.display.on_tool_started(&call.name);
        let started = std::time::Instant::now();

        match self.try_invoke(call).await {
            Ok(value) => {
                debug!(
                    tool = %call.name,
                    call_id = %call.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Tool finished"
                );
                self.display
                    .on_tool_finished(&call.name, &format_for_display(&value));
                ToolResult::success(&call.id, value.to_string())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(tool = %call.name, call_id = %call.id, error = %message, "Tool failed");
                self.display.on_tool_failed(&call.name, &message);
                ToolResult::error(&call.id, format!("❌ {} failed: {message}", call.name))
            }
        }
    }

    async fn try_invoke(&self, call: &ToolCall) -> Result<Value, InvokeError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolDispatchError::UnknownTool(call.name.clone()))?;
        let arguments = parse_arguments(call)?;

        match tokio::time::timeout(self.timeout, tool.execute(arguments)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: self.timeout.as_secs(),
            }
            .into()),
        }
    }
}

/// Arguments must be a JSON object. A blank string counts as `{}`.
fn parse_arguments(call: &ToolCall) -> Result<Value, ToolDispatchError> {
    let raw = call.arguments.trim();
    if raw.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let invalid = |reason: String| ToolDispatchError::InvalidArguments {
        tool_name: call.name.clone(),
        reason,
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(invalid(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EchoTool, RecordingDisplay, SleepyTool};
    use serde_json::json;

    fn dispatcher(display: Arc<RecordingDisplay>, timeout: Duration) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry.register(Box::new(SleepyTool::new("sleepy", Duration::from_secs(60))));
        Dispatcher::new(Arc::new(registry), display, timeout)
    }

    #[tokio::test]
    async fn success_serializes_result() {
        let display = Arc::new(RecordingDisplay::default());
        let d = dispatcher(display.clone(), Duration::from_secs(5));
        let call = ToolCall::new("echo", r#"{"text":"hi"}"#);

        let result = d.invoke(&call).await;
        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, call.id);
        let value: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(value, json!({"echo": "hi"}));
        assert_eq!(display.events(), ["started:echo", "finished:echo"]);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_content() {
        let display = Arc::new(RecordingDisplay::default());
        let d = dispatcher(display.clone(), Duration::from_secs(5));

        let result = d.invoke(&ToolCall::new("fly_to_moon", "{}")).await;
        assert!(result.is_error);
        assert_eq!(result.content, "❌ fly_to_moon failed: Unknown tool: fly_to_moon");
        assert_eq!(display.events(), ["started:fly_to_moon", "failed:fly_to_moon"]);
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let d = dispatcher(Arc::new(RecordingDisplay::default()), Duration::from_secs(5));

        let result = d.invoke(&ToolCall::new("echo", "[1, 2]")).await;
        assert!(result.is_error);
        assert!(result.content.contains("Invalid arguments for echo"));

        let result = d.invoke(&ToolCall::new("echo", "{not json")).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn blank_arguments_mean_empty_object() {
        let d = dispatcher(Arc::new(RecordingDisplay::default()), Duration::from_secs(5));
        let result = d.invoke(&ToolCall::new("echo", "  ")).await;
        // EchoTool requires `text`, so this reaches the handler and fails there
        assert!(result.content.contains("Invalid tool arguments"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tools_time_out() {
        let display = Arc::new(RecordingDisplay::default());
        let d = dispatcher(display.clone(), Duration::from_secs(2));

        let result = d.invoke(&ToolCall::new("sleepy", "{}")).await;
        assert!(result.is_error);
        assert_eq!(result.content, "❌ sleepy failed: Tool timed out: sleepy after 2s");
    }
}
