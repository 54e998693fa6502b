//! Shared helpers for in-crate tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use agentflow_core::display::DisplaySink;
use agentflow_core::error::{ProviderError, ToolError};
use agentflow_core::message::{Role, ToolCall};
use agentflow_core::provider::{NormalizedResponse, Provider, ProviderRequest};
use agentflow_core::tool::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};

/// A provider that replays scripted responses and records every request.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<NormalizedResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<NormalizedResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<NormalizedResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more responses")
    }
}

pub fn text(content: &str) -> Result<NormalizedResponse, ProviderError> {
    Ok(NormalizedResponse::text(content))
}

pub fn calls(content: &str, calls: Vec<ToolCall>) -> Result<NormalizedResponse, ProviderError> {
    Ok(NormalizedResponse::with_tool_calls(content, calls))
}

pub fn call(name: &str, args: Value) -> ToolCall {
    ToolCall::new(name, args.to_string())
}

/// Records display callbacks as short strings.
#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<String>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplaySink for RecordingDisplay {
    fn on_message(&self, role: Role, text: &str) {
        self.push(format!("{role}:{text}"));
    }
    fn on_tool_started(&self, name: &str) {
        self.push(format!("started:{name}"));
    }
    fn on_tool_finished(&self, name: &str, _formatted: &str) {
        self.push(format!("finished:{name}"));
    }
    fn on_tool_failed(&self, name: &str, _error: &str) {
        self.push(format!("failed:{name}"));
    }
    fn on_error(&self, message: &str) {
        self.push(format!("error:{message}"));
    }
}

/// Returns `{"echo": <text>}`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
    }
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
        Ok(json!({ "echo": text }))
    }
}

/// Sleeps, then reports its own name.
pub struct SleepyTool {
    name: &'static str,
    delay: Duration,
}

impl SleepyTool {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self { name, delay }
    }
}

#[async_trait]
impl Tool for SleepyTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Sleeps"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        Ok(json!({ "tool": self.name }))
    }
}
