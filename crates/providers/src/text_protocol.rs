//! The text tool-call protocol.
//!
//! Backends without native tool calling are told (through a system
//! instruction) to answer with a JSON object of the form
//! `{"tool": <name>, "arguments": {...}}` somewhere in their text. This
//! module is the single place that writes and reads that convention: the
//! Gemini adapter and the offline simulator both go through it.
//!
//! Extraction takes the first match of a greedy brace-to-brace pattern that
//! contains the literal `"tool"`. Anything that does not parse is treated as
//! plain text.

use agentflow_core::{NormalizedResponse, ParseError, ToolCall, ToolDefinition};
use regex_lite::Regex;
use serde_json::Value;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

/// Greedy: from the first `{` that can start a match to the last `}`.
pub const TOOL_CALL_PATTERN: &str = r#"(?s)\{.*"tool".*\}"#;

static TOOL_CALL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(TOOL_CALL_PATTERN).ok());

/// Text split into what the user should see and the tool call it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub content: Option<String>,
    pub tool_call: Option<ToolCall>,
}

impl Extracted {
    pub fn into_response(self) -> NormalizedResponse {
        NormalizedResponse {
            content: self.content,
            tool_calls: self.tool_call.into_iter().collect(),
        }
    }
}

/// Build the instruction that teaches a model the protocol.
pub fn system_instruction(tools: &[ToolDefinition]) -> String {
    let mut out = String::from("You are an AI assistant with access to the following tools:\n");

    for (i, tool) in tools.iter().enumerate() {
        let params = parameter_names(&tool.parameters).join(", ");
        out.push_str(&format!("{}. {}({}) - {}\n", i + 1, tool.name, params, tool.description));
    }

    out.push_str("\nWhen you need to use a tool, respond with a JSON object like:\n");
    let example = tools
        .first()
        .map(|t| {
            let param = parameter_names(&t.parameters)
                .into_iter()
                .next()
                .unwrap_or_else(|| "input".into());
            format!(r#"{{"tool": "{}", "arguments": {{"{param}": "value"}}}}"#, t.name)
        })
        .unwrap_or_else(|| r#"{"tool": "tool_name", "arguments": {}}"#.into());
    out.push_str(&example);
    out.push('\n');

    for tool in tools {
        for (prop, values) in enum_properties(&tool.parameters) {
            out.push_str(&format!("\nAvailable {prop}s for {}: {}", tool.name, values.join(", ")));
        }
    }

    out
}

/// Append a tool call to some text in protocol form.
pub fn embed(content: &str, name: &str, arguments: &Value) -> String {
    let name = serde_json::to_string(name).unwrap_or_else(|_| format!("\"{name}\""));
    let call = format!(r#"{{"tool": {name}, "arguments": {arguments}}}"#);
    if content.trim().is_empty() {
        call
    } else {
        format!("{content}\n\n{call}")
    }
}

/// Split model text into display content and an optional tool call.
///
/// Never fails: a missing or malformed call leaves the text as it was.
pub fn extract(text: &str) -> Extracted {
    match parse(text) {
        Ok((span, call)) => {
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..span.start]);
            rest.push_str(&text[span.end..]);
            Extracted {
                content: agentflow_core::provider::non_empty(rest),
                tool_call: Some(call),
            }
        }
        Err(e) => {
            if e != ParseError::NoMatch {
                debug!(error = %e, "Ignoring unusable tool call in model text");
            }
            Extracted {
                content: agentflow_core::provider::non_empty(text.to_string()),
                tool_call: None,
            }
        }
    }
}

/// Locate and decode the protocol object.
pub fn parse(text: &str) -> Result<(Range<usize>, ToolCall), ParseError> {
    let re = TOOL_CALL_RE.as_ref().ok_or(ParseError::NoMatch)?;
    let m = re.find(text).ok_or(ParseError::NoMatch)?;

    let json: Value =
        serde_json::from_str(m.as_str()).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    let name = json
        .get("tool")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or(ParseError::MissingField("tool"))?;

    let arguments = json
        .get("arguments")
        .filter(|a| a.is_object())
        .ok_or(ParseError::MissingField("arguments"))?;

    Ok((m.range(), ToolCall::new(name, arguments.to_string())))
}

/// Parameter names, required ones first in declared order.
fn parameter_names(schema: &Value) -> Vec<String> {
    let mut names: Vec<String> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for key in props.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    names
}

fn enum_properties(schema: &Value) -> Vec<(String, Vec<String>)> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .filter_map(|(name, prop)| {
                    let values: Vec<String> = prop
                        .get("enum")?
                        .as_array()?
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect();
                    (!values.is_empty()).then(|| (name.clone(), values))
                })
                .collect()
        })
        .unwrap_or_default()
}
