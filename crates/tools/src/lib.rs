//! Built-in tools for AgentFlow.
//!
//! Three capabilities, registered in this order:
//! - `google_search`: web search through a fallback chain that never fails
//! - `ai_pipe`: text workflows (summaries, sentiment, keywords, outlines)
//! - `execute_javascript`: JavaScript in a sandboxed interpreter process

pub mod ai_pipe;
pub mod javascript;
pub mod search;

use std::time::Duration;

use agentflow_config::AppConfig;
use agentflow_core::tool::ToolRegistry;

pub use ai_pipe::AiPipeTool;
pub use javascript::JavaScriptTool;
pub use search::{GoogleSearchTool, SearchBackend, SearchOutput, SearchResult, format_for_display};

/// Create the tool catalog from configuration.
///
/// Code execution stays disabled unless `[sandbox] enabled = true`; the tool
/// is still listed so the model learns it exists.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GoogleSearchTool::from_config(&config.search)));
    registry.register(Box::new(AiPipeTool::new(Duration::from_millis(
        config.pipe.latency_ms,
    ))));
    registry.register(Box::new(JavaScriptTool::new(config.sandbox.clone())));
    registry
}
