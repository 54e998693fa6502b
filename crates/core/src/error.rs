//! Error types for the AgentFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each failure class has its own enum so callers can decide whether it
//! ends a turn (provider failures) or becomes conversation content
//! (dispatch and tool failures).

use thiserror::Error;

/// The top-level error type for all AgentFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Dispatch errors ---
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] ToolDispatchError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Tool-call text protocol ---
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Failure classes ---

/// Transport, authentication or backend-side failure. Ends the current turn.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Response blocked by provider: {0}")]
    Blocked(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// HTTP-like status for the error, `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::ApiError { status_code, .. } => *status_code,
            Self::RateLimited { .. } => 429,
            Self::AuthenticationFailed(_) => 401,
            _ => 0,
        }
    }
}

/// The dispatcher could not route a tool call to a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolDispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

/// A tool handler failed while executing.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// A model-emitted tool call in free text could not be read.
///
/// Never surfaced to the user: the text protocol treats it as "no tool call".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no tool call pattern in text")]
    NoMatch,

    #[error("malformed tool call JSON: {0}")]
    MalformedJson(String),

    #[error("tool call JSON is missing '{0}'")]
    MissingField(&'static str),
}
