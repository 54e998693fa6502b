//! # AgentFlow Core
//!
//! Domain types, traits, and error definitions for the AgentFlow agent loop.
//! This crate has **no I/O**; it defines the domain model that all other
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Selecting a provider through configuration
//! - Testing with scripted providers and recording display sinks
//! - A dependency graph where all crates depend inward on core

pub mod display;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use display::{DisplaySink, NullDisplay};
pub use error::{Error, ParseError, ProviderError, Result, ToolDispatchError, ToolError};
pub use event::{DisplayEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, Role, ToolCall};
pub use provider::{
    Credentials, NormalizedResponse, Provider, ProviderKind, ProviderRequest, ToolDefinition,
};
pub use tool::{Tool, ToolRegistry, ToolResult};
