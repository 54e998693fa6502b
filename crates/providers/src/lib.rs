//! LLM provider adapters for AgentFlow.
//!
//! All providers implement the `agentflow_core::Provider` trait and return a
//! `NormalizedResponse`. The router picks one from configuration.

pub mod anthropic;
pub mod google;
mod http;
pub mod openai;
pub mod router;
pub mod simulator;
pub mod text_protocol;

pub use anthropic::AnthropicProvider;
pub use google::GeminiProvider;
pub use http::error_message;
pub use openai::OpenAiProvider;
pub use router::build_provider;
pub use simulator::SimulatorProvider;
