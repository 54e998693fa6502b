//! The AgentFlow agent loop.
//!
//! The agent follows a **call → act → observe** cycle:
//!
//! 1. **Receive** user input and append it to the transcript
//! 2. **Call** the configured provider with the transcript and tool catalog
//! 3. **If tool calls**: run them concurrently, append results in call order,
//!    loop back to step 2
//! 4. **If text only**: append it and end the turn
//!
//! The loop also stops when the round cap is reached or the provider fails.

pub mod agent;
pub mod dispatcher;

#[cfg(test)]
mod test_helpers;

pub use agent::{Agent, AgentSettings, TurnError, TurnOutcome, WELCOME, WELCOME_BACK};
pub use dispatcher::Dispatcher;
