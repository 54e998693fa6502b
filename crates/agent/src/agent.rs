//! The agent loop.
//!
//! One turn: append the user entry, then repeatedly ask the provider for a
//! response. Tool calls are dispatched concurrently and their results are
//! appended in the order the model requested them, then the provider is
//! asked again. A response without tool calls ends the turn.
//!
//! The transcript lives behind a `tokio::sync::Mutex`; holding the lock is
//! what "processing" means, so a second `submit` while a turn runs is
//! rejected with [`TurnError::Busy`] instead of queueing.

use std::sync::Arc;
use std::time::Duration;

use agentflow_config::AppConfig;
use agentflow_core::display::DisplaySink;
use agentflow_core::error::ProviderError;
use agentflow_core::message::{Conversation, ConversationId, Message, Role, ToolCall};
use agentflow_core::provider::{NormalizedResponse, Provider, ProviderRequest, ToolDefinition};
use agentflow_core::tool::{ToolRegistry, ToolResult};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

/// Seed entry of a new session.
pub const WELCOME: &str = "Welcome to AgentFlow! 🧠 I'm your intelligent AI assistant with powerful multi-tool capabilities. I can help you with real-time web searches, AI-powered workflows, and code execution. Configure your API keys to unlock my full potential, or explore my capabilities right away. What would you like to accomplish today?";

/// Seed entry after [`Agent::clear`].
pub const WELCOME_BACK: &str = "Welcome back to AgentFlow! 🧠 I'm ready to assist you with intelligent searches, AI workflows, and code execution. What can I help you accomplish?";

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without requesting tools.
    Answered(Option<String>),
    /// The model was still requesting tools when the round cap was hit.
    RoundLimitReached,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("a turn is already in progress")]
    Busy,

    #[error("input is empty")]
    EmptyInput,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Per-agent knobs.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Provider calls allowed per turn
    pub max_tool_rounds: usize,
    pub provider_timeout: Duration,
    pub tool_timeout: Duration,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.effective_model(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            max_tool_rounds: config.agent.max_tool_rounds,
            provider_timeout: Duration::from_secs(config.agent.provider_timeout_secs),
            tool_timeout: Duration::from_secs(config.agent.tool_timeout_secs),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    dispatcher: Dispatcher,
    display: Arc<dyn DisplaySink>,
    settings: AgentSettings,
    conversation: Mutex<Conversation>,
}

impl Agent {
    /// Create an agent whose transcript holds the welcome greeting.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        display: Arc<dyn DisplaySink>,
        settings: AgentSettings,
    ) -> Self {
        let dispatcher = Dispatcher::new(tools.clone(), display.clone(), settings.tool_timeout);
        display.on_message(Role::Assistant, WELCOME);
        Self {
            provider,
            tools,
            dispatcher,
            display,
            settings,
            conversation: Mutex::new(Conversation::seeded(Message::assistant(WELCOME))),
        }
    }

    /// Wire an agent from configuration: provider by credentials, built-in tools.
    pub fn from_config(config: &AppConfig, display: Arc<dyn DisplaySink>) -> Self {
        let provider = agentflow_providers::build_provider(config);
        let tools = Arc::new(agentflow_tools::default_registry(config));
        Self::new(provider, tools, display, AgentSettings::from_config(config))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Whether a turn is running.
    pub fn is_processing(&self) -> bool {
        self.conversation.try_lock().is_err()
    }

    /// A copy of the transcript. Waits for a running turn to finish.
    pub async fn transcript(&self) -> Vec<Message> {
        self.conversation.lock().await.messages().to_vec()
    }

    pub async fn conversation_id(&self) -> ConversationId {
        self.conversation.lock().await.id.clone()
    }

    /// Start over from the "welcome back" greeting.
    pub fn clear(&self) -> Result<(), TurnError> {
        let mut conversation = self.conversation.try_lock().map_err(|_| TurnError::Busy)?;
        conversation.reset(Message::assistant(WELCOME_BACK));
        info!(conversation_id = %conversation.id, "Conversation cleared");
        self.display.on_message(Role::Assistant, WELCOME_BACK);
        Ok(())
    }

    /// Run one turn for `input`.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, TurnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TurnError::EmptyInput);
        }
        let mut conversation = self.conversation.try_lock().map_err(|_| TurnError::Busy)?;

        conversation.push(Message::user(input));
        self.display.on_message(Role::User, input);
        info!(
            conversation_id = %conversation.id,
            provider = self.provider.name(),
            messages = conversation.len(),
            "Turn started"
        );

        let outcome = self.run_turn(&mut conversation).await;
        match &outcome {
            Ok(outcome) => info!(conversation_id = %conversation.id, ?outcome, "Turn finished"),
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Turn aborted");
                self.display.on_error(&format!("Error in agent loop: {e}"));
            }
        }
        outcome
    }

    async fn run_turn(&self, conversation: &mut Conversation) -> Result<TurnOutcome, TurnError> {
        let definitions = self.tools.definitions();

        for round in 1..=self.settings.max_tool_rounds {
            debug!(conversation_id = %conversation.id, round, "Agent loop iteration");

            let response = self.call_provider(conversation, &definitions).await?;
            if let Some(text) = &response.content {
                self.display.on_message(Role::Assistant, text);
            }

            if !response.has_tool_calls() {
                let answer = response.content.clone();
                conversation.push(Message::assistant_with_tools(response.content, Vec::new()));
                return Ok(TurnOutcome::Answered(answer));
            }

            debug!(tool_count = response.tool_calls.len(), "Executing tool calls");
            let calls = response.tool_calls.clone();
            conversation.push(Message::assistant_with_tools(response.content, response.tool_calls));

            for result in self.dispatch_all(&calls).await {
                conversation.push(Message::tool_result(result.tool_call_id, result.content));
            }
        }

        warn!(
            conversation_id = %conversation.id,
            max_tool_rounds = self.settings.max_tool_rounds,
            "Round limit reached"
        );
        self.display.on_error(&format!(
            "Stopped after {} tool rounds without a final answer.",
            self.settings.max_tool_rounds
        ));
        Ok(TurnOutcome::RoundLimitReached)
    }

    async fn call_provider(
        &self,
        conversation: &Conversation,
        definitions: &[ToolDefinition],
    ) -> Result<NormalizedResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages: conversation.messages().to_vec(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            tools: definitions.to_vec(),
        };

        match tokio::time::timeout(self.settings.provider_timeout, self.provider.complete(request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(format!(
                "{} did not respond within {}s",
                self.provider.name(),
                self.settings.provider_timeout.as_secs()
            ))),
        }
    }

    /// Run all calls concurrently; results come back in call order.
    async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut pending: FuturesUnordered<_> = calls
            .iter()
            .enumerate()
            .map(|(slot, call)| async move { (slot, self.dispatcher.invoke(call).await) })
            .collect();

        let mut slots: Vec<Option<ToolResult>> = vec![None; calls.len()];
        while let Some((slot, result)) = pending.next().await {
            slots[slot] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }
}
