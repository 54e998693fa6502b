//! End-to-end tests of the agent loop against scripted providers, real
//! built-in tools and the offline simulator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentflow_agent::{Agent, AgentSettings, TurnError, TurnOutcome};
use agentflow_config::AppConfig;
use agentflow_core::{
    DisplayEvent, EventBus, NormalizedResponse, NullDisplay, Provider, ProviderError,
    ProviderRequest, Role, Tool, ToolCall, ToolError, ToolRegistry,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<NormalizedResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<NormalizedResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
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
            .expect("no more scripted responses")
    }
}

/// Sleeps for its delay, then records that it finished.
struct TimedTool {
    name: &'static str,
    delay: Duration,
    finished: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Tool for TimedTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Sleeps, then reports its name"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }
    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(self.delay).await;
        self.finished.lock().unwrap().push(self.name);
        Ok(json!({ "done": self.name }))
    }
}

fn offline_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.search.offline = true;
    config.pipe.latency_ms = 0;
    config
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Arc<DisplayEvent>>) -> Vec<Arc<DisplayEvent>> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn offline_ibm_quantum_scenario() {
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let agent = Agent::from_config(&offline_config(), Arc::new(bus.clone()));
    assert_eq!(agent.provider_name(), "simulator");

    let outcome = agent.submit("search for IBM quantum computing").await.unwrap();
    let answer = match outcome {
        TurnOutcome::Answered(Some(answer)) => answer,
        other => panic!("expected a final answer, got {other:?}"),
    };

    let transcript = agent.transcript().await;
    let roles: Vec<Role> = transcript.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [Role::Assistant, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );

    let call = &transcript[2].tool_calls[0];
    assert_eq!(call.name, "google_search");
    let args: Value = serde_json::from_str(&call.arguments).unwrap();
    assert!(args["query"].as_str().unwrap().contains("quantum computing"));
    // The tool-call JSON is stripped from the displayed text
    assert!(!transcript[2].text().contains("\"tool\""));

    let result: Value = serde_json::from_str(transcript[3].text()).unwrap();
    assert!(!result["results"].as_array().unwrap().is_empty());
    assert_eq!(transcript[3].tool_call_id.as_deref(), Some(call.id.as_str()));

    assert!(transcript[4].tool_calls.is_empty());
    assert_eq!(transcript[4].text(), answer);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e.as_ref(),
        DisplayEvent::ToolStarted { tool_name, .. } if tool_name == "google_search"
    )));
    assert!(events.iter().any(|e| matches!(
        e.as_ref(),
        DisplayEvent::ToolFinished { formatted, .. } if formatted.contains("(via Knowledge Base)")
    )));
}

#[tokio::test(start_paused = true)]
async fn results_are_written_back_in_call_order() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ToolRegistry::new();
    for (name, ms) in [("a", 200), ("b", 300), ("c", 100)] {
        registry.register(Box::new(TimedTool {
            name,
            delay: Duration::from_millis(ms),
            finished: finished.clone(),
        }));
    }

    let calls = vec![
        ToolCall::new("a", "{}"),
        ToolCall::new("b", "{}"),
        ToolCall::new("c", "{}"),
    ];
    let ids: Vec<String> = calls.iter().map(|c| c.id.clone()).collect();
    let provider = ScriptedProvider::new(vec![
        Ok(NormalizedResponse::with_tool_calls("", calls)),
        Ok(NormalizedResponse::text("all done")),
    ]);
    let agent = Agent::new(
        provider,
        Arc::new(registry),
        Arc::new(NullDisplay),
        AgentSettings::default(),
    );

    let started = tokio::time::Instant::now();
    agent.submit("run them").await.unwrap();

    // Concurrent: total time is the slowest tool, not the sum
    assert!(started.elapsed() < Duration::from_millis(600));
    assert_eq!(*finished.lock().unwrap(), ["c", "a", "b"]);

    let transcript = agent.transcript().await;
    let written: Vec<&str> = transcript
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(written, ids);
    assert_eq!(transcript[3].text(), r#"{"done":"a"}"#);
}

#[tokio::test]
async fn unknown_tool_is_reported_and_loop_continues() {
    let provider = ScriptedProvider::new(vec![
        Ok(NormalizedResponse::with_tool_calls(
            "Trying something",
            vec![ToolCall::new("fly_to_moon", r#"{"speed":"fast"}"#)],
        )),
        Ok(NormalizedResponse::text("I can't do that.")),
    ]);
    let agent = Agent::new(
        provider,
        Arc::new(ToolRegistry::new()),
        Arc::new(NullDisplay),
        AgentSettings::default(),
    );

    let outcome = agent.submit("go to the moon").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Answered(Some("I can't do that.".into())));

    let transcript = agent.transcript().await;
    assert_eq!(
        transcript[3].text(),
        "❌ fly_to_moon failed: Unknown tool: fly_to_moon"
    );
}

#[tokio::test]
async fn transcript_is_replayed_append_only() {
    let provider = ScriptedProvider::new(vec![
        Ok(NormalizedResponse::text("first answer")),
        Ok(NormalizedResponse::text("second answer")),
    ]);
    let agent = Agent::new(
        provider.clone(),
        Arc::new(ToolRegistry::new()),
        Arc::new(NullDisplay),
        AgentSettings::default(),
    );

    agent.submit("one").await.unwrap();
    let after_first: Vec<String> = agent.transcript().await.iter().map(|m| m.id.clone()).collect();
    agent.submit("two").await.unwrap();

    let requests = provider.requests.lock().unwrap().clone();
    let second: Vec<String> = requests[1].messages.iter().map(|m| m.id.clone()).collect();
    assert_eq!(second[..after_first.len()], after_first[..]);
    assert_eq!(requests[1].messages.last().unwrap().text(), "two");
}

#[tokio::test]
async fn provider_failure_keeps_pairing_intact() {
    let provider = ScriptedProvider::new(vec![
        Ok(NormalizedResponse::with_tool_calls(
            "",
            vec![ToolCall::new("google_search", r#"{"query":"rust"}"#)],
        )),
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        }),
    ]);
    let config = offline_config();
    let agent = Agent::new(
        provider,
        Arc::new(agentflow_tools::default_registry(&config)),
        Arc::new(NullDisplay),
        AgentSettings::default(),
    );

    let err = agent.submit("search for rust").await.unwrap_err();
    assert!(matches!(err, TurnError::Provider(ProviderError::ApiError { status_code: 500, .. })));

    let transcript = agent.transcript().await;
    assert_eq!(transcript.last().unwrap().role, Role::Tool);
    assert!(!agent.is_processing());

    let mut conversation = agentflow_core::Conversation::new();
    for message in transcript {
        conversation.push(message);
    }
    assert!(conversation.tool_pairing_is_valid());
}

struct GatedProvider {
    gate: Arc<Notify>,
}

#[async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<NormalizedResponse, ProviderError> {
        self.gate.notified().await;
        Ok(NormalizedResponse::text("finally"))
    }
}

#[tokio::test]
async fn second_submit_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let agent = Arc::new(Agent::new(
        Arc::new(GatedProvider { gate: gate.clone() }),
        Arc::new(ToolRegistry::new()),
        Arc::new(NullDisplay),
        AgentSettings::default(),
    ));

    let running = {
        let agent = agent.clone();
        tokio::spawn(async move { agent.submit("first").await })
    };
    while !agent.is_processing() {
        tokio::task::yield_now().await;
    }

    assert!(matches!(agent.submit("second").await, Err(TurnError::Busy)));
    assert!(matches!(agent.clear(), Err(TurnError::Busy)));

    gate.notify_one();
    let outcome = running.await.unwrap().unwrap();
    assert_eq!(outcome, TurnOutcome::Answered(Some("finally".into())));

    let transcript = agent.transcript().await;
    assert_eq!(transcript.iter().filter(|m| m.role == Role::User).count(), 1);
}
