//! Multi-turn offline sessions: a config file on disk, the simulator as
//! provider and the real tool registry.

use std::sync::Arc;

use agentflow_agent::{Agent, TurnOutcome, WELCOME_BACK};
use agentflow_config::AppConfig;
use agentflow_core::{DisplayEvent, EventBus, Role};
use serde_json::Value;

const OFFLINE_TOML: &str = r#"
provider = "anthropic"

[search]
offline = true

[pipe]
latency_ms = 0
"#;

fn offline_config() -> AppConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, OFFLINE_TOML).unwrap();
    AppConfig::load_from(&path).unwrap()
}

fn answer(outcome: TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Answered(Some(text)) => text,
        other => panic!("expected an answer, got {other:?}"),
    }
}

#[tokio::test]
async fn blog_interview_session() {
    let config = offline_config();
    assert!(!config.has_api_key());
    assert!(!config.sandbox.enabled);

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let agent = Agent::from_config(&config, Arc::new(bus.clone()));
    assert_eq!(agent.provider_name(), "simulator");

    let reply = answer(agent.submit("Interview me for a blog post").await.unwrap());
    assert!(reply.contains("topic"));

    // Topic: the simulator searches, then digests the results
    agent.submit("IBM").await.unwrap();
    let transcript = agent.transcript().await;
    let search = transcript
        .iter()
        .rev()
        .find(|m| !m.tool_calls.is_empty())
        .unwrap();
    assert_eq!(search.tool_calls[0].name, "google_search");

    // Outline through the pipe
    agent.submit("Help me structure it").await.unwrap();
    let transcript = agent.transcript().await;
    let pipe_result = transcript.iter().rev().find(|m| m.role == Role::Tool).unwrap();
    let value: Value = serde_json::from_str(pipe_result.text()).unwrap();
    assert_eq!(value["workflow"], "summarize");
    assert!(value["output"].as_str().unwrap().contains("IBM"));

    // Code sample with the sandbox off: a failed tool result, not a failed turn
    agent.submit("Show me a code example").await.unwrap();
    let transcript = agent.transcript().await;
    let js_result = transcript.iter().rev().find(|m| m.role == Role::Tool).unwrap();
    assert!(js_result.text().starts_with("❌ execute_javascript failed"));
    assert_eq!(transcript.last().unwrap().role, Role::Assistant);

    let mut failed = 0;
    while let Ok(event) = rx.try_recv() {
        if let DisplayEvent::ToolFailed { tool_name, .. } = event.as_ref() {
            assert_eq!(tool_name, "execute_javascript");
            failed += 1;
        }
    }
    assert_eq!(failed, 1);
}

#[tokio::test]
async fn clear_starts_a_fresh_conversation() {
    let agent = Agent::from_config(&offline_config(), Arc::new(EventBus::default()));
    let before = agent.conversation_id().await;

    agent.submit("find rust async runtimes").await.unwrap();
    assert!(agent.transcript().await.len() > 2);

    agent.clear().unwrap();
    let transcript = agent.transcript().await;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].text(), WELCOME_BACK);
    assert_ne!(agent.conversation_id().await, before);
}

#[tokio::test]
async fn tool_catalog_is_stable() {
    let config = offline_config();
    let agent = Agent::from_config(&config, Arc::new(EventBus::default()));
    let names: Vec<String> = agent.tool_definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["google_search", "ai_pipe", "execute_javascript"]);
}
