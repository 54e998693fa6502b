//! Google Gemini adapter.
//!
//! Gemini is driven without native function calling. The tool catalog is
//! described in a leading user turn produced by [`text_protocol`], and tool
//! calls are read back out of the reply text by the same module.

use agentflow_core::error::ProviderError;
use agentflow_core::message::{Message, Role};
use agentflow_core::provider::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::http;
use crate::text_protocol;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GENERATION_TEMPERATURE: f64 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Finish reasons that mean the answer was withheld.
const BLOCKED_REASONS: &[&str] = &["SAFETY", "RECITATION"];

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(Duration::from_secs(120)),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client(timeout);
        self
    }

    /// `models/<id>`, without doubling an existing prefix.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn to_contents(messages: &[Message], tools: &[ToolDefinition]) -> Vec<Content> {
        let mut contents = vec![Content::user(text_protocol::system_instruction(tools))];

        for msg in messages {
            let text = match msg.role {
                Role::Tool => format!(
                    "Tool result ({}): {}",
                    msg.tool_call_id.as_deref().unwrap_or("unknown"),
                    msg.text()
                ),
                // Replay earlier calls in the same form the model is asked to use
                Role::Assistant if !msg.tool_calls.is_empty() => {
                    msg.tool_calls.iter().fold(msg.text().to_string(), |acc, tc| {
                        let args = serde_json::from_str(&tc.arguments)
                            .unwrap_or_else(|_| serde_json::json!({}));
                        text_protocol::embed(&acc, &tc.name, &args)
                    })
                }
                _ => msg.text().to_string(),
            };

            if text.trim().is_empty() {
                continue;
            }

            contents.push(Content {
                role: match msg.role {
                    Role::Assistant => "model".into(),
                    Role::User | Role::Tool => "user".into(),
                },
                parts: vec![Part { text: Some(text) }],
            });
        }

        contents
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        serde_json::json!({
            "contents": Self::to_contents(&request.messages, &request.tools),
            "generationConfig": {
                "temperature": GENERATION_TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
        })
    }

    fn normalize(resp: GenerateResponse) -> Result<NormalizedResponse, ProviderError> {
        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("No response candidates from Google Gemini API".into())
        })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKED_REASONS.contains(&reason) {
                warn!(reason, "Gemini withheld the response");
                return Err(ProviderError::Blocked(format!(
                    "Google Gemini blocked the response due to safety filters ({reason})"
                )));
            }
        }

        let parts = candidate
            .content
            .and_then(|c| c.parts)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(
                    "Invalid response structure from Google Gemini API".into(),
                )
            })?;

        let text = parts
            .into_iter()
            .find_map(|p| p.text.filter(|t| !t.is_empty()))
            .unwrap_or_default();

        Ok(text_protocol::extract(&text).into_response())
    }
}

#[async_trait]
impl agentflow_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<NormalizedResponse, ProviderError> {
        let url = format!(
            "{}/v1/{}:generateContent",
            self.base_url,
            Self::model_path(&request.model)
        );
        let body = Self::build_body(&request);

        debug!(provider = "google", model = %request.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(http::network_error)?;

        let response = http::ensure_success("google", response).await?;

        let api_resp: GenerateResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Gemini response: {e}"))
        })?;

        Self::normalize(api_resp)
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<Part>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::{Provider, ToolCall};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str, messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: None,
            tools: vec![ToolDefinition {
                name: "google_search".into(),
                description: "Search Google for information".into(),
                parameters: json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
            }],
        }
    }

    async fn setup(body: serde_json::Value) -> (MockServer, GeminiProvider) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let provider = GeminiProvider::new("g-key").with_base_url(server.uri());
        (server, provider)
    }

    fn candidate_text(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[test]
    fn model_prefix_not_doubled() {
        assert_eq!(GeminiProvider::model_path("gemini-1.5-flash"), "models/gemini-1.5-flash");
        assert_eq!(GeminiProvider::model_path("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn contents_start_with_instruction_and_map_roles() {
        let call = ToolCall::new("google_search", r#"{"query":"ibm"}"#);
        let id = call.id.clone();
        let messages = vec![
            Message::assistant("Welcome back"),
            Message::user("find ibm"),
            Message::assistant_with_tools(None, vec![call]),
            Message::tool_result(&id, r#"{"results":[]}"#),
        ];
        let body = GeminiProvider::build_body(&request("gemini-1.5-flash", messages));
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 5);
        assert_eq!(contents[0]["role"], "user");
        assert!(contents[0]["parts"][0]["text"].as_str().unwrap().contains("google_search"));
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[3]["role"], "model");
        assert!(contents[3]["parts"][0]["text"].as_str().unwrap().contains(r#""tool": "google_search""#));
        assert_eq!(contents[4]["role"], "user");
        assert_eq!(
            contents[4]["parts"][0]["text"],
            format!(r#"Tool result ({id}): {{"results":[]}}"#)
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[tokio::test]
    async fn complete_plain_text() {
        let (_server, provider) = setup(candidate_text("IBM was founded in 1911.")).await;
        let resp = provider
            .complete(request("gemini-1.5-flash", vec![Message::user("when?")]))
            .await
            .unwrap();
        assert_eq!(resp.content.as_deref(), Some("IBM was founded in 1911."));
        assert!(resp.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn complete_extracts_text_protocol_call() {
        let (_server, provider) = setup(candidate_text(
            "I'll look that up.\n\n{\"tool\": \"google_search\", \"arguments\": {\"query\": \"quantum computing\"}}",
        ))
        .await;
        let resp = provider
            .complete(request("models/gemini-1.5-flash", vec![Message::user("quantum?")]))
            .await
            .unwrap();
        assert_eq!(resp.content.as_deref(), Some("I'll look that up."));
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "google_search");
        assert!(resp.tool_calls[0].arguments.contains("quantum computing"));
    }

    #[tokio::test]
    async fn safety_finish_reason_is_blocked() {
        let (_server, provider) = setup(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .await;
        let err = provider
            .complete(request("gemini-1.5-flash", vec![Message::user("x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Blocked(_)));
    }

    #[tokio::test]
    async fn no_candidates_is_error() {
        let (_server, provider) = setup(json!({"candidates": []})).await;
        let err = provider
            .complete(request("gemini-1.5-flash", vec![Message::user("x")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No response candidates"));
    }

    #[tokio::test]
    async fn missing_parts_is_error() {
        let (_server, provider) = setup(json!({
            "candidates": [{"content": {"role": "model"}, "finishReason": "STOP"}]
        }))
        .await;
        let err = provider
            .complete(request("gemini-1.5-flash", vec![Message::user("x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn api_error_message_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;
        let provider = GeminiProvider::new("bad").with_base_url(server.uri());
        let err = provider
            .complete(request("gemini-1.5-flash", vec![Message::user("x")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }
}
