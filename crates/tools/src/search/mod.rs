//! `google_search`: a strict chain of search stages that never fails.
//!
//! Order: the Google Custom Search API (only when both credentials are set),
//! then the free lookups (DuckDuckGo, Wikipedia, the built-in knowledge
//! base) until one yields a result, then the deterministic mock generator.
//! Stage failures are logged and swallowed.

pub mod custom_search;
pub mod duckduckgo;
pub mod knowledge_base;
pub mod mock;
pub mod wikipedia;

use std::time::Duration;

use agentflow_config::SearchConfig;
use agentflow_core::error::ToolError;
use agentflow_core::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use custom_search::CustomSearch;
pub use duckduckgo::DuckDuckGo;
pub use knowledge_base::KnowledgeBase;
pub use wikipedia::Wikipedia;

const DEFAULT_NUM_RESULTS: u64 = 5;
const MAX_NUM_RESULTS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// The JSON object `google_search` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutput {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Which stage answered, when it was not the primary API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("unreadable response: {0}")]
    Decode(String),

    #[error("no results")]
    Empty,
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::Http(e.to_string())
        }
    }
}

/// One stage of the search chain.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Label reported in the `source` field, if any.
    fn source(&self) -> Option<&str> {
        None
    }

    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError>;
}

/// The `google_search` tool.
pub struct GoogleSearchTool {
    primary: Option<Box<dyn SearchBackend>>,
    fallbacks: Vec<Box<dyn SearchBackend>>,
}

impl GoogleSearchTool {
    /// Assemble the chain from configuration.
    ///
    /// In offline mode only the knowledge base (and the mock behind it) is used.
    pub fn from_config(config: &SearchConfig) -> Self {
        if config.offline {
            return Self::with_backends(None, vec![Box::new(KnowledgeBase)]);
        }

        let client = http_client(Duration::from_secs(config.timeout_secs));
        let primary = match (present(&config.api_key), present(&config.engine_id)) {
            (Some(key), Some(cx)) => Some(Box::new(CustomSearch::new(
                client.clone(),
                &config.custom_search_url,
                key,
                cx,
            )) as Box<dyn SearchBackend>),
            _ => None,
        };

        Self::with_backends(
            primary,
            vec![
                Box::new(DuckDuckGo::new(client.clone(), &config.duckduckgo_url)),
                Box::new(Wikipedia::new(client, &config.wikipedia_url)),
                Box::new(KnowledgeBase),
            ],
        )
    }

    /// Build a chain from explicit stages.
    pub fn with_backends(
        primary: Option<Box<dyn SearchBackend>>,
        fallbacks: Vec<Box<dyn SearchBackend>>,
    ) -> Self {
        Self { primary, fallbacks }
    }

    /// Run the chain. Always produces at least one result.
    pub async fn search(&self, query: &str, num_results: usize) -> SearchOutput {
        let stages = self.primary.iter().chain(self.fallbacks.iter());

        for stage in stages {
            match stage.search(query, num_results).await {
                Ok(results) if !results.is_empty() => {
                    debug!(stage = stage.name(), results = results.len(), "Search stage answered");
                    return SearchOutput {
                        query: query.to_string(),
                        results: results.into_iter().take(num_results).collect(),
                        source: stage.source().map(String::from),
                    };
                }
                Ok(_) => warn!(stage = stage.name(), "Search stage returned no results, trying next"),
                Err(e) => warn!(stage = stage.name(), error = %e, "Search stage failed, trying next"),
            }
        }

        warn!(query = %query, "All search stages failed, using mock results");
        SearchOutput {
            query: query.to_string(),
            results: mock::results(query, num_results),
            source: None,
        }
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Search Google for information and return relevant snippets"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to execute"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default: 5)",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<Value, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let num_results = arguments["num_results"]
            .as_u64()
            .unwrap_or(DEFAULT_NUM_RESULTS)
            .clamp(1, MAX_NUM_RESULTS) as usize;

        let output = self.search(query, num_results).await;
        serde_json::to_value(output).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "google_search".into(),
            reason: e.to_string(),
        })
    }
}

/// Render a tool result for display: search results as a numbered list,
/// anything else as pretty JSON.
pub fn format_for_display(value: &Value) -> String {
    match serde_json::from_value::<SearchOutput>(value.clone()) {
        Ok(output) => {
            let source = output
                .source
                .as_deref()
                .map(|s| format!(" (via {s})"))
                .unwrap_or_default();
            let mut formatted = format!("Search Results for \"{}\"{source}:\n\n", output.query);
            for (i, item) in output.results.iter().enumerate() {
                formatted.push_str(&format!(
                    "{}. **{}**\n   {}\n   🔗 {}\n\n",
                    i + 1,
                    item.title,
                    item.snippet,
                    item.link
                ));
            }
            formatted
        }
        Err(_) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    }
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
