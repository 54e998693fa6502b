//! DuckDuckGo Instant Answer API (no key required).
//!
//! Collects the abstract, then related topics, then up to two string
//! infobox facts.

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchBackend, SearchError, SearchResult};

pub struct DuckDuckGo {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGo {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Answer {
    heading: String,
    #[serde(rename = "Abstract")]
    abstract_: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<Topic>,
    infobox: Option<Infobox>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Topic {
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}

// DuckDuckGo sends `"Infobox": ""` when there is none
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Infobox {
    Present { content: Vec<InfoboxItem> },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct InfoboxItem {
    #[serde(default)]
    data_type: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn collect(query: &str, answer: Answer, num_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let link = or_default(&answer.abstract_url, "#").to_string();

    if !answer.abstract_.is_empty() && !answer.abstract_text.is_empty() {
        let fallback_title = format!("About {query}");
        results.push(SearchResult::new(
            or_default(&answer.heading, &fallback_title),
            link.clone(),
            answer.abstract_text.clone(),
        ));
    }

    let room = num_results.saturating_sub(results.len());
    for topic in answer.related_topics.into_iter().take(room) {
        // Grouped topics have no Text/FirstURL of their own
        let (Some(text), Some(url)) = (topic.text, topic.first_url) else {
            continue;
        };
        if text.is_empty() || url.is_empty() {
            continue;
        }
        let title = text.split(" - ").next().unwrap_or(&text).to_string();
        results.push(SearchResult::new(title, url, text));
    }

    if let Some(Infobox::Present { content }) = answer.infobox {
        for item in content.into_iter().take(2) {
            let Some(value) = item.value.as_str().filter(|v| !v.is_empty()) else {
                continue;
            };
            if item.data_type != "string" {
                continue;
            }
            let label = item.label.as_deref().unwrap_or("Information");
            results.push(SearchResult::new(
                format!("{query} - {label}"),
                link.clone(),
                format!("{}: {value}", item.label.as_deref().unwrap_or("")),
            ));
        }
    }

    results.truncate(num_results);
    results
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn source(&self) -> Option<&str> {
        Some("DuckDuckGo")
    }

    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let answer: Answer = response.json().await?;
        let results = collect(query, answer, num_results);
        if results.is_empty() {
            return Err(SearchError::Empty);
        }
        Ok(results)
    }
}
