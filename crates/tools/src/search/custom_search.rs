//! Google Custom Search JSON API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchBackend, SearchError, SearchResult};

pub struct CustomSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

impl CustomSearch {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchBackend for CustomSearch {
    fn name(&self) -> &str {
        "google_custom_search"
    }

    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/customsearch/v1", self.base_url);
        let num = num_results.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let body: Response = response.json().await?;
        Ok(body
            .items
            .into_iter()
            .map(|item| SearchResult::new(item.title, item.link, item.snippet))
            .collect())
    }
}
