//! Wikipedia REST page summary.

use async_trait::async_trait;
use serde::Deserialize;

use super::{SearchBackend, SearchError, SearchResult};

pub struct Wikipedia {
    client: reqwest::Client,
    base_url: String,
}

impl Wikipedia {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Summary {
    title: Option<String>,
    extract: Option<String>,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    page: Option<String>,
}

#[async_trait]
impl SearchBackend for Wikipedia {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn source(&self) -> Option<&str> {
        Some("Wikipedia")
    }

    async fn search(
        &self,
        query: &str,
        _num_results: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        let encoded = urlencoding::encode(query);
        let url = format!("{}/api/rest_v1/page/summary/{encoded}", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let summary: Summary = response.json().await?;
        let link = summary
            .content_urls
            .and_then(|u| u.desktop)
            .and_then(|d| d.page)
            .unwrap_or_else(|| format!("https://en.wikipedia.org/wiki/{encoded}"));

        Ok(vec![SearchResult::new(
            summary.title.filter(|t| !t.is_empty()).unwrap_or_else(|| query.to_string()),
            link,
            summary
                .extract
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("Information about {query} from Wikipedia.")),
        )])
    }
}
