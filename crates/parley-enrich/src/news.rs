//! News headline source.

use std::time::Duration;

use async_trait::async_trait;
use parley_core::NewsItem;
use serde::Deserialize;

use crate::errors::{truncate_body, EnrichError};

/// Searches recent news for a keyword.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Fetch up to the configured number of headlines, most relevant first.
    async fn headlines(&self, keyword: &str) -> Result<Vec<NewsItem>, EnrichError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    // Providers disagree on the field name.
    #[serde(alias = "title")]
    headline: String,
    url: String,
}

/// News search service over HTTP.
pub struct HttpNewsSource {
    client: reqwest::Client,
    base_url: String,
    max_items: usize,
}

impl HttpNewsSource {
    /// Build a client for the service at `base_url`, returning at most
    /// `max_items` headlines per search.
    pub fn new(base_url: &str, timeout: Duration, max_items: usize) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_items,
        })
    }
}

#[async_trait]
impl NewsSource for HttpNewsSource {
    async fn headlines(&self, keyword: &str) -> Result<Vec<NewsItem>, EnrichError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", keyword)])
            .send()
            .await
            .map_err(|e| EnrichError::Transport {
                service: "news",
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Status {
                service: "news",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let body: SearchResponse = response.json().await.map_err(|e| EnrichError::Decode {
            service: "news",
            reason: e.to_string(),
        })?;
        Ok(body
            .articles
            .into_iter()
            .take(self.max_items)
            .map(|a| NewsItem {
                headline: a.headline,
                url: a.url,
            })
            .collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
