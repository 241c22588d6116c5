//! Keyword extraction collaborator.
//!
//! Turns the latest utterance into a single lookup keyword. `Ok(None)`
//! means the utterance carried nothing worth looking up, which quietly
//! ends the enrichment attempt.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{truncate_body, EnrichError};

/// Extracts the lookup keyword from an utterance.
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Extract a keyword, or `None` when there is nothing to look up.
    async fn keyword(&self, text: &str) -> Result<Option<String>, EnrichError>;
}

#[derive(Debug, Serialize)]
struct KeywordRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct KeywordResponse {
    keyword: Option<String>,
}

/// Keyword extractor sidecar over HTTP.
pub struct HttpKeywordExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKeywordExtractor {
    /// Build a client for the sidecar at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl KeywordExtractor for HttpKeywordExtractor {
    async fn keyword(&self, text: &str) -> Result<Option<String>, EnrichError> {
        let url = format!("{}/keywords", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&KeywordRequest { text })
            .send()
            .await
            .map_err(|e| EnrichError::Transport {
                service: "keyword",
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Status {
                service: "keyword",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let body: KeywordResponse =
            response.json().await.map_err(|e| EnrichError::Decode {
                service: "keyword",
                reason: e.to_string(),
            })?;
        Ok(body.keyword.filter(|k| !k.trim().is_empty()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
