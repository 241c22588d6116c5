//! Encyclopedia fact source.
//!
//! Fetches a Wikipedia-style page summary for a keyword and trims it to
//! the first sentence — the relay sends one conversational fact, not a
//! paragraph.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::{truncate_body, EnrichError};

/// Looks up a one-sentence fact for a keyword.
#[async_trait]
pub trait FactSource: Send + Sync {
    /// Fetch a fact, or `None` when the keyword has no page.
    async fn fact(&self, keyword: &str) -> Result<Option<String>, EnrichError>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    extract: String,
}

/// Wikipedia-summary-shaped fact service over HTTP.
pub struct HttpFactSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFactSource {
    /// Build a client for the service at `base_url`.
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

/// First sentence of an extract, including its period. Falls back to the
/// whole extract when no sentence boundary is found.
fn first_sentence(extract: &str) -> String {
    let trimmed = extract.trim();
    match trimmed.find(". ") {
        Some(idx) => trimmed[..=idx].to_string(),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl FactSource for HttpFactSource {
    async fn fact(&self, keyword: &str) -> Result<Option<String>, EnrichError> {
        // Summary endpoints key pages by underscored titles.
        let title = keyword.trim().replace(' ', "_");
        let url = format!("{}/page/summary/{title}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichError::Transport {
                service: "fact",
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichError::Status {
                service: "fact",
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let body: SummaryResponse = response.json().await.map_err(|e| EnrichError::Decode {
            service: "fact",
            reason: e.to_string(),
        })?;
        let sentence = first_sentence(&body.extract);
        Ok(if sentence.is_empty() {
            None
        } else {
            Some(sentence)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
