//! HTTP topic classifier client.

use std::time::Duration;

use async_trait::async_trait;
use parley_core::RelayError;
use parley_rooms::{Classification, TopicClassifier};
use serde::{Deserialize, Serialize};

use crate::errors::EnrichError;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
    confidence: f64,
}

/// Topic classifier sidecar over HTTP.
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
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
impl TopicClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, RelayError> {
        let url = format!("{}/classify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ClassifyRequest { text })
            .send()
            .await
            .map_err(|e| RelayError::EnrichmentUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::EnrichmentUnavailable(format!(
                "classifier returned {status}"
            )));
        }
        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| RelayError::EnrichmentUnavailable(e.to_string()))?;
        Ok(Classification {
            label: body.label,
            confidence: body.confidence,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
