//! HTTP Room Authority client.
//!
//! Implements the `RoomAuthority` seam against the external service that
//! owns room metadata and passwords. Status mapping: 404 on metadata means
//! "no record, treat as public"; any 4xx on registration is a refusal and
//! carries the authority's detail; 5xx and transport failures are
//! [`AuthorityError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use parley_core::{ConnectionId, RoomId};
use parley_rooms::{AuthorityError, RoomAuthority, RoomMeta};
use parley_settings::AuthoritySettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{truncate_body, EnrichError};

#[derive(Debug, Deserialize)]
struct RoomMetaBody {
    privacy: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    connection_id: &'a str,
    user: &'a str,
    password: Option<&'a str>,
}

/// Room Authority over HTTP.
pub struct HttpRoomAuthority {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoomAuthority {
    /// Build a client from the authority settings.
    pub fn new(settings: &AuthoritySettings) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| EnrichError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RoomAuthority for HttpRoomAuthority {
    async fn room_meta(&self, room: &RoomId) -> Result<Option<RoomMeta>, AuthorityError> {
        let url = format!("{}/rooms/{room}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(room = %room, "authority has no record, treating as public");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthorityError::Unavailable(format!(
                "authority returned {status}: {}",
                truncate_body(&body)
            )));
        }
        let body: RoomMetaBody = response
            .json()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;
        Ok(Some(RoomMeta {
            private: body.privacy,
        }))
    }

    async fn register_member(
        &self,
        room: &RoomId,
        connection: &ConnectionId,
        user: &str,
        password: Option<&str>,
    ) -> Result<(), AuthorityError> {
        let url = format!("{}/rooms/{room}/members", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&RegisterBody {
                connection_id: connection.as_str(),
                user,
                password,
            })
            .send()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let detail = truncate_body(&body);
        if status.is_client_error() {
            Err(AuthorityError::Rejected(detail))
        } else {
            Err(AuthorityError::Unavailable(format!(
                "authority returned {status}: {detail}"
            )))
        }
    }

    async fn deregister_member(
        &self,
        room: &RoomId,
        connection: &ConnectionId,
    ) -> Result<(), AuthorityError> {
        let url = format!("{}/rooms/{room}/members/{connection}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        let status = response.status();
        // Already gone is as good as removed.
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let detail = truncate_body(&body);
        if status.is_client_error() {
            Err(AuthorityError::Rejected(detail))
        } else {
            Err(AuthorityError::Unavailable(format!(
                "authority returned {status}: {detail}"
            )))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
