//! Shared fixtures for server tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusBuilder;
use parley_core::{ConnectionId, NewsItem, RelayError, RoomId};
use parley_enrich::{EnrichError, FactSource, KeywordExtractor, NewsSource};
use parley_rooms::{
    AuthorityError, Classification, DisabledAuthority, RoomAuthority, RoomMeta, TopicClassifier,
};
use parley_settings::ParleySettings;
use tokio::sync::mpsc;

use crate::state::AppState;

/// Classifier that answers "Sports" with high confidence whenever the text
/// mentions football, and an unconfident "Unknown" otherwise.
pub struct KeywordClassifier;

#[async_trait]
impl TopicClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, RelayError> {
        if text.contains("football") {
            Ok(Classification {
                label: "Sports".into(),
                confidence: 0.95,
            })
        } else {
            Ok(Classification {
                label: "Unknown".into(),
                confidence: 0.3,
            })
        }
    }
}

/// Keyword extractor that finds "football" when present.
pub struct FootballKeyword;

#[async_trait]
impl KeywordExtractor for FootballKeyword {
    async fn keyword(&self, text: &str) -> Result<Option<String>, EnrichError> {
        Ok(text.contains("football").then(|| "football".to_string()))
    }
}

/// Fact source with one canned sentence.
pub struct CannedFact;

#[async_trait]
impl FactSource for CannedFact {
    async fn fact(&self, _keyword: &str) -> Result<Option<String>, EnrichError> {
        Ok(Some("Football is a family of team sports.".to_string()))
    }
}

/// News source with two canned headlines.
pub struct CannedNews;

#[async_trait]
impl NewsSource for CannedNews {
    async fn headlines(&self, _keyword: &str) -> Result<Vec<NewsItem>, EnrichError> {
        Ok(vec![
            NewsItem {
                headline: "Cup final tonight".into(),
                url: "https://example.com/cup".into(),
            },
            NewsItem {
                headline: "Transfer window closes".into(),
                url: "https://example.com/window".into(),
            },
        ])
    }
}

/// Authority with a fixed set of private rooms and their passwords.
pub struct FakeAuthority {
    passwords: HashMap<RoomId, String>,
}

impl FakeAuthority {
    /// Authority that knows one private room.
    pub fn with_private_room(room: &str, password: &str) -> Self {
        let mut passwords = HashMap::new();
        let _ = passwords.insert(room.into(), password.to_string());
        Self { passwords }
    }
}

#[async_trait]
impl RoomAuthority for FakeAuthority {
    async fn room_meta(&self, room: &RoomId) -> Result<Option<RoomMeta>, AuthorityError> {
        Ok(self
            .passwords
            .contains_key(room)
            .then_some(RoomMeta { private: true }))
    }

    async fn register_member(
        &self,
        room: &RoomId,
        _connection: &ConnectionId,
        _user: &str,
        password: Option<&str>,
    ) -> Result<(), AuthorityError> {
        match self.passwords.get(room) {
            Some(expected) if password == Some(expected.as_str()) => Ok(()),
            Some(_) => Err(AuthorityError::Rejected("wrong password".into())),
            None => Ok(()),
        }
    }

    async fn deregister_member(
        &self,
        _room: &RoomId,
        _connection: &ConnectionId,
    ) -> Result<(), AuthorityError> {
        Ok(())
    }
}

/// Full state graph with a public-only authority and canned collaborators.
pub fn test_state() -> AppState {
    state_with(Arc::new(DisabledAuthority))
}

/// Full state graph with the given authority.
pub fn test_state_with_authority(authority: FakeAuthority) -> AppState {
    state_with(Arc::new(authority))
}

fn state_with(authority: Arc<dyn RoomAuthority>) -> AppState {
    AppState::new(
        ParleySettings::default(),
        authority,
        Arc::new(KeywordClassifier),
        Arc::new(FootballKeyword),
        Arc::new(CannedFact),
        Arc::new(CannedNews),
        PrometheusBuilder::new().build_recorder().handle(),
    )
}

/// Await one event on a connection's channel and parse it.
pub async fn recv_event(rx: &mut mpsc::Receiver<Arc<String>>) -> serde_json::Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed");
    serde_json::from_str(&msg).expect("event is valid JSON")
}
