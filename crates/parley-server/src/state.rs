//! Shared application state passed to axum handlers.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use parley_enrich::{FactSource, KeywordExtractor, NewsSource};
use parley_rooms::{RoomAuthority, RoomLifecycle, RoomRegistry, TopicClassifier, TopicTracker};
use parley_settings::ParleySettings;

use crate::enrichment::EnrichmentBridge;
use crate::websocket::broadcast::BroadcastManager;

/// Everything a handler needs: registry, lifecycle, fan-out, topic
/// tracking, enrichment, and the metrics handle.
#[derive(Clone)]
pub struct AppState {
    /// Loaded settings.
    pub settings: Arc<ParleySettings>,
    /// Room and connection registry.
    pub registry: Arc<RoomRegistry>,
    /// Join/leave/disconnect coordinator.
    pub lifecycle: Arc<RoomLifecycle>,
    /// Event fan-out to connected clients.
    pub broadcast: Arc<BroadcastManager>,
    /// Transcript window + topic-change detection.
    pub tracker: Arc<TopicTracker>,
    /// Topic-change → fact/news delivery.
    pub enrichment: Arc<EnrichmentBridge>,
    /// Renders the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Wire up the full state graph from settings and collaborator handles.
    pub fn new(
        settings: ParleySettings,
        authority: Arc<dyn RoomAuthority>,
        classifier: Arc<dyn TopicClassifier>,
        keywords: Arc<dyn KeywordExtractor>,
        facts: Arc<dyn FactSource>,
        news: Arc<dyn NewsSource>,
        metrics: PrometheusHandle,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new(
            settings.rooms.default_capacity,
            settings.rooms.transcript_window,
        ));
        let lifecycle = Arc::new(RoomLifecycle::new(Arc::clone(&registry), authority));
        let broadcast = Arc::new(BroadcastManager::new());
        let tracker = Arc::new(TopicTracker::new(
            Arc::clone(&registry),
            classifier,
            settings.rooms.confidence_threshold,
        ));
        let enrichment = Arc::new(EnrichmentBridge::new(
            Arc::clone(&registry),
            Arc::clone(&broadcast),
            keywords,
            facts,
            news,
            Duration::from_millis(settings.enrichment.timeout_ms),
        ));
        Self {
            settings: Arc::new(settings),
            registry,
            lifecycle,
            broadcast,
            tracker,
            enrichment,
            metrics,
        }
    }
}
