//! Topic-change → enrichment delivery bridge.
//!
//! Each confirmed topic change spawns one lookup task. The room's
//! generation counter keeps at most one trigger meaningful per room: a
//! newer change bumps the generation, so an older task's result fails the
//! staleness check at apply time and is discarded instead of queued.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use parley_core::ServerEvent;
use parley_enrich::{lookup, FactSource, KeywordExtractor, NewsSource};
use parley_rooms::{RoomRegistry, TopicChange};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::metrics::{
    ENRICHMENT_DELIVERED_TOTAL, ENRICHMENT_LOOKUP_DURATION_SECONDS, ENRICHMENT_STALE_TOTAL,
    ENRICHMENT_TRIGGERED_TOTAL,
};
use crate::websocket::broadcast::BroadcastManager;

/// Runs enrichment lookups and relays surviving results to the room.
pub struct EnrichmentBridge {
    registry: Arc<RoomRegistry>,
    broadcast: Arc<BroadcastManager>,
    keywords: Arc<dyn KeywordExtractor>,
    facts: Arc<dyn FactSource>,
    news: Arc<dyn NewsSource>,
    timeout: Duration,
}

impl EnrichmentBridge {
    /// Create the bridge.
    pub fn new(
        registry: Arc<RoomRegistry>,
        broadcast: Arc<BroadcastManager>,
        keywords: Arc<dyn KeywordExtractor>,
        facts: Arc<dyn FactSource>,
        news: Arc<dyn NewsSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            broadcast,
            keywords,
            facts,
            news,
            timeout,
        }
    }

    /// Spawn the lookup task for one topic change. The returned handle is
    /// only awaited by tests; the server lets tasks run to completion.
    pub fn spawn(&self, change: TopicChange) -> JoinHandle<()> {
        counter!(ENRICHMENT_TRIGGERED_TOTAL).increment(1);
        let registry = Arc::clone(&self.registry);
        let broadcast = Arc::clone(&self.broadcast);
        let keywords = Arc::clone(&self.keywords);
        let facts = Arc::clone(&self.facts);
        let news = Arc::clone(&self.news);
        let timeout = self.timeout;
        tokio::spawn(async move {
            run_lookup(&registry, &broadcast, &*keywords, &*facts, &*news, timeout, change).await;
        })
    }
}

#[instrument(skip_all, fields(room = %change.room, topic = %change.topic))]
async fn run_lookup(
    registry: &RoomRegistry,
    broadcast: &BroadcastManager,
    keywords: &dyn KeywordExtractor,
    facts: &dyn FactSource,
    news: &dyn NewsSource,
    timeout: Duration,
    change: TopicChange,
) {
    let started = Instant::now();
    let outcome = tokio::time::timeout(
        timeout,
        lookup(keywords, facts, news, &change.latest_text),
    )
    .await;
    histogram!(ENRICHMENT_LOOKUP_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    let enrichment = match outcome {
        Err(_) => {
            debug!(timeout_ms = timeout.as_millis() as u64, "enrichment lookup timed out");
            return;
        }
        Ok(Err(e)) => {
            debug!(error = %e, "enrichment lookup failed");
            return;
        }
        Ok(Ok(None)) => {
            debug!("no lookup keyword, enrichment skipped");
            return;
        }
        Ok(Ok(Some(enrichment))) => enrichment,
    };
    if enrichment.is_empty() {
        debug!("enrichment lookup produced nothing");
        return;
    }

    // Re-enter the room's serialized context to apply the result. The room
    // may have emptied, moved on, or been torn down while we were fetching.
    let Some(record) = registry.room(&change.room) else {
        counter!(ENRICHMENT_STALE_TOTAL).increment(1);
        debug!("room gone before enrichment arrived");
        return;
    };
    let guard = record.lock().await;
    if !guard.enrichment_still_relevant(&change.topic, change.generation) {
        counter!(ENRICHMENT_STALE_TOTAL).increment(1);
        debug!("enrichment result stale, discarded");
        return;
    }
    let members = guard.members().to_vec();
    if let Some(text) = enrichment.fact {
        broadcast.send_to_many(&members, &ServerEvent::Fact { text }, None);
    }
    if !enrichment.news.is_empty() {
        broadcast.send_to_many(
            &members,
            &ServerEvent::News {
                items: enrichment.news,
            },
            None,
        );
    }
    counter!(ENRICHMENT_DELIVERED_TOTAL).increment(1);
    info!(members = members.len(), "enrichment delivered");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
