//! Transcript-driven topic-change detection.
//!
//! **Windowed classification policy**: the classifier input is the
//! concatenation of all retained transcript texts, not just the latest
//! utterance. The window lags a genuine topic switch by up to its size but
//! is stable against one-off noisy utterances. Keyword extraction for
//! enrichment still uses only the latest utterance (see the enrichment
//! pipeline), independent of this policy.
//!
//! Classification is network-bound, so it runs off the room lock: append
//! and snapshot under the lock, classify, then re-enter the lock to apply
//! the topic-change rules.

use std::sync::Arc;

use async_trait::async_trait;
use parley_core::{ConnectionId, RelayError, RoomId};
use tracing::{debug, instrument};

use crate::registry::RoomRegistry;
use crate::room::TopicDecision;

/// One classifier verdict.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    /// Topic label.
    pub label: String,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
}

/// Text classification collaborator.
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Classify `text` into a topic label with a confidence score.
    async fn classify(&self, text: &str) -> Result<Classification, RelayError>;
}

/// A genuine topic transition, handed to the enrichment orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct TopicChange {
    /// Room whose topic changed.
    pub room: RoomId,
    /// The newly accepted topic label.
    pub topic: String,
    /// The latest utterance — keyword extraction input.
    pub latest_text: String,
    /// Room enrichment generation at trigger time; results are discarded
    /// if the room has moved on by completion time.
    pub generation: u64,
}

/// Maintains transcript windows and decides when a room's topic changed.
pub struct TopicTracker {
    registry: Arc<RoomRegistry>,
    classifier: Arc<dyn TopicClassifier>,
    confidence_threshold: f64,
}

impl TopicTracker {
    /// Create a tracker over the shared registry.
    pub fn new(
        registry: Arc<RoomRegistry>,
        classifier: Arc<dyn TopicClassifier>,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            registry,
            classifier,
            confidence_threshold,
        }
    }

    /// Feed one speech event. Returns a [`TopicChange`] when the room's
    /// confidently-inferred topic genuinely changed.
    ///
    /// Empty transcripts, speech for unknown rooms, and speech from
    /// non-members are ignored. A classifier failure is swallowed — the
    /// only observable effect is the absence of enrichment.
    #[instrument(skip(self, transcript), fields(room = %room, speaker = %speaker))]
    pub async fn observe(
        &self,
        room: &RoomId,
        speaker: &ConnectionId,
        transcript: &str,
    ) -> Option<TopicChange> {
        let text = transcript.trim();
        if text.is_empty() {
            return None;
        }
        let Some(record) = self.registry.room(room) else {
            debug!("speech for unknown room, ignoring");
            return None;
        };

        // Append under the lock and snapshot the classification input.
        let (window_text, seq) = {
            let mut guard = record.lock().await;
            if !guard.contains(speaker) {
                debug!("speech from non-member, ignoring");
                return None;
            }
            let seq = guard.push_transcript(speaker.clone(), text.to_string());
            (guard.window_text(), seq)
        };

        // Classify off the lock — the model call must not stall the room.
        let classification = match self.classifier.classify(&window_text).await {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "classification failed, skipping enrichment");
                return None;
            }
        };

        // Re-enter the lock to apply the result.
        let mut guard = record.lock().await;
        let decision = guard.apply_classification(
            &classification.label,
            classification.confidence,
            self.confidence_threshold,
        );
        match decision {
            TopicDecision::Changed(topic) => {
                guard.tag_transcript_topic(seq, &topic.label);
                debug!(topic = %topic.label, confidence = topic.confidence, "topic changed");
                Some(TopicChange {
                    room: room.clone(),
                    topic: topic.label,
                    latest_text: text.to_string(),
                    generation: guard.enrichment_generation(),
                })
            }
            TopicDecision::Unchanged => {
                guard.tag_transcript_topic(seq, &classification.label);
                None
            }
            TopicDecision::NotConfident => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Classifier returning canned verdicts in order, then repeating the
    /// last one.
    struct ScriptedClassifier {
        script: Mutex<Vec<Classification>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClassifier {
        fn new(script: Vec<(&str, f64)>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .rev()
                        .map(|(label, confidence)| Classification {
                            label: label.to_string(),
                            confidence,
                        })
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TopicClassifier for ScriptedClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, RelayError> {
            self.calls.lock().push(text.to_string());
            let mut script = self.script.lock();
            match script.len() {
                0 => Err(RelayError::EnrichmentUnavailable("no verdict".into())),
                1 => Ok(script[0].clone()),
                _ => Ok(script.pop().expect("checked non-empty")),
            }
        }
    }

    async fn tracker_with_member(
        script: Vec<(&str, f64)>,
    ) -> (TopicTracker, Arc<RoomRegistry>, RoomId) {
        let registry = Arc::new(RoomRegistry::new(4, 10));
        let room: RoomId = "room1".into();
        registry
            .room_or_create(&room)
            .lock()
            .await
            .admit("a".into())
            .unwrap();
        let tracker = TopicTracker::new(
            Arc::clone(&registry),
            Arc::new(ScriptedClassifier::new(script)),
            0.9,
        );
        (tracker, registry, room)
    }

    #[tokio::test]
    async fn first_confident_topic_triggers() {
        let (tracker, _reg, room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        let change = tracker
            .observe(&room, &"a".into(), "I love football")
            .await
            .unwrap();
        assert_eq!(change.topic, "Sports");
        assert_eq!(change.latest_text, "I love football");
        assert_eq!(change.generation, 1);
    }

    #[tokio::test]
    async fn reconfirmed_topic_triggers_once() {
        let (tracker, _reg, room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        let mut triggers = 0;
        for text in [
            "I love football",
            "More about football",
            "football again",
            "still football",
            "yet more football",
        ] {
            if tracker.observe(&room, &"a".into(), text).await.is_some() {
                triggers += 1;
            }
        }
        assert_eq!(triggers, 1);
    }

    #[tokio::test]
    async fn low_confidence_yields_no_trigger() {
        let (tracker, _reg, room) = tracker_with_member(vec![("Sports", 0.5)]).await;
        assert!(tracker
            .observe(&room, &"a".into(), "something muddled")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn topic_refires_after_low_confidence_gap() {
        let (tracker, _reg, room) = tracker_with_member(vec![
            ("Sports", 0.95),
            ("Sports", 0.4),
            ("Sports", 0.95),
        ])
        .await;
        assert!(tracker.observe(&room, &"a".into(), "one").await.is_some());
        assert!(tracker.observe(&room, &"a".into(), "two").await.is_none());
        let change = tracker.observe(&room, &"a".into(), "three").await.unwrap();
        assert_eq!(change.generation, 2);
    }

    #[tokio::test]
    async fn classifier_input_is_the_whole_window() {
        let registry = Arc::new(RoomRegistry::new(4, 10));
        let room: RoomId = "room1".into();
        registry
            .room_or_create(&room)
            .lock()
            .await
            .admit("a".into())
            .unwrap();
        let classifier = Arc::new(ScriptedClassifier::new(vec![("Sports", 0.95)]));
        let shared: Arc<dyn TopicClassifier> = classifier.clone();
        let tracker = TopicTracker::new(Arc::clone(&registry), shared, 0.9);

        let _ = tracker.observe(&room, &"a".into(), "I love football").await;
        let _ = tracker
            .observe(&room, &"a".into(), "More about football")
            .await;

        let calls = classifier.calls.lock().clone();
        assert_eq!(
            calls,
            ["I love football", "I love football More about football"]
        );
    }

    #[tokio::test]
    async fn empty_transcript_is_ignored() {
        let (tracker, _reg, room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        assert!(tracker.observe(&room, &"a".into(), "   ").await.is_none());
    }

    #[tokio::test]
    async fn speech_for_unknown_room_is_ignored() {
        let (tracker, _reg, _room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        assert!(tracker
            .observe(&"ghost".into(), &"a".into(), "hello")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn speech_from_non_member_is_ignored() {
        let (tracker, reg, room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        assert!(tracker
            .observe(&room, &"stranger".into(), "hello")
            .await
            .is_none());
        // And nothing was appended
        assert_eq!(
            reg.room(&room).unwrap().lock().await.transcript_len(),
            0
        );
    }

    #[tokio::test]
    async fn classifier_failure_is_swallowed() {
        let (tracker, reg, room) = tracker_with_member(vec![]).await;
        assert!(tracker
            .observe(&room, &"a".into(), "undecidable")
            .await
            .is_none());
        // The transcript entry is still retained
        assert_eq!(
            reg.room(&room).unwrap().lock().await.transcript_len(),
            1
        );
    }

    #[tokio::test]
    async fn window_stays_bounded_across_many_utterances() {
        let (tracker, reg, room) = tracker_with_member(vec![("Sports", 0.95)]).await;
        for i in 0..25 {
            let _ = tracker
                .observe(&room, &"a".into(), &format!("utterance {i}"))
                .await;
        }
        assert_eq!(
            reg.room(&room).unwrap().lock().await.transcript_len(),
            10
        );
    }
}
