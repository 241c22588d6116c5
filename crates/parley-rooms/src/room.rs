//! Per-room state: members, transcript window, current topic.
//!
//! A [`Room`] is always accessed through its `tokio::sync::Mutex` in the
//! registry; nothing here locks.

use std::collections::VecDeque;

use parley_core::{ConnectionId, RelayError, RoomId};

/// The room's confidently-inferred subject matter.
#[derive(Clone, Debug, PartialEq)]
pub struct Topic {
    /// Classifier label.
    pub label: String,
    /// Confidence of the last assignment.
    pub confidence: f64,
}

/// One retained speech utterance.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptEntry {
    /// Connection that spoke.
    pub speaker: ConnectionId,
    /// Raw transcript text.
    pub text: String,
    /// Topic inferred from the window containing this entry, once known.
    pub topic: Option<String>,
    /// Monotonic per-room sequence index.
    pub seq: u64,
}

/// Outcome of applying a classification result to a room.
#[derive(Clone, Debug, PartialEq)]
pub enum TopicDecision {
    /// The confidently-inferred topic differs from the stored one
    /// (`None → topic` counts). Enrichment should be triggered.
    Changed(Topic),
    /// Same confident topic as before; no enrichment.
    Unchanged,
    /// Confidence below threshold; the stored topic was cleared.
    NotConfident,
}

/// In-memory state of one room.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    capacity: usize,
    members: Vec<ConnectionId>,
    transcript: VecDeque<TranscriptEntry>,
    window_capacity: usize,
    next_seq: u64,
    current_topic: Option<Topic>,
    enrichment_generation: u64,
    retired: bool,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: RoomId, capacity: usize, window_capacity: usize) -> Self {
        Self {
            id,
            capacity,
            members: Vec::new(),
            transcript: VecDeque::with_capacity(window_capacity),
            window_capacity,
            next_seq: 0,
            current_topic: None,
            enrichment_generation: 0,
            retired: false,
        }
    }

    /// Room id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Maximum simultaneous members.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Member connection ids in insertion order.
    pub fn members(&self) -> &[ConnectionId] {
        &self.members
    }

    /// Whether the room is at capacity.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Whether the connection is a member.
    pub fn contains(&self, connection: &ConnectionId) -> bool {
        self.members.iter().any(|m| m == connection)
    }

    /// Admit a member, enforcing capacity. Admitting an existing member is
    /// a no-op.
    pub fn admit(&mut self, connection: ConnectionId) -> Result<(), RelayError> {
        if self.contains(&connection) {
            return Ok(());
        }
        if self.is_full() {
            return Err(RelayError::RoomFull);
        }
        self.members.push(connection);
        Ok(())
    }

    /// Remove a member. Returns false if it was not a member (duplicate
    /// leave/disconnect tolerance).
    pub fn remove(&mut self, connection: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != connection);
        self.members.len() < before
    }

    /// Mark the room as torn down. A retired room's `Arc` may still be held
    /// by a racing joiner, which must re-resolve through the registry.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    /// Whether the room has been torn down.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    // ── transcript window ──────────────────────────────────────────────

    /// Append a transcript entry, evicting the oldest beyond capacity.
    /// Returns the entry's sequence index.
    pub fn push_transcript(&mut self, speaker: ConnectionId, text: String) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.transcript.len() >= self.window_capacity {
            let _ = self.transcript.pop_front();
        }
        self.transcript.push_back(TranscriptEntry {
            speaker,
            text,
            topic: None,
            seq,
        });
        seq
    }

    /// Retained transcript entries, oldest first.
    pub fn transcript(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.transcript.iter()
    }

    /// Number of retained entries.
    pub fn transcript_len(&self) -> usize {
        self.transcript.len()
    }

    /// All retained texts joined by a space — the windowed classification
    /// input.
    pub fn window_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.transcript {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&entry.text);
        }
        out
    }

    /// Record the inferred topic on the entry with the given sequence index,
    /// if it is still retained.
    pub fn tag_transcript_topic(&mut self, seq: u64, label: &str) {
        if let Some(entry) = self.transcript.iter_mut().find(|e| e.seq == seq) {
            entry.topic = Some(label.to_string());
        }
    }

    // ── topic ──────────────────────────────────────────────────────────

    /// Stored topic, if any.
    pub fn current_topic(&self) -> Option<&Topic> {
        self.current_topic.as_ref()
    }

    /// Generation counter guarding in-flight enrichment results.
    pub fn enrichment_generation(&self) -> u64 {
        self.enrichment_generation
    }

    /// Apply a classification result under the topic-change rules.
    ///
    /// Below-threshold confidence clears the stored topic (so a later
    /// confident reconfirmation re-fires). A confident label matching the
    /// stored one refreshes the confidence but reports `Unchanged`. A
    /// confident differing label (including the first after `None`) stores
    /// the topic, bumps the enrichment generation, and reports `Changed`.
    pub fn apply_classification(
        &mut self,
        label: &str,
        confidence: f64,
        threshold: f64,
    ) -> TopicDecision {
        if confidence < threshold {
            self.current_topic = None;
            return TopicDecision::NotConfident;
        }
        let changed = self
            .current_topic
            .as_ref()
            .is_none_or(|topic| topic.label != label);
        let topic = Topic {
            label: label.to_string(),
            confidence,
        };
        self.current_topic = Some(topic.clone());
        if changed {
            self.enrichment_generation += 1;
            TopicDecision::Changed(topic)
        } else {
            TopicDecision::Unchanged
        }
    }

    /// Whether an enrichment result produced for `topic`/`generation` is
    /// still worth relaying: the room must be non-empty, the stored topic
    /// unchanged, and no newer trigger issued since.
    pub fn enrichment_still_relevant(&self, topic: &str, generation: u64) -> bool {
        !self.members.is_empty()
            && self.enrichment_generation == generation
            && self
                .current_topic
                .as_ref()
                .is_some_and(|t| t.label == topic)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn room(capacity: usize) -> Room {
        Room::new("room1".into(), capacity, 10)
    }

    #[test]
    fn admit_up_to_capacity() {
        let mut r = room(2);
        r.admit("a".into()).unwrap();
        r.admit("b".into()).unwrap();
        assert_matches!(r.admit("c".into()), Err(RelayError::RoomFull));
        assert_eq!(r.members().len(), 2);
    }

    #[test]
    fn admit_is_idempotent() {
        let mut r = room(2);
        r.admit("a".into()).unwrap();
        r.admit("a".into()).unwrap();
        assert_eq!(r.members().len(), 1);
    }

    #[test]
    fn members_keep_insertion_order() {
        let mut r = room(4);
        for id in ["c", "a", "b"] {
            r.admit(id.into()).unwrap();
        }
        let order: Vec<&str> = r.members().iter().map(ConnectionId::as_str).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut r = room(2);
        r.admit("a".into()).unwrap();
        assert!(r.remove(&"a".into()));
        assert!(!r.remove(&"a".into()));
        assert!(r.members().is_empty());
    }

    #[test]
    fn transcript_window_evicts_oldest() {
        let mut r = Room::new("room1".into(), 4, 3);
        for i in 0..5 {
            let _ = r.push_transcript("a".into(), format!("utterance {i}"));
        }
        assert_eq!(r.transcript_len(), 3);
        let texts: Vec<&str> = r.transcript().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["utterance 2", "utterance 3", "utterance 4"]);
    }

    #[test]
    fn transcript_seq_is_monotonic() {
        let mut r = Room::new("room1".into(), 4, 2);
        let s0 = r.push_transcript("a".into(), "one".into());
        let s1 = r.push_transcript("a".into(), "two".into());
        let s2 = r.push_transcript("a".into(), "three".into());
        assert_eq!((s0, s1, s2), (0, 1, 2));
    }

    #[test]
    fn window_text_joins_in_order() {
        let mut r = room(4);
        let _ = r.push_transcript("a".into(), "I love football".into());
        let _ = r.push_transcript("b".into(), "More about football".into());
        assert_eq!(r.window_text(), "I love football More about football");
    }

    #[test]
    fn tag_transcript_topic_ignores_evicted_seq() {
        let mut r = Room::new("room1".into(), 4, 1);
        let old = r.push_transcript("a".into(), "one".into());
        let _ = r.push_transcript("a".into(), "two".into());
        r.tag_transcript_topic(old, "Sports");
        assert!(r.transcript().all(|e| e.topic.is_none()));
    }

    #[test]
    fn first_confident_topic_is_a_change() {
        let mut r = room(4);
        let decision = r.apply_classification("Sports", 0.95, 0.9);
        assert_matches!(decision, TopicDecision::Changed(t) if t.label == "Sports");
        assert_eq!(r.enrichment_generation(), 1);
    }

    #[test]
    fn reconfirmation_is_unchanged() {
        let mut r = room(4);
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        for _ in 0..4 {
            assert_eq!(
                r.apply_classification("Sports", 0.92, 0.9),
                TopicDecision::Unchanged
            );
        }
        assert_eq!(r.enrichment_generation(), 1);
    }

    #[test]
    fn reconfirmation_refreshes_confidence() {
        let mut r = room(4);
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        let _ = r.apply_classification("Sports", 0.99, 0.9);
        let topic = r.current_topic().unwrap();
        assert!((topic.confidence - 0.99).abs() < f64::EPSILON);
    }

    #[test]
    fn low_confidence_clears_topic() {
        let mut r = room(4);
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        assert_eq!(
            r.apply_classification("Sports", 0.5, 0.9),
            TopicDecision::NotConfident
        );
        assert!(r.current_topic().is_none());
    }

    #[test]
    fn topic_refires_after_confidence_gap() {
        let mut r = room(4);
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        let _ = r.apply_classification("Sports", 0.3, 0.9);
        let decision = r.apply_classification("Sports", 0.95, 0.9);
        assert_matches!(decision, TopicDecision::Changed(_));
        assert_eq!(r.enrichment_generation(), 2);
    }

    #[test]
    fn switching_topics_is_a_change() {
        let mut r = room(4);
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        let decision = r.apply_classification("Politics", 0.93, 0.9);
        assert_matches!(decision, TopicDecision::Changed(t) if t.label == "Politics");
    }

    #[test]
    fn enrichment_relevance_checks_members_topic_and_generation() {
        let mut r = room(4);
        r.admit("a".into()).unwrap();
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        let generation = r.enrichment_generation();

        assert!(r.enrichment_still_relevant("Sports", generation));
        // Stale generation
        assert!(!r.enrichment_still_relevant("Sports", generation - 1));
        // Topic moved on
        let _ = r.apply_classification("Politics", 0.95, 0.9);
        assert!(!r.enrichment_still_relevant("Sports", generation));
        // Room emptied
        let _ = r.apply_classification("Sports", 0.95, 0.9);
        let generation = r.enrichment_generation();
        assert!(r.remove(&"a".into()));
        assert!(!r.enrichment_still_relevant("Sports", generation));
    }
}
