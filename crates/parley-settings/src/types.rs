//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so partial
//! JSON deep-merges over compiled defaults — missing fields get their
//! default value during deserialization.

use serde::{Deserialize, Serialize};

/// Root settings type for the Parley relay.
///
/// Loaded from `parley.json` with defaults applied for missing fields.
/// `PARLEY_*` environment variables can override specific values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParleySettings {
    /// Settings schema version.
    pub version: String,
    /// Server network settings.
    pub server: ServerSettings,
    /// Room capacity and topic-tracking settings.
    pub rooms: RoomSettings,
    /// Room Authority collaborator settings.
    pub authority: AuthoritySettings,
    /// Enrichment collaborator settings.
    pub enrichment: EnrichmentSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for ParleySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            rooms: RoomSettings::default(),
            authority: AuthoritySettings::default(),
            enrichment: EnrichmentSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ParleySettings {
    /// Clamp out-of-range values and correct invalid invariants.
    ///
    /// Called automatically during loading. Bad values are corrected with a
    /// warning rather than rejected, so a typo in `parley.json` degrades to
    /// sane behavior instead of a refused startup.
    pub fn validate(&mut self) {
        let t = &mut self.rooms.confidence_threshold;
        if !(0.0..=1.0).contains(t) {
            let clamped = t.clamp(0.0, 1.0);
            tracing::warn!("confidence_threshold out of range ({t}), clamped to {clamped}");
            *t = clamped;
        }
        if self.rooms.default_capacity == 0 {
            tracing::warn!("default_capacity must be positive, corrected to 1");
            self.rooms.default_capacity = 1;
        }
        if self.rooms.transcript_window == 0 {
            tracing::warn!("transcript_window must be positive, corrected to 1");
            self.rooms.transcript_window = 1;
        }
        if self.enrichment.max_news_items > 3 {
            tracing::warn!(
                "max_news_items ({}) exceeds the wire limit, corrected to 3",
                self.enrichment.max_news_items
            );
            self.enrichment.max_news_items = 3;
        }
    }
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Address the WebSocket/HTTP listener binds to.
    pub bind_addr: String,
    /// Listener port.
    pub ws_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            ws_port: 9030,
        }
    }
}

/// Room capacity and topic-tracking settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    /// Maximum simultaneous members per room.
    pub default_capacity: usize,
    /// Transcript window size per room (FIFO, oldest evicted).
    pub transcript_window: usize,
    /// Minimum classifier confidence to accept an inferred topic.
    pub confidence_threshold: f64,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            default_capacity: 4,
            transcript_window: 10,
            confidence_threshold: 0.9,
        }
    }
}

/// Room Authority collaborator settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthoritySettings {
    /// Whether a Room Authority is deployed. When false every room is
    /// public and joins never leave the process.
    pub enabled: bool,
    /// Base URL of the authority service.
    pub base_url: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AuthoritySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:9031".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Enrichment collaborator settings (classifier, keyword, fact, news).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichmentSettings {
    /// Base URL of the topic classifier sidecar.
    pub classifier_url: String,
    /// Base URL of the keyword extractor sidecar.
    pub keyword_url: String,
    /// Base URL of the fact (encyclopedia summary) service.
    pub fact_url: String,
    /// Base URL of the news search service.
    pub news_url: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum news items relayed per enrichment. Wire limit is 3.
    pub max_news_items: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            classifier_url: "http://127.0.0.1:9032".to_string(),
            keyword_url: "http://127.0.0.1:9032".to_string(),
            fact_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
            news_url: "http://127.0.0.1:9033".to_string(),
            timeout_ms: 5000,
            max_news_items: 3,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Log filter directive (tracing `EnvFilter` syntax).
    pub level: String,
    /// Emit JSON-structured logs instead of human-readable ones.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let s = ParleySettings::default();
        assert_eq!(s.rooms.default_capacity, 4);
        assert_eq!(s.rooms.transcript_window, 10);
        assert!((s.rooms.confidence_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(s.enrichment.max_news_items, 3);
        assert!(!s.authority.enabled);
    }

    #[test]
    fn empty_json_produces_defaults() {
        let s: ParleySettings = serde_json::from_str("{}").unwrap();
        let d = ParleySettings::default();
        assert_eq!(s.server.ws_port, d.server.ws_port);
        assert_eq!(s.rooms.default_capacity, d.rooms.default_capacity);
    }

    #[test]
    fn partial_json_overrides() {
        let json = serde_json::json!({
            "server": { "wsPort": 9999 },
            "rooms": { "defaultCapacity": 8 }
        });
        let s: ParleySettings = serde_json::from_value(json).unwrap();
        assert_eq!(s.server.ws_port, 9999);
        assert_eq!(s.rooms.default_capacity, 8);
        // Unset fields keep defaults
        assert_eq!(s.rooms.transcript_window, 10);
        assert_eq!(s.server.bind_addr, "0.0.0.0");
    }

    #[test]
    fn json_field_names_are_camel_case() {
        let json = serde_json::to_value(ParleySettings::default()).unwrap();
        let rooms = json.get("rooms").unwrap();
        assert!(rooms.get("defaultCapacity").is_some());
        assert!(rooms.get("transcriptWindow").is_some());
        assert!(rooms.get("confidenceThreshold").is_some());
        let authority = json.get("authority").unwrap();
        assert!(authority.get("baseUrl").is_some());
        assert!(authority.get("timeoutMs").is_some());
    }

    #[test]
    fn validate_clamps_confidence_threshold() {
        let mut s = ParleySettings::default();
        s.rooms.confidence_threshold = 1.5;
        s.validate();
        assert!((s.rooms.confidence_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_corrects_zero_capacity() {
        let mut s = ParleySettings::default();
        s.rooms.default_capacity = 0;
        s.rooms.transcript_window = 0;
        s.validate();
        assert_eq!(s.rooms.default_capacity, 1);
        assert_eq!(s.rooms.transcript_window, 1);
    }

    #[test]
    fn validate_caps_news_items() {
        let mut s = ParleySettings::default();
        s.enrichment.max_news_items = 10;
        s.validate();
        assert_eq!(s.enrichment.max_news_items, 3);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let mut s = ParleySettings::default();
        s.validate();
        let d = ParleySettings::default();
        assert_eq!(s.rooms.default_capacity, d.rooms.default_capacity);
        assert!((s.rooms.confidence_threshold - d.rooms.confidence_threshold).abs() < f64::EPSILON);
    }
}
