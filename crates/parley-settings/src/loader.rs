//! Settings loading: file deep-merge over defaults, then env overrides.

use std::path::Path;

use serde_json::Value;

use crate::errors::SettingsError;
use crate::types::ParleySettings;

/// Deep-merge `overlay` into `base`.
///
/// Objects merge recursively; any other value in `overlay` replaces the one
/// in `base`. Arrays replace wholesale.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from a JSON file, merged over defaults, with `PARLEY_*`
/// environment overrides applied last, then validated.
///
/// A missing file is not an error — defaults plus env overrides apply.
pub fn load_settings_from_path(path: &Path) -> Result<ParleySettings, SettingsError> {
    let defaults = serde_json::to_value(ParleySettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_val: Value = serde_json::from_str(&raw)?;
        deep_merge(defaults, file_val)
    } else {
        tracing::debug!(?path, "no settings file, using defaults");
        defaults
    };

    let mut settings: ParleySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Apply `PARLEY_*` environment variable overrides.
///
/// Unparsable values are ignored with a warning rather than failing startup.
fn apply_env_overrides(settings: &mut ParleySettings) {
    if let Ok(port) = std::env::var("PARLEY_WS_PORT") {
        match port.parse() {
            Ok(p) => settings.server.ws_port = p,
            Err(_) => tracing::warn!(value = %port, "ignoring unparsable PARLEY_WS_PORT"),
        }
    }
    if let Ok(addr) = std::env::var("PARLEY_BIND_ADDR") {
        settings.server.bind_addr = addr;
    }
    if let Ok(url) = std::env::var("PARLEY_AUTHORITY_URL") {
        settings.authority.base_url = url;
        settings.authority.enabled = true;
    }
    if let Ok(level) = std::env::var("PARLEY_LOG") {
        settings.logging.level = level;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
