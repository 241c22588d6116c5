//! # parley-settings
//!
//! Configuration with layered sources for the Parley relay.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ParleySettings::default()`]
//! 2. **File** — `parley.json` (deep-merged over defaults)
//! 3. **Environment variables** — `PARLEY_*` overrides (highest priority)
//!
//! The server loads once at startup and threads an `Arc<ParleySettings>`
//! through its state; there is no runtime reload path.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{deep_merge, load_settings_from_path};
pub use types::*;
