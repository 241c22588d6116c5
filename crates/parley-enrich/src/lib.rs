//! HTTP collaborator clients for the relay.
//!
//! Each collaborator is a small reqwest client with its own timeout,
//! implementing a trait seam owned by its consumer:
//!
//! | Module       | Provides |
//! |--------------|----------|
//! | `authority`  | [`HttpRoomAuthority`] — room metadata + password gate |
//! | `classifier` | [`HttpClassifier`] — topic label + confidence |
//! | `keyword`    | [`KeywordExtractor`] seam + HTTP impl |
//! | `fact`       | [`FactSource`] seam + HTTP impl (summary endpoint) |
//! | `news`       | [`NewsSource`] seam + HTTP impl (search endpoint) |
//! | `pipeline`   | [`lookup`] — keyword → fact + news, concurrently |
//!
//! The `RoomAuthority` and `TopicClassifier` seams live in `parley-rooms`
//! with their consumers; this crate only supplies the HTTP ends.

pub mod authority;
pub mod classifier;
pub mod errors;
pub mod fact;
pub mod keyword;
pub mod news;
pub mod pipeline;

pub use authority::HttpRoomAuthority;
pub use classifier::HttpClassifier;
pub use errors::EnrichError;
pub use fact::{FactSource, HttpFactSource};
pub use keyword::{HttpKeywordExtractor, KeywordExtractor};
pub use news::{HttpNewsSource, NewsSource};
pub use pipeline::{lookup, Enrichment};
