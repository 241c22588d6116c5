//! # parley-rooms
//!
//! Room/session coordination for the Parley relay.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `room` | Per-room state: members, transcript window, current topic |
//! | `registry` | Per-room serialized records + connection bookkeeping |
//! | `lifecycle` | Join/leave/disconnect with capacity and privacy gating |
//! | `topic` | Transcript-driven topic-change detection |
//! | `authority` | Room Authority collaborator seam |
//!
//! ## Concurrency model
//!
//! Each room lives behind its own `tokio::sync::Mutex` — the room's
//! serialization token. Capacity checks, member mutations, and departure
//! notifications all happen under that lock, so two racing joiners can
//! never both observe a free slot. Collaborator I/O (authority calls,
//! classification) runs off the lock and re-enters it only to apply
//! results.

#![deny(unsafe_code)]

pub mod authority;
pub mod lifecycle;
pub mod registry;
pub mod room;
pub mod topic;

pub use authority::{AuthorityError, DisabledAuthority, RoomAuthority, RoomMeta};
pub use lifecycle::{DepartReason, JoinReply, RoomLifecycle, RoomNotifier};
pub use registry::RoomRegistry;
pub use room::{Room, Topic, TopicDecision, TranscriptEntry};
pub use topic::{Classification, TopicChange, TopicClassifier, TopicTracker};
