//! # cricket_core - Ball-by-ball Cricket Scoring Engine
//!
//! Turns a stream of deliveries into consistent match state: over/ball
//! numbering, batting and bowling scorecards, partnerships, innings totals
//! and match results.
//!
//! ## Features
//! - Every delivery commits as one atomic write batch
//! - Per-innings serialization, innings proceed in parallel
//! - Statistics re-derived from the delivery log, with replay verification
//! - Pluggable storage, registry and live-update transport

pub mod broadcast;
pub mod commentary;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod registry;
pub mod stats;
pub mod storage;

pub use broadcast::{BroadcastKind, BroadcastMessage, Broadcaster, NullBroadcaster, RecordingBroadcaster};
pub use config::{ScoringConfig, StrikePolicy, TossPolicy};
pub use engine::{DeliveryOutcome, ExpectedStrike, Scorer, ScoringContext};
pub use error::{DomainError, Result, ScoringError, StorageError, ValidationError};
pub use registry::{MemoryRegistry, Registry};
pub use stats::StatisticsView;
pub use storage::{MemoryStore, ScoreStore, WriteBatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
