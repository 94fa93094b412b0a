//! # Live update publishing
//!
//! The engine publishes after a successful commit and only logs a failed
//! publish; the score is already durable at that point.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MatchId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastKind {
    BallUpdate,
    ScoreUpdate,
    InningsComplete,
    MatchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub match_id: MatchId,
    pub kind: BroadcastKind,
    pub payload: serde_json::Value,
}

impl BroadcastMessage {
    pub fn new(match_id: MatchId, kind: BroadcastKind, payload: serde_json::Value) -> Self {
        Self { match_id, kind, payload }
    }

    /// Subscription room of the match this message belongs to.
    pub fn room(&self) -> String {
        room(self.match_id)
    }
}

/// Room name subscribers join to follow a match.
pub fn room(match_id: MatchId) -> String {
    format!("match_{}", match_id)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Broadcast transport unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode broadcast payload: {0}")]
    Encode(String),
}

pub trait Broadcaster: Send + Sync {
    fn publish(&self, message: BroadcastMessage) -> Result<(), BroadcastError>;
}

/// Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _message: BroadcastMessage) -> Result<(), BroadcastError> {
        Ok(())
    }
}

/// Keeps every published message in memory; optionally fails every publish.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    messages: Mutex<Vec<BroadcastMessage>>,
    failing: bool,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broadcaster whose transport is always down.
    pub fn failing() -> Self {
        Self { messages: Mutex::new(Vec::new()), failing: true }
    }

    pub fn messages(&self) -> Vec<BroadcastMessage> {
        self.messages.lock().clone()
    }

    pub fn kinds(&self) -> Vec<BroadcastKind> {
        self.messages.lock().iter().map(|m| m.kind).collect()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, message: BroadcastMessage) -> Result<(), BroadcastError> {
        if self.failing {
            return Err(BroadcastError::Unavailable("recording broadcaster set to fail".into()));
        }
        self.messages.lock().push(message);
        Ok(())
    }
}
