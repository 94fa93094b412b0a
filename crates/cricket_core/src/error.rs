use thiserror::Error;

use crate::models::{InningsId, MatchId, MatchStatus, PlayerId, TeamId};

/// Malformed input. Normally caught by the caller's schema layer; the engine
/// re-checks the few rules it depends on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Runs must be between 0 and 7, got {runs}")]
    RunsOutOfRange { runs: i32 },

    #[error("Extras must be 0 or more, got {extras}")]
    NegativeExtras { extras: i32 },

    #[error("wicket_type is required when is_wicket is true")]
    MissingWicketType,

    #[error("Innings number must be between 1 and 4, got {number}")]
    InvalidInningsNumber { number: u8 },
}

/// The request is well-formed but breaks a scoring rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),

    #[error("Innings {0} not found")]
    InningsNotFound(InningsId),

    #[error("Cannot record ball in completed innings {0}")]
    InningsCompleted(InningsId),

    #[error("Innings {number} already exists for match {match_id}")]
    DuplicateInnings { match_id: MatchId, number: u8 },

    #[error("Innings {number} cannot start before innings {previous} is completed")]
    PreviousInningsOpen { number: u8, previous: u8 },

    #[error("Team cannot play against itself: {0}")]
    SameTeam(TeamId),

    #[error("Unknown team {0}")]
    UnknownTeam(TeamId),

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Team {team} is not playing in match {match_id}")]
    TeamNotInMatch { match_id: MatchId, team: TeamId },

    #[error("Match {match_id} is {status}")]
    MatchClosed { match_id: MatchId, status: MatchStatus },

    #[error("Toss already recorded for match {0}")]
    TossAlreadyRecorded(MatchId),

    #[error("Invalid toss input for match {match_id}: {reason}")]
    InvalidToss { match_id: MatchId, reason: String },

    #[error("Strike mismatch: expected {expected}, got striker {striker} / non-striker {non_striker}")]
    StrikeMismatch { expected: String, striker: PlayerId, non_striker: PlayerId },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: MatchStatus, to: MatchStatus },
}

/// The backing store refused or failed a read or commit. Nothing was applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupted data: {0}")]
    Corrupted(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ScoringError {
    /// Storage failures roll back the whole update, so the identical request
    /// can be sent again. Validation and domain errors will fail the same way.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScoringError::Storage(StorageError::Corrupted(_)) => false,
            ScoringError::Storage(_) => true,
            ScoringError::Validation(_) | ScoringError::Domain(_) => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ScoringError::Validation(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ScoringError::Domain(_))
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_only_for_storage() {
        let storage: ScoringError = StorageError::Unavailable("down".into()).into();
        assert!(storage.is_retryable());

        let corrupted: ScoringError = StorageError::Corrupted("bad row".into()).into();
        assert!(!corrupted.is_retryable());

        let domain: ScoringError = DomainError::InningsCompleted(InningsId::new()).into();
        assert!(!domain.is_retryable());
        assert!(domain.is_domain());

        let validation: ScoringError = ValidationError::RunsOutOfRange { runs: 9 }.into();
        assert!(!validation.is_retryable());
        assert!(validation.is_validation());
    }

    #[test]
    fn test_messages() {
        let err = ValidationError::RunsOutOfRange { runs: 8 };
        assert_eq!(err.to_string(), "Runs must be between 0 and 7, got 8");
        let err = DomainError::SameTeam(TeamId(3));
        assert_eq!(err.to_string(), "Team cannot play against itself: team#3");
    }
}
