//! # Statistics view
//!
//! Read-only queries over the committed log and the incrementally kept
//! rows. Nothing in this module writes to the store.
//!
//! - [`scorecards`]: batting/bowling cards, overs, partnerships, match snapshots
//! - [`career`]: career aggregates re-derived from every delivery a player was in
//! - [`form`]: consistency and weighted recent form
//! - [`replay`]: rebuild an innings from its log and compare with stored rows

pub mod career;
pub mod form;
pub mod replay;
pub mod scorecards;


pub use career::{BattingCareer, BowlingCareer, Figures, PlayerCareer, PlayerInnings};
pub use form::{ConsistencyReport, RecentForm, SeriesStats};
pub use replay::{InningsLedger, VerificationReport};
pub use scorecards::{
    BattingLine, BowlingLine, InningsReport, MatchSummary, OverSummary, PartnershipLine,
};

use crate::config::ScoringConfig;
use crate::error::{DomainError, Result};
use crate::models::{Innings, InningsId, Match, MatchId};
use crate::registry::Registry;
use crate::storage::ScoreStore;

/// Borrowed view; cheap to build per request.
#[derive(Clone, Copy)]
pub struct StatisticsView<'a> {
    store: &'a dyn ScoreStore,
    registry: &'a dyn Registry,
    config: &'a ScoringConfig,
}

impl<'a> StatisticsView<'a> {
    pub fn new(store: &'a dyn ScoreStore, registry: &'a dyn Registry, config: &'a ScoringConfig) -> Self {
        Self { store, registry, config }
    }

    fn innings(&self, id: InningsId) -> Result<Innings> {
        Ok(self.store.innings_by_id(id)?.ok_or(DomainError::InningsNotFound(id))?)
    }

    fn fixture(&self, id: MatchId) -> Result<Match> {
        Ok(self.store.match_by_id(id)?.ok_or(DomainError::MatchNotFound(id))?)
    }
}
