//! # Storage interface
//!
//! The engine never holds entity graphs; it asks the store typed questions
//! (by innings, by player, by match) and hands back a [`WriteBatch`] that
//! must be applied all-or-nothing.
//!
//! ## Invariants a store must uphold
//! - one innings per (match, innings_number)
//! - one batting and one bowling scorecard per (innings, player)
//! - deliveries of an innings are append-only and `sequence` is dense from 0
//! - at most one active partnership per innings
//! - deleting an innings removes its deliveries, scorecards and partnerships;
//!   deleting a match removes its innings the same way

mod memory;

pub use memory::MemoryStore;

use crate::error::StorageError;
use crate::models::{
    BattingScorecard, BowlingScorecard, DeliveryEvent, Innings, InningsId, Match, MatchId,
    MatchStatus, Partnership, PlayerId,
};

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A single staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    PutMatch(Match),
    PutInnings(Innings),
    AppendDelivery(DeliveryEvent),
    PutBatting(BattingScorecard),
    PutBowling(BowlingScorecard),
    /// Keyed by (innings, wickets_fallen).
    PutPartnership(Partnership),
}

/// Writes that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn put_match(&mut self, record: Match) -> &mut Self {
        self.push(Write::PutMatch(record))
    }

    pub fn put_innings(&mut self, innings: Innings) -> &mut Self {
        self.push(Write::PutInnings(innings))
    }

    pub fn append_delivery(&mut self, delivery: DeliveryEvent) -> &mut Self {
        self.push(Write::AppendDelivery(delivery))
    }

    pub fn put_batting(&mut self, card: BattingScorecard) -> &mut Self {
        self.push(Write::PutBatting(card))
    }

    pub fn put_bowling(&mut self, card: BowlingScorecard) -> &mut Self {
        self.push(Write::PutBowling(card))
    }

    pub fn put_partnership(&mut self, partnership: Partnership) -> &mut Self {
        self.push(Write::PutPartnership(partnership))
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Persistence seam of the scoring engine.
///
/// Reads return owned copies; nothing handed out aliases stored state.
pub trait ScoreStore: Send + Sync {
    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    fn match_by_id(&self, id: MatchId) -> StorageResult<Option<Match>>;

    /// Matches in creation order, optionally filtered by status.
    fn matches(&self, status: Option<MatchStatus>) -> StorageResult<Vec<Match>>;

    // ------------------------------------------------------------------
    // Innings
    // ------------------------------------------------------------------

    fn innings_by_id(&self, id: InningsId) -> StorageResult<Option<Innings>>;

    /// Innings of a match ordered by innings number.
    fn innings_for_match(&self, match_id: MatchId) -> StorageResult<Vec<Innings>>;

    // ------------------------------------------------------------------
    // Deliveries
    // ------------------------------------------------------------------

    fn last_delivery(&self, innings: InningsId) -> StorageResult<Option<DeliveryEvent>>;

    /// Full log of an innings in sequence order.
    fn deliveries(&self, innings: InningsId) -> StorageResult<Vec<DeliveryEvent>>;

    fn deliveries_in_over(
        &self,
        innings: InningsId,
        over_number: u32,
    ) -> StorageResult<Vec<DeliveryEvent>>;

    /// Deliveries on which the player batted, bowled or was dismissed, in
    /// innings creation order then sequence order.
    fn deliveries_for_player(&self, player: PlayerId) -> StorageResult<Vec<DeliveryEvent>>;

    // ------------------------------------------------------------------
    // Scorecards and partnerships
    // ------------------------------------------------------------------

    fn batting_card(
        &self,
        innings: InningsId,
        player: PlayerId,
    ) -> StorageResult<Option<BattingScorecard>>;

    fn batting_cards(&self, innings: InningsId) -> StorageResult<Vec<BattingScorecard>>;

    fn bowling_card(
        &self,
        innings: InningsId,
        player: PlayerId,
    ) -> StorageResult<Option<BowlingScorecard>>;

    fn bowling_cards(&self, innings: InningsId) -> StorageResult<Vec<BowlingScorecard>>;

    fn active_partnership(&self, innings: InningsId) -> StorageResult<Option<Partnership>>;

    /// Partnerships ordered by wickets_fallen.
    fn partnerships(&self, innings: InningsId) -> StorageResult<Vec<Partnership>>;

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Apply every write or none of them.
    fn apply(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Remove an innings with its deliveries, scorecards and partnerships.
    fn delete_innings(&self, id: InningsId) -> StorageResult<bool>;

    /// Remove a match and, by cascade, all of its innings.
    fn delete_match(&self, id: MatchId) -> StorageResult<bool>;
}
