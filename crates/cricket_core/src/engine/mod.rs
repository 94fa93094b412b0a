//! # Scoring engine
//!
//! [`Scorer`] is the only writer. Each operation reads what it needs from
//! the [`ScoreStore`], stages every effect into one [`WriteBatch`] and
//! commits it in a single `apply`; live updates go out only after the
//! commit succeeded and the locks are released.
//!
//! ## Serialization
//! - deliveries and manual closes of an innings hold that innings's lock
//! - toss, innings start and abandonment hold the match lock
//! - the delivery path takes innings then match, never the reverse
//!
//! ```rust
//! use std::sync::Arc;
//! use cricket_core::config::ScoringConfig;
//! use cricket_core::engine::{Scorer, ScoringContext};
//! use cricket_core::models::{DeliveryInput, NewMatch, PlayerId, TeamId, TossDecision};
//! use cricket_core::registry::MemoryRegistry;
//!
//! let registry = Arc::new(MemoryRegistry::new());
//! let config = ScoringConfig { require_registered_players: false, ..ScoringConfig::default() };
//! let scorer = Scorer::new(ScoringContext::in_memory(registry, config));
//!
//! let fixture = scorer.create_match(NewMatch::t20(TeamId(1), TeamId(2))).unwrap();
//! scorer.record_toss(fixture.id, Some(TeamId(1)), Some(TossDecision::Bat)).unwrap();
//! let innings = scorer.start_innings(fixture.id, 1, TeamId(1), TeamId(2)).unwrap();
//!
//! let ball = DeliveryInput::new(innings.id, PlayerId(1), PlayerId(2), PlayerId(11)).with_runs(4);
//! let outcome = scorer.record_delivery(ball).unwrap();
//! assert_eq!(outcome.delivery.over_display(), "1.1");
//! assert_eq!(outcome.innings.total_runs, 4);
//! ```

pub mod aggregator;
pub mod innings;
mod locks;
pub mod match_flow;
pub mod partnership;
pub mod sequencer;

#[cfg(test)]
mod tests;

pub use locks::KeyedLocks;
pub use sequencer::ExpectedStrike;

use serde::Serialize;
use std::sync::Arc;

use crate::broadcast::{self, BroadcastKind, BroadcastMessage, Broadcaster, NullBroadcaster};
use crate::commentary;
use crate::config::{ScoringConfig, StrikePolicy};
use crate::error::{DomainError, Result, ValidationError};
use crate::models::{
    BattingScorecard, BowlingScorecard, DeliveryEvent, DeliveryInput, Innings, InningsCompletion,
    InningsId, InningsSummary, Match, MatchId, MatchResult, MatchStatus, NewMatch, Partnership,
    PlayerId, TeamId, TossDecision,
};
use crate::registry::Registry;
use crate::stats::StatisticsView;
use crate::storage::{MemoryStore, ScoreStore, WriteBatch};

/// Everything the engine talks to, passed in rather than looked up.
#[derive(Clone)]
pub struct ScoringContext {
    pub store: Arc<dyn ScoreStore>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub registry: Arc<dyn Registry>,
    pub config: ScoringConfig,
}

impl ScoringContext {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        broadcaster: Arc<dyn Broadcaster>,
        registry: Arc<dyn Registry>,
        config: ScoringConfig,
    ) -> Self {
        Self { store, broadcaster, registry, config }
    }

    /// Fresh [`MemoryStore`], no live updates.
    pub fn in_memory(registry: Arc<dyn Registry>, config: ScoringConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(NullBroadcaster), registry, config)
    }
}

/// Everything a scorer's screen needs after one ball.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub delivery: DeliveryEvent,
    pub innings: InningsSummary,
    /// Striker's card after this ball.
    pub batting: BattingScorecard,
    pub bowling: BowlingScorecard,
    pub partnership: Partnership,
    pub innings_completed: bool,
    /// Set when this ball decided the match.
    pub match_result: Option<MatchResult>,
}

#[derive(Serialize)]
struct BallUpdate<'a> {
    delivery: &'a DeliveryEvent,
    over: String,
    commentary: String,
}

#[derive(Serialize)]
struct StatusUpdate {
    status: MatchStatus,
    result: Option<MatchResult>,
}

pub struct Scorer {
    ctx: ScoringContext,
    innings_locks: KeyedLocks<InningsId>,
    match_locks: KeyedLocks<MatchId>,
}

impl Scorer {
    pub fn new(ctx: ScoringContext) -> Self {
        Self { ctx, innings_locks: KeyedLocks::new(), match_locks: KeyedLocks::new() }
    }

    pub fn context(&self) -> &ScoringContext {
        &self.ctx
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.ctx.config
    }

    /// Read-only statistics over the same store.
    pub fn stats(&self) -> StatisticsView<'_> {
        StatisticsView::new(self.ctx.store.as_ref(), self.ctx.registry.as_ref(), &self.ctx.config)
    }

    // ------------------------------------------------------------------
    // Match lifecycle
    // ------------------------------------------------------------------

    pub fn create_match(&self, new: NewMatch) -> Result<Match> {
        if new.team_1 == new.team_2 {
            return Err(DomainError::SameTeam(new.team_1).into());
        }
        self.check_team(new.team_1)?;
        self.check_team(new.team_2)?;

        let record = Match::from_new(new);
        let mut batch = WriteBatch::new();
        batch.put_match(record.clone());
        self.ctx.store.apply(batch)?;

        log::info!(
            "Match {} created: {} vs {} ({:?}, over limit {:?})",
            record.id,
            self.ctx.registry.team_name(record.team_1),
            self.ctx.registry.team_name(record.team_2),
            record.match_type,
            record.over_limit
        );
        Ok(record)
    }

    /// Record the toss once. Input naming a team outside the match, or no
    /// decision, is handled by [`crate::config::TossPolicy`].
    pub fn record_toss(
        &self,
        match_id: MatchId,
        winner: Option<TeamId>,
        decision: Option<TossDecision>,
    ) -> Result<Match> {
        let slot = self.match_locks.slot(match_id);
        let _guard = slot.lock();

        let mut record = self.load_match(match_id)?;
        if record.status.is_closed() {
            return Err(DomainError::MatchClosed { match_id, status: record.status }.into());
        }
        if record.toss.is_some() {
            return Err(DomainError::TossAlreadyRecorded(match_id).into());
        }

        let toss = match_flow::resolve_toss(
            &record,
            winner,
            decision,
            self.ctx.config.toss_policy,
            &mut rand::thread_rng(),
        )?;
        if Some(toss.winner) != winner || Some(toss.decision) != decision {
            log::warn!(
                "Toss input for match {} replaced: {:?}/{:?} -> {}/{:?}",
                match_id,
                winner,
                decision,
                toss.winner,
                toss.decision
            );
        }
        record.toss = Some(toss);
        record.touch();

        let mut batch = WriteBatch::new();
        batch.put_match(record.clone());
        self.ctx.store.apply(batch)?;

        log::info!(
            "Toss for match {}: {} won and chose to {:?}",
            match_id,
            self.ctx.registry.team_name(toss.winner),
            toss.decision
        );
        Ok(record)
    }

    pub fn start_innings(
        &self,
        match_id: MatchId,
        innings_number: u8,
        batting_team: TeamId,
        bowling_team: TeamId,
    ) -> Result<Innings> {
        if innings_number == 0 || innings_number > match_flow::MAX_INNINGS {
            return Err(ValidationError::InvalidInningsNumber { number: innings_number }.into());
        }

        let slot = self.match_locks.slot(match_id);
        let guard = slot.lock();

        let mut record = self.load_match(match_id)?;
        if record.status.is_closed() {
            return Err(DomainError::MatchClosed { match_id, status: record.status }.into());
        }
        if batting_team == bowling_team {
            return Err(DomainError::SameTeam(batting_team).into());
        }
        for team in [batting_team, bowling_team] {
            if !record.involves(team) {
                return Err(DomainError::TeamNotInMatch { match_id, team }.into());
            }
        }

        let existing = self.ctx.store.innings_for_match(match_id)?;
        if existing.iter().any(|i| i.innings_number == innings_number) {
            return Err(DomainError::DuplicateInnings { match_id, number: innings_number }.into());
        }
        if innings_number > 1 {
            let previous = innings_number - 1;
            let closed = existing
                .iter()
                .any(|i| i.innings_number == previous && i.is_completed);
            if !closed {
                return Err(DomainError::PreviousInningsOpen { number: innings_number, previous }.into());
            }
        }

        // Test innings 2 is not a chase.
        let target = if innings_number == 2 && record.match_type.is_single_innings_per_side() {
            existing.iter().find(|i| i.innings_number == 1).map(match_flow::target_for)
        } else {
            None
        };
        let innings = Innings::new(match_id, innings_number, batting_team, bowling_team, target);

        let mut batch = WriteBatch::new();
        batch.put_innings(innings.clone());
        let went_live = record.status == MatchStatus::Scheduled;
        if went_live {
            match_flow::transition(&mut record, MatchStatus::Live)?;
            batch.put_match(record.clone());
        }
        self.ctx.store.apply(batch)?;
        drop(guard);

        log::info!(
            "Innings {} of match {} started: {} batting{}",
            innings_number,
            match_id,
            self.ctx.registry.team_name(batting_team),
            target.map(|t| format!(", target {}", t)).unwrap_or_default()
        );
        if went_live {
            self.publish(
                match_id,
                BroadcastKind::MatchStatus,
                &StatusUpdate { status: record.status, result: None },
            );
        }
        Ok(innings)
    }

    /// Scheduled or live match to abandoned.
    pub fn abandon_match(&self, match_id: MatchId) -> Result<Match> {
        let slot = self.match_locks.slot(match_id);
        let guard = slot.lock();

        let mut record = self.load_match(match_id)?;
        match_flow::transition(&mut record, MatchStatus::Abandoned)?;

        let mut batch = WriteBatch::new();
        batch.put_match(record.clone());
        self.ctx.store.apply(batch)?;

        drop(guard);
        drop(slot);
        self.match_locks.release(match_id);

        log::info!("Match {} abandoned", match_id);
        self.publish(
            match_id,
            BroadcastKind::MatchStatus,
            &StatusUpdate { status: record.status, result: None },
        );
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Deliveries
    // ------------------------------------------------------------------

    pub fn record_delivery(&self, input: DeliveryInput) -> Result<DeliveryOutcome> {
        sequencer::validate_input(&input)?;

        let innings_slot = self.innings_locks.slot(input.innings_id);
        let innings_guard = innings_slot.lock();

        let mut innings = self.load_innings(input.innings_id)?;
        if innings.is_completed {
            log::warn!("Rejected delivery for completed innings {}", innings.id);
            return Err(DomainError::InningsCompleted(innings.id).into());
        }

        let match_slot = self.match_locks.slot(innings.match_id);
        let match_guard = match_slot.lock();

        let mut record = self.load_match(innings.match_id)?;
        if record.status.is_closed() {
            return Err(DomainError::MatchClosed { match_id: record.id, status: record.status }.into());
        }
        self.check_players(&input)?;

        let store = self.ctx.store.as_ref();
        let previous = store.last_delivery(innings.id)?;
        if self.ctx.config.strike_policy == StrikePolicy::Enforce {
            ExpectedStrike::after(previous.as_ref()).check(input.striker, input.non_striker)?;
        }

        let position = sequencer::next_position(previous.as_ref());
        let sequence = previous.as_ref().map_or(0, |p| p.sequence + 1);
        let delivery = sequencer::sequence(&input, position, sequence);

        let mut batch = WriteBatch::new();
        batch.append_delivery(delivery.clone());

        // Batting: striker, plus the non-striker's card if they were the one out.
        let mut cards_in_innings = None;
        let mut batting = match store.batting_card(innings.id, delivery.striker)? {
            Some(card) => card,
            None => {
                let count = store.batting_cards(innings.id)?.len() as u32;
                cards_in_innings = Some(count + 1);
                BattingScorecard::new(innings.id, delivery.striker, count + 1)
            }
        };
        aggregator::apply_batting(&mut batting, &delivery);
        batch.put_batting(batting.clone());

        if delivery.is_wicket
            && delivery.dismissed_player == Some(delivery.non_striker)
            && delivery.non_striker != delivery.striker
        {
            let mut card = match store.batting_card(innings.id, delivery.non_striker)? {
                Some(card) => card,
                None => {
                    let count = match cards_in_innings {
                        Some(count) => count,
                        None => store.batting_cards(innings.id)?.len() as u32,
                    };
                    BattingScorecard::new(innings.id, delivery.non_striker, count + 1)
                }
            };
            aggregator::apply_dismissal(&mut card, &delivery);
            batch.put_batting(card);
        }

        let mut bowling = store
            .bowling_card(innings.id, delivery.bowler)?
            .unwrap_or_else(|| BowlingScorecard::new(innings.id, delivery.bowler));
        aggregator::apply_bowling(&mut bowling, &delivery);
        batch.put_bowling(bowling.clone());

        let active = store.active_partnership(innings.id)?;
        let existing = match active {
            Some(_) => 0,
            None => store.partnerships(innings.id)?.len() as u32,
        };
        let mut stand = partnership::current_or_open(active, existing, &delivery);
        partnership::apply(&mut stand, &delivery);
        batch.put_partnership(stand.clone());

        innings::apply_delivery(&mut innings, &delivery);
        let completion = innings::completion_after(&innings, record.over_limit);
        if let Some(reason) = completion {
            innings::close(&mut innings, reason);
        }
        batch.put_innings(innings.clone());

        let match_result = match completion {
            Some(_) => self.settle_match(&mut record, &innings, &mut batch)?,
            None => None,
        };

        if let Err(err) = store.apply(batch) {
            log::warn!("Delivery for innings {} not recorded: {}", innings.id, err);
            return Err(err.into());
        }

        log::debug!(
            "Innings {} ball {} (seq {}): {} run(s), total {}/{}",
            innings.id,
            delivery.over_display(),
            delivery.sequence,
            delivery.total_runs(),
            innings.total_runs,
            innings.total_wickets
        );

        drop(match_guard);
        drop(match_slot);
        drop(innings_guard);
        drop(innings_slot);
        if completion.is_some() {
            self.innings_locks.release(innings.id);
        }
        if match_result.is_some() {
            self.match_locks.release(record.id);
        }

        let summary = innings.summary(record.over_limit);
        self.announce_delivery(&record, &delivery, &summary, completion, match_result);

        Ok(DeliveryOutcome {
            delivery,
            innings: summary,
            batting,
            bowling,
            partnership: stand,
            innings_completed: completion.is_some(),
            match_result,
        })
    }

    /// Close an open innings by the scorer's decision (declaration, forfeit,
    /// weather). Returns the closed innings and the match result, if this
    /// close decided it.
    pub fn complete_innings(&self, innings_id: InningsId) -> Result<(Innings, Option<MatchResult>)> {
        let innings_slot = self.innings_locks.slot(innings_id);
        let innings_guard = innings_slot.lock();

        let mut innings = self.load_innings(innings_id)?;
        if innings.is_completed {
            return Err(DomainError::InningsCompleted(innings_id).into());
        }

        let match_slot = self.match_locks.slot(innings.match_id);
        let match_guard = match_slot.lock();

        let mut record = self.load_match(innings.match_id)?;
        if record.status.is_closed() {
            return Err(DomainError::MatchClosed { match_id: record.id, status: record.status }.into());
        }

        innings::close(&mut innings, InningsCompletion::Closed);
        let mut batch = WriteBatch::new();
        batch.put_innings(innings.clone());
        let result = self.settle_match(&mut record, &innings, &mut batch)?;
        self.ctx.store.apply(batch)?;

        drop(match_guard);
        drop(match_slot);
        drop(innings_guard);
        drop(innings_slot);
        self.innings_locks.release(innings_id);
        if result.is_some() {
            self.match_locks.release(record.id);
        }

        let summary = innings.summary(record.over_limit);
        log::info!("Innings {} closed by scorer at {}", innings_id, summary.scoreline());
        self.publish(record.id, BroadcastKind::InningsComplete, &summary);
        if let Some(result) = result {
            self.announce_result(&record, result);
        }
        Ok((innings, result))
    }

    // ------------------------------------------------------------------
    // Engine view of the crease
    // ------------------------------------------------------------------

    /// Who the engine expects to face the next delivery.
    pub fn expected_strike(&self, innings_id: InningsId) -> Result<ExpectedStrike> {
        let innings = self.load_innings(innings_id)?;
        let previous = self.ctx.store.last_delivery(innings.id)?;
        Ok(ExpectedStrike::after(previous.as_ref()))
    }

    /// Batters known to be at the crease, striker first.
    pub fn current_batsmen(&self, innings_id: InningsId) -> Result<Vec<PlayerId>> {
        Ok(self.expected_strike(innings_id)?.batsmen())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn load_match(&self, id: MatchId) -> Result<Match> {
        Ok(self.ctx.store.match_by_id(id)?.ok_or(DomainError::MatchNotFound(id))?)
    }

    fn load_innings(&self, id: InningsId) -> Result<Innings> {
        Ok(self.ctx.store.innings_by_id(id)?.ok_or(DomainError::InningsNotFound(id))?)
    }

    fn check_team(&self, team: TeamId) -> Result<()> {
        if self.ctx.config.require_registered_players && self.ctx.registry.team(team).is_none() {
            return Err(DomainError::UnknownTeam(team).into());
        }
        Ok(())
    }

    fn check_players(&self, input: &DeliveryInput) -> Result<()> {
        if !self.ctx.config.require_registered_players {
            return Ok(());
        }
        let named = [Some(input.striker), Some(input.non_striker), Some(input.bowler)];
        let optional = [input.dismissed_player, input.fielder];
        for player in named.into_iter().chain(optional).flatten() {
            if self.ctx.registry.player(player).is_none() {
                return Err(DomainError::UnknownPlayer(player).into());
            }
        }
        Ok(())
    }

    /// Stage the match result if `closed` finished the match.
    fn settle_match(
        &self,
        record: &mut Match,
        closed: &Innings,
        batch: &mut WriteBatch,
    ) -> Result<Option<MatchResult>> {
        let mut all = self.ctx.store.innings_for_match(record.id)?;
        if let Some(slot) = all.iter_mut().find(|i| i.id == closed.id) {
            *slot = closed.clone();
        }
        let Some(result) = match_flow::evaluate_result(record, &all) else {
            return Ok(None);
        };
        match_flow::transition(record, MatchStatus::Completed)?;
        record.result = Some(result);
        batch.put_match(record.clone());
        Ok(Some(result))
    }

    fn announce_delivery(
        &self,
        record: &Match,
        delivery: &DeliveryEvent,
        summary: &InningsSummary,
        completion: Option<InningsCompletion>,
        result: Option<MatchResult>,
    ) {
        let update = BallUpdate {
            delivery,
            over: delivery.over_display(),
            commentary: commentary::describe(delivery, self.ctx.registry.as_ref()),
        };
        self.publish(record.id, BroadcastKind::BallUpdate, &update);
        self.publish(record.id, BroadcastKind::ScoreUpdate, summary);

        if let Some(reason) = completion {
            log::info!(
                "Innings {} completed ({:?}) at {}",
                summary.innings_number,
                reason,
                summary.scoreline()
            );
            self.publish(record.id, BroadcastKind::InningsComplete, summary);
        }
        if let Some(result) = result {
            self.announce_result(record, result);
        }
    }

    fn announce_result(&self, record: &Match, result: MatchResult) {
        match result.winner {
            Some(team) => log::info!(
                "Match {} completed: {} won {}",
                record.id,
                self.ctx.registry.team_name(team),
                result.margin
            ),
            None => log::info!("Match {} completed: {}", record.id, result.margin),
        }
        self.publish(
            record.id,
            BroadcastKind::MatchStatus,
            &StatusUpdate { status: record.status, result: Some(result) },
        );
    }

    /// Best-effort publish; the score is already committed.
    fn publish<T: Serialize>(&self, match_id: MatchId, kind: BroadcastKind, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("Could not encode {:?} for {}: {}", kind, broadcast::room(match_id), err);
                return;
            }
        };
        if let Err(err) = self.ctx.broadcaster.publish(BroadcastMessage::new(match_id, kind, payload)) {
            log::warn!("Broadcast {:?} to {} failed: {}", kind, broadcast::room(match_id), err);
        }
    }
}
