//! In-memory [`ScoreStore`].
//!
//! A batch is applied under one write lock with an undo log; the first
//! write that violates a store invariant rolls every earlier write of the
//! batch back before the lock is released, so readers never observe a
//! half-applied delivery.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ScoreStore, StorageResult, Write, WriteBatch};
use crate::error::StorageError;
use crate::models::{
    BattingScorecard, BowlingScorecard, DeliveryEvent, Innings, InningsId, Match, MatchId,
    MatchStatus, Partnership, PlayerId,
};

#[derive(Debug, Default)]
struct Tables {
    matches: HashMap<MatchId, Match>,
    match_order: Vec<MatchId>,
    innings: HashMap<InningsId, Innings>,
    innings_order: Vec<InningsId>,
    deliveries: HashMap<InningsId, Vec<DeliveryEvent>>,
    batting: HashMap<InningsId, Vec<BattingScorecard>>,
    bowling: HashMap<InningsId, Vec<BowlingScorecard>>,
    partnerships: HashMap<InningsId, Vec<Partnership>>,
}

enum Undo {
    Match { id: MatchId, previous: Option<Match> },
    Innings { id: InningsId, previous: Option<Innings> },
    Delivery { innings: InningsId },
    Batting { innings: InningsId, player: PlayerId, previous: Option<BattingScorecard> },
    Bowling { innings: InningsId, player: PlayerId, previous: Option<BowlingScorecard> },
    Partnership { innings: InningsId, index: usize, previous: Option<Partnership> },
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    injected_failures: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to [`ScoreStore::apply`] fail with
    /// [`StorageError::Unavailable`] before touching any table. Used to
    /// exercise rollback paths.
    pub fn fail_next_writes(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    pub fn delivery_count(&self) -> usize {
        self.tables.read().deliveries.values().map(Vec::len).sum()
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Tables {
    fn require_innings(&self, id: InningsId) -> StorageResult<()> {
        if self.innings.contains_key(&id) {
            Ok(())
        } else {
            Err(StorageError::Conflict(format!("innings {} does not exist", id)))
        }
    }

    fn apply_one(&mut self, write: Write, undo: &mut Vec<Undo>) -> StorageResult<()> {
        match write {
            Write::PutMatch(record) => {
                let id = record.id;
                let previous = self.matches.insert(id, record);
                if previous.is_none() {
                    self.match_order.push(id);
                }
                undo.push(Undo::Match { id, previous });
            }
            Write::PutInnings(innings) => {
                if !self.matches.contains_key(&innings.match_id) {
                    return Err(StorageError::Conflict(format!(
                        "match {} does not exist",
                        innings.match_id
                    )));
                }
                let duplicate = self.innings.values().any(|other| {
                    other.id != innings.id
                        && other.match_id == innings.match_id
                        && other.innings_number == innings.innings_number
                });
                if duplicate {
                    return Err(StorageError::Conflict(format!(
                        "innings {} already exists for match {}",
                        innings.innings_number, innings.match_id
                    )));
                }
                let id = innings.id;
                let previous = self.innings.insert(id, innings);
                if previous.is_none() {
                    self.innings_order.push(id);
                }
                undo.push(Undo::Innings { id, previous });
            }
            Write::AppendDelivery(delivery) => {
                self.require_innings(delivery.innings_id)?;
                let log = self.deliveries.entry(delivery.innings_id).or_default();
                if delivery.sequence as usize != log.len() {
                    return Err(StorageError::Conflict(format!(
                        "delivery sequence {} out of order for innings {} (next is {})",
                        delivery.sequence,
                        delivery.innings_id,
                        log.len()
                    )));
                }
                let innings = delivery.innings_id;
                log.push(delivery);
                undo.push(Undo::Delivery { innings });
            }
            Write::PutBatting(card) => {
                self.require_innings(card.innings_id)?;
                let (innings, player) = (card.innings_id, card.player_id);
                let cards = self.batting.entry(innings).or_default();
                let previous = match cards.iter_mut().find(|c| c.player_id == player) {
                    Some(slot) => Some(std::mem::replace(slot, card)),
                    None => {
                        cards.push(card);
                        None
                    }
                };
                undo.push(Undo::Batting { innings, player, previous });
            }
            Write::PutBowling(card) => {
                self.require_innings(card.innings_id)?;
                let (innings, player) = (card.innings_id, card.player_id);
                let cards = self.bowling.entry(innings).or_default();
                let previous = match cards.iter_mut().find(|c| c.player_id == player) {
                    Some(slot) => Some(std::mem::replace(slot, card)),
                    None => {
                        cards.push(card);
                        None
                    }
                };
                undo.push(Undo::Bowling { innings, player, previous });
            }
            Write::PutPartnership(partnership) => {
                self.require_innings(partnership.innings_id)?;
                let innings = partnership.innings_id;
                let index = partnership.wickets_fallen as usize;
                let stands = self.partnerships.entry(innings).or_default();
                if index > stands.len() {
                    return Err(StorageError::Conflict(format!(
                        "partnership {} skips ahead of {} existing in innings {}",
                        index,
                        stands.len(),
                        innings
                    )));
                }
                if partnership.is_active
                    && stands.iter().enumerate().any(|(i, p)| i != index && p.is_active)
                {
                    return Err(StorageError::Conflict(format!(
                        "innings {} already has an active partnership",
                        innings
                    )));
                }
                let previous = if index == stands.len() {
                    stands.push(partnership);
                    None
                } else {
                    Some(std::mem::replace(&mut stands[index], partnership))
                };
                undo.push(Undo::Partnership { innings, index, previous });
            }
        }
        Ok(())
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Match { id, previous } => match previous {
                    Some(old) => {
                        self.matches.insert(id, old);
                    }
                    None => {
                        self.matches.remove(&id);
                        self.match_order.retain(|m| *m != id);
                    }
                },
                Undo::Innings { id, previous } => match previous {
                    Some(old) => {
                        self.innings.insert(id, old);
                    }
                    None => {
                        self.innings.remove(&id);
                        self.innings_order.retain(|i| *i != id);
                    }
                },
                Undo::Delivery { innings } => {
                    if let Some(log) = self.deliveries.get_mut(&innings) {
                        log.pop();
                    }
                }
                Undo::Batting { innings, player, previous } => {
                    if let Some(cards) = self.batting.get_mut(&innings) {
                        restore_card(cards, previous, |c| c.player_id == player);
                    }
                }
                Undo::Bowling { innings, player, previous } => {
                    if let Some(cards) = self.bowling.get_mut(&innings) {
                        restore_card(cards, previous, |c| c.player_id == player);
                    }
                }
                Undo::Partnership { innings, index, previous } => {
                    if let Some(stands) = self.partnerships.get_mut(&innings) {
                        match previous {
                            Some(old) => stands[index] = old,
                            None => {
                                stands.truncate(index);
                            }
                        }
                    }
                }
            }
        }
    }

    fn remove_innings(&mut self, id: InningsId) -> bool {
        let existed = self.innings.remove(&id).is_some();
        self.innings_order.retain(|i| *i != id);
        self.deliveries.remove(&id);
        self.batting.remove(&id);
        self.bowling.remove(&id);
        self.partnerships.remove(&id);
        existed
    }
}

fn restore_card<T>(cards: &mut Vec<T>, previous: Option<T>, is_slot: impl Fn(&T) -> bool) {
    let position = cards.iter().position(&is_slot);
    match (position, previous) {
        (Some(i), Some(old)) => cards[i] = old,
        (Some(i), None) => {
            cards.remove(i);
        }
        (None, Some(old)) => cards.push(old),
        (None, None) => {}
    }
}

impl ScoreStore for MemoryStore {
    fn match_by_id(&self, id: MatchId) -> StorageResult<Option<Match>> {
        Ok(self.tables.read().matches.get(&id).cloned())
    }

    fn matches(&self, status: Option<MatchStatus>) -> StorageResult<Vec<Match>> {
        let tables = self.tables.read();
        Ok(tables
            .match_order
            .iter()
            .filter_map(|id| tables.matches.get(id))
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    fn innings_by_id(&self, id: InningsId) -> StorageResult<Option<Innings>> {
        Ok(self.tables.read().innings.get(&id).cloned())
    }

    fn innings_for_match(&self, match_id: MatchId) -> StorageResult<Vec<Innings>> {
        let tables = self.tables.read();
        let mut list: Vec<Innings> =
            tables.innings.values().filter(|i| i.match_id == match_id).cloned().collect();
        list.sort_by_key(|i| i.innings_number);
        Ok(list)
    }

    fn last_delivery(&self, innings: InningsId) -> StorageResult<Option<DeliveryEvent>> {
        Ok(self.tables.read().deliveries.get(&innings).and_then(|log| log.last().cloned()))
    }

    fn deliveries(&self, innings: InningsId) -> StorageResult<Vec<DeliveryEvent>> {
        Ok(self.tables.read().deliveries.get(&innings).cloned().unwrap_or_default())
    }

    fn deliveries_in_over(
        &self,
        innings: InningsId,
        over_number: u32,
    ) -> StorageResult<Vec<DeliveryEvent>> {
        let tables = self.tables.read();
        Ok(tables
            .deliveries
            .get(&innings)
            .map(|log| log.iter().filter(|d| d.over_number == over_number).cloned().collect())
            .unwrap_or_default())
    }

    fn deliveries_for_player(&self, player: PlayerId) -> StorageResult<Vec<DeliveryEvent>> {
        let tables = self.tables.read();
        let mut out = Vec::new();
        for innings in &tables.innings_order {
            let Some(log) = tables.deliveries.get(innings) else {
                continue;
            };
            out.extend(
                log.iter()
                    .filter(|d| {
                        d.striker == player
                            || d.bowler == player
                            || d.dismissed_player == Some(player)
                    })
                    .cloned(),
            );
        }
        Ok(out)
    }

    fn batting_card(
        &self,
        innings: InningsId,
        player: PlayerId,
    ) -> StorageResult<Option<BattingScorecard>> {
        let tables = self.tables.read();
        Ok(tables
            .batting
            .get(&innings)
            .and_then(|cards| cards.iter().find(|c| c.player_id == player).cloned()))
    }

    fn batting_cards(&self, innings: InningsId) -> StorageResult<Vec<BattingScorecard>> {
        Ok(self.tables.read().batting.get(&innings).cloned().unwrap_or_default())
    }

    fn bowling_card(
        &self,
        innings: InningsId,
        player: PlayerId,
    ) -> StorageResult<Option<BowlingScorecard>> {
        let tables = self.tables.read();
        Ok(tables
            .bowling
            .get(&innings)
            .and_then(|cards| cards.iter().find(|c| c.player_id == player).cloned()))
    }

    fn bowling_cards(&self, innings: InningsId) -> StorageResult<Vec<BowlingScorecard>> {
        Ok(self.tables.read().bowling.get(&innings).cloned().unwrap_or_default())
    }

    fn active_partnership(&self, innings: InningsId) -> StorageResult<Option<Partnership>> {
        let tables = self.tables.read();
        Ok(tables
            .partnerships
            .get(&innings)
            .and_then(|stands| stands.iter().find(|p| p.is_active).cloned()))
    }

    fn partnerships(&self, innings: InningsId) -> StorageResult<Vec<Partnership>> {
        Ok(self.tables.read().partnerships.get(&innings).cloned().unwrap_or_default())
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        if self.take_injected_failure() {
            return Err(StorageError::Unavailable("injected write failure".into()));
        }

        let mut tables = self.tables.write();
        let mut undo = Vec::with_capacity(batch.len());
        for write in batch.into_writes() {
            if let Err(err) = tables.apply_one(write, &mut undo) {
                tables.rollback(undo);
                log::warn!("Write batch rolled back: {}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    fn delete_innings(&self, id: InningsId) -> StorageResult<bool> {
        Ok(self.tables.write().remove_innings(id))
    }

    fn delete_match(&self, id: MatchId) -> StorageResult<bool> {
        let mut tables = self.tables.write();
        let Some(_) = tables.matches.remove(&id) else {
            return Ok(false);
        };
        tables.match_order.retain(|m| *m != id);
        let owned: Vec<InningsId> =
            tables.innings.values().filter(|i| i.match_id == id).map(|i| i.id).collect();
        for innings in owned {
            tables.remove_innings(innings);
        }
        Ok(true)
    }
}
