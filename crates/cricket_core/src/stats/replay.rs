//! Rebuild an innings from its delivery log.
//!
//! The replay runs the same aggregation functions as the live write path,
//! so for an untouched store [`StatisticsView::verify_innings`] reports no
//! differences. A difference means a row was written outside the engine.

use serde::Serialize;

use super::StatisticsView;
use crate::engine::{aggregator, innings as innings_rules, partnership};
use crate::error::Result;
use crate::models::{
    BattingScorecard, BowlingScorecard, DeliveryEvent, Innings, InningsId, Partnership, PlayerId,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InningsLedger {
    pub innings_id: InningsId,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub legal_balls: u32,
    pub extras: u32,
    /// In batting order.
    pub batting: Vec<BattingScorecard>,
    /// In order of first delivery bowled.
    pub bowling: Vec<BowlingScorecard>,
    /// Ordered by wickets fallen.
    pub partnerships: Vec<Partnership>,
}

impl InningsLedger {
    pub fn replay(base: &Innings, deliveries: &[DeliveryEvent]) -> Self {
        let mut totals = Innings::new(
            base.match_id,
            base.innings_number,
            base.batting_team,
            base.bowling_team,
            base.target,
        );
        totals.id = base.id;

        let mut batting: Vec<BattingScorecard> = Vec::new();
        let mut bowling: Vec<BowlingScorecard> = Vec::new();
        let mut partnerships: Vec<Partnership> = Vec::new();

        for d in deliveries {
            let striker = card_index(&mut batting, base.id, d.striker);
            aggregator::apply_batting(&mut batting[striker], d);
            if d.is_wicket && d.dismissed_player == Some(d.non_striker) && d.non_striker != d.striker {
                let other = card_index(&mut batting, base.id, d.non_striker);
                aggregator::apply_dismissal(&mut batting[other], d);
            }

            let bowler = match bowling.iter().position(|c| c.player_id == d.bowler) {
                Some(i) => i,
                None => {
                    bowling.push(BowlingScorecard::new(base.id, d.bowler));
                    bowling.len() - 1
                }
            };
            aggregator::apply_bowling(&mut bowling[bowler], d);

            let active = partnerships.iter().position(|p| p.is_active);
            let stand = match active {
                Some(i) => i,
                None => {
                    let opened = partnership::current_or_open(None, partnerships.len() as u32, d);
                    partnerships.push(opened);
                    partnerships.len() - 1
                }
            };
            partnership::apply(&mut partnerships[stand], d);

            innings_rules::apply_delivery(&mut totals, d);
        }

        Self {
            innings_id: base.id,
            total_runs: totals.total_runs,
            total_wickets: totals.total_wickets,
            legal_balls: totals.legal_balls,
            extras: totals.extras,
            batting,
            bowling,
            partnerships,
        }
    }
}

fn card_index(
    cards: &mut Vec<BattingScorecard>,
    innings: InningsId,
    player: PlayerId,
) -> usize {
    match cards.iter().position(|c| c.player_id == player) {
        Some(i) => i,
        None => {
            let position = cards.len() as u32 + 1;
            cards.push(BattingScorecard::new(innings, player, position));
            cards.len() - 1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub innings_id: InningsId,
    pub deliveries: usize,
    pub mismatches: Vec<String>,
}

impl VerificationReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl<'a> StatisticsView<'a> {
    pub fn replay_innings(&self, innings_id: InningsId) -> Result<InningsLedger> {
        let innings = self.innings(innings_id)?;
        Ok(InningsLedger::replay(&innings, &self.store.deliveries(innings_id)?))
    }

    /// Compare stored totals, scorecards and partnerships with a replay.
    pub fn verify_innings(&self, innings_id: InningsId) -> Result<VerificationReport> {
        let innings = self.innings(innings_id)?;
        let log = self.store.deliveries(innings_id)?;
        let ledger = InningsLedger::replay(&innings, &log);
        let mut mismatches = Vec::new();

        let totals = [
            ("total_runs", innings.total_runs, ledger.total_runs),
            ("total_wickets", innings.total_wickets, ledger.total_wickets),
            ("legal_balls", innings.legal_balls, ledger.legal_balls),
            ("extras", innings.extras, ledger.extras),
        ];
        for (field, stored, replayed) in totals {
            if stored != replayed {
                mismatches.push(format!("innings {}: stored {}, replayed {}", field, stored, replayed));
            }
        }

        let mut stored_batting = self.store.batting_cards(innings_id)?;
        stored_batting.sort_by_key(|c| c.batting_position);
        compare_rows("batting card", &stored_batting, &ledger.batting, |c| c.player_id, &mut mismatches);

        let stored_bowling = self.store.bowling_cards(innings_id)?;
        compare_rows("bowling card", &stored_bowling, &ledger.bowling, |c| c.player_id, &mut mismatches);

        let stored_stands = self.store.partnerships(innings_id)?;
        compare_rows("partnership", &stored_stands, &ledger.partnerships, |p| p.wickets_fallen, &mut mismatches);

        if !mismatches.is_empty() {
            log::warn!("Innings {} differs from its log in {} place(s)", innings_id, mismatches.len());
        }
        Ok(VerificationReport { innings_id, deliveries: log.len(), mismatches })
    }
}

fn compare_rows<T, K>(
    label: &str,
    stored: &[T],
    replayed: &[T],
    key: impl Fn(&T) -> K,
    mismatches: &mut Vec<String>,
) where
    T: PartialEq,
    K: PartialEq + std::fmt::Display,
{
    for row in replayed {
        match stored.iter().find(|s| key(*s) == key(row)) {
            Some(s) if s == row => {}
            Some(_) => mismatches.push(format!("{} {} differs from replay", label, key(row))),
            None => mismatches.push(format!("{} {} missing from store", label, key(row))),
        }
    }
    for row in stored {
        if !replayed.iter().any(|r| key(r) == key(row)) {
            mismatches.push(format!("{} {} has no deliveries", label, key(row)));
        }
    }
}
