//! Batting and bowling scorecard updates for a single delivery.
//!
//! These functions are shared by the live write path and by
//! [`crate::stats::replay`], so an incrementally maintained card and one
//! rebuilt from the log cannot drift apart.

use crate::models::{
    overs_from_balls, BattingScorecard, BowlingScorecard, DeliveryEvent, ExtraType,
    BALLS_PER_OVER,
};

/// Credit a delivery to the striker's card.
pub fn apply_batting(card: &mut BattingScorecard, delivery: &DeliveryEvent) {
    if delivery.is_legal_delivery {
        card.balls_faced += 1;
    }
    card.runs += delivery.runs_scored;
    match delivery.runs_scored {
        0 => card.dots += 1,
        4 => card.fours += 1,
        6 => card.sixes += 1,
        _ => {}
    }
    card.strike_rate = if card.balls_faced > 0 {
        card.runs as f64 / card.balls_faced as f64 * 100.0
    } else {
        0.0
    };

    if delivery.is_wicket && delivery.dismissed_player == Some(card.player_id) {
        apply_dismissal(card, delivery);
    }
}

/// Record how the card's batter got out. Nothing else on the card changes.
pub fn apply_dismissal(card: &mut BattingScorecard, delivery: &DeliveryEvent) {
    card.is_out = true;
    card.dismissal_type = delivery.wicket_type;
    card.dismissed_by = Some(delivery.bowler);
    card.fielder = delivery.fielder;
}

/// Charge a delivery to the bowler's card.
///
/// Every extra is charged to the bowler, byes and leg-byes included.
pub fn apply_bowling(card: &mut BowlingScorecard, delivery: &DeliveryEvent) {
    let total = delivery.total_runs();

    card.runs_conceded += total;
    card.extras_conceded += delivery.extra_runs;
    match delivery.extra_type {
        Some(ExtraType::Wide) => card.wides += 1,
        Some(ExtraType::NoBall) => card.no_balls += 1,
        _ => {}
    }
    if delivery.runs_scored == 0 && delivery.extra_runs == 0 {
        card.dots += 1;
    }
    if delivery.is_wicket {
        card.wickets_taken += 1;
        card.current_over_wickets += 1;
    }
    card.current_over_runs += total;

    if delivery.is_legal_delivery {
        card.balls_bowled += 1;
        if card.balls_bowled % BALLS_PER_OVER == 0 {
            if card.current_over_runs == 0 && card.current_over_wickets == 0 {
                card.maidens += 1;
            }
            card.current_over_runs = 0;
            card.current_over_wickets = 0;
        }
    }

    card.overs_bowled = overs_from_balls(card.balls_bowled);
    refresh_bowling_rates(card);
}

/// Rates are stored unrounded; economy divides by the overs as written
/// (1.1 for seven balls), not by the decimal fraction of overs.
fn refresh_bowling_rates(card: &mut BowlingScorecard) {
    card.economy_rate = if card.overs_bowled > 0.0 {
        card.runs_conceded as f64 / card.overs_bowled
    } else {
        0.0
    };
    if card.wickets_taken > 0 {
        card.bowling_average = card.runs_conceded as f64 / card.wickets_taken as f64;
        card.strike_rate = card.balls_bowled as f64 / card.wickets_taken as f64;
    } else {
        card.bowling_average = 0.0;
        card.strike_rate = 0.0;
    }
}
