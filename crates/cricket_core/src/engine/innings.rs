//! Innings totals and completion.
//!
//! An innings is open until one of the completion checks fires or the
//! scorer closes it; completed is terminal.

use chrono::Utc;

use crate::models::{overs_from_balls, DeliveryEvent, Innings, InningsCompletion};

pub const WICKETS_PER_INNINGS: u32 = 10;

pub fn apply_delivery(innings: &mut Innings, delivery: &DeliveryEvent) {
    innings.total_runs += delivery.total_runs();
    innings.extras += delivery.extra_runs;
    if delivery.is_wicket {
        innings.total_wickets += 1;
    }
    if delivery.is_legal_delivery {
        innings.legal_balls += 1;
    }
    innings.total_overs = overs_from_balls(innings.legal_balls);
    innings.updated_at = Utc::now();
}

/// First completion rule that holds, checked in order: all out, overs
/// exhausted, target reached.
pub fn completion_after(innings: &Innings, over_limit: Option<u32>) -> Option<InningsCompletion> {
    if innings.total_wickets >= WICKETS_PER_INNINGS {
        Some(InningsCompletion::AllOut)
    } else if over_limit.is_some_and(|limit| innings.total_overs >= limit as f64) {
        Some(InningsCompletion::OversExhausted)
    } else if innings.target.is_some_and(|target| innings.total_runs >= target) {
        Some(InningsCompletion::TargetReached)
    } else {
        None
    }
}

pub fn close(innings: &mut Innings, reason: InningsCompletion) {
    innings.is_completed = true;
    innings.completion = Some(reason);
    innings.updated_at = Utc::now();
}
