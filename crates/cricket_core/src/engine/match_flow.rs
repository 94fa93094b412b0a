//! Match lifecycle: toss, innings order, target and result.
//!
//! ```text
//! scheduled ──first innings──▶ live ──both innings done──▶ completed
//!     │                          │
//!     └────────abandon───────────┴──────────▶ abandoned
//! ```

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::TossPolicy;
use crate::error::DomainError;
use crate::models::{Innings, Match, MatchResult, MatchStatus, TeamId, Toss, TossDecision, WinMargin};

use super::innings::WICKETS_PER_INNINGS;

pub const MAX_INNINGS: u8 = 4;

pub fn can_transition(from: MatchStatus, to: MatchStatus) -> bool {
    matches!(
        (from, to),
        (MatchStatus::Scheduled, MatchStatus::Live)
            | (MatchStatus::Scheduled, MatchStatus::Abandoned)
            | (MatchStatus::Live, MatchStatus::Completed)
            | (MatchStatus::Live, MatchStatus::Abandoned)
    )
}

pub fn transition(record: &mut Match, to: MatchStatus) -> Result<(), DomainError> {
    if !can_transition(record.status, to) {
        return Err(DomainError::InvalidStatusTransition { from: record.status, to });
    }
    record.status = to;
    record.touch();
    Ok(())
}

/// Validate a toss call, or repair it under [`TossPolicy::Randomize`].
pub fn resolve_toss<R: Rng>(
    record: &Match,
    winner: Option<TeamId>,
    decision: Option<TossDecision>,
    policy: TossPolicy,
    rng: &mut R,
) -> Result<Toss, DomainError> {
    let valid_winner = winner.filter(|team| record.involves(*team));

    match policy {
        TossPolicy::Reject => {
            let winner = valid_winner.ok_or_else(|| DomainError::InvalidToss {
                match_id: record.id,
                reason: match winner {
                    Some(team) => format!("{} is not playing", team),
                    None => "no toss winner given".to_string(),
                },
            })?;
            let decision = decision.ok_or_else(|| DomainError::InvalidToss {
                match_id: record.id,
                reason: "no toss decision given".to_string(),
            })?;
            Ok(Toss { winner, decision })
        }
        TossPolicy::Randomize => {
            let teams = [record.team_1, record.team_2];
            let winner = valid_winner
                .or_else(|| teams.choose(rng).copied())
                .unwrap_or(record.team_1);
            let decision = decision.unwrap_or_else(|| {
                if rng.gen_bool(0.5) {
                    TossDecision::Bat
                } else {
                    TossDecision::Field
                }
            });
            Ok(Toss { winner, decision })
        }
    }
}

/// Runs the second innings side needs: first innings total plus one.
pub fn target_for(first: &Innings) -> u32 {
    first.total_runs + 1
}

/// Result once innings 1 and 2 are both complete. Multi-innings formats
/// are never decided here.
pub fn evaluate_result(record: &Match, innings: &[Innings]) -> Option<MatchResult> {
    if !record.match_type.is_single_innings_per_side() {
        return None;
    }
    let first = innings.iter().find(|i| i.innings_number == 1)?;
    let second = innings.iter().find(|i| i.innings_number == 2)?;
    if !(first.is_completed && second.is_completed) {
        return None;
    }

    let result = if second.total_runs > first.total_runs {
        MatchResult {
            winner: Some(second.batting_team),
            margin: WinMargin::Wickets(WICKETS_PER_INNINGS.saturating_sub(second.total_wickets)),
        }
    } else if first.total_runs > second.total_runs {
        MatchResult {
            winner: Some(first.batting_team),
            margin: WinMargin::Runs(first.total_runs - second.total_runs),
        }
    } else {
        MatchResult::tie()
    };
    Some(result)
}
