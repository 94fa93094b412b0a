use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{InningsId, MatchId, TeamId};
use super::overs::{decimal_overs, overs_from_balls, round2, BALLS_PER_OVER};

/// Why an innings closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InningsCompletion {
    AllOut,
    OversExhausted,
    TargetReached,
    /// Closed by the scorer (declaration, forfeit, rain).
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    pub id: InningsId,
    pub match_id: MatchId,
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    pub innings_number: u8,
    pub is_completed: bool,
    pub completion: Option<InningsCompletion>,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub legal_balls: u32,
    /// Cricket notation, see [`overs_from_balls`].
    pub total_overs: f64,
    pub extras: u32,
    /// Runs needed to win; only set on the second innings.
    pub target: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Innings {
    pub fn new(
        match_id: MatchId,
        innings_number: u8,
        batting_team: TeamId,
        bowling_team: TeamId,
        target: Option<u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InningsId::new(),
            match_id,
            batting_team,
            bowling_team,
            innings_number,
            is_completed: false,
            completion: None,
            total_runs: 0,
            total_wickets: 0,
            legal_balls: 0,
            total_overs: 0.0,
            extras: 0,
            target,
            created_at: now,
            updated_at: now,
        }
    }

    /// Runs per over, 0 before the first legal ball.
    pub fn run_rate(&self) -> f64 {
        if self.total_overs > 0.0 {
            round2(self.total_runs as f64 / self.total_overs)
        } else {
            0.0
        }
    }

    /// Runs per over still needed to reach the target in the remaining overs.
    pub fn required_run_rate(&self, over_limit: Option<u32>) -> f64 {
        let (Some(target), Some(limit)) = (self.target, over_limit) else {
            return 0.0;
        };
        let balls_left = (limit * BALLS_PER_OVER).saturating_sub(self.legal_balls);
        if balls_left == 0 {
            return 0.0;
        }
        let runs_needed = target.saturating_sub(self.total_runs);
        round2(runs_needed as f64 / decimal_overs(balls_left))
    }

    pub fn summary(&self, over_limit: Option<u32>) -> InningsSummary {
        InningsSummary {
            innings_id: self.id,
            innings_number: self.innings_number,
            batting_team: self.batting_team,
            total_runs: self.total_runs,
            total_wickets: self.total_wickets,
            total_overs: overs_from_balls(self.legal_balls),
            extras: self.extras,
            run_rate: self.run_rate(),
            required_run_rate: self.required_run_rate(over_limit),
            target: self.target,
            is_completed: self.is_completed,
            completion: self.completion,
        }
    }
}

/// Scoreboard header for an innings, e.g. `87/3 (10.4 ov)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InningsSummary {
    pub innings_id: InningsId,
    pub innings_number: u8,
    pub batting_team: TeamId,
    pub total_runs: u32,
    pub total_wickets: u32,
    pub total_overs: f64,
    pub extras: u32,
    pub run_rate: f64,
    pub required_run_rate: f64,
    pub target: Option<u32>,
    pub is_completed: bool,
    pub completion: Option<InningsCompletion>,
}

impl InningsSummary {
    pub fn scoreline(&self) -> String {
        format!("{}/{} ({} ov)", self.total_runs, self.total_wickets, self.total_overs)
    }
}
