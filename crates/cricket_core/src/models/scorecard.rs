use serde::{Deserialize, Serialize};

use super::delivery::WicketType;
use super::ids::{InningsId, PlayerId};

/// One batter's line for one innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattingScorecard {
    pub innings_id: InningsId,
    pub player_id: PlayerId,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dots: u32,
    /// runs / balls_faced * 100
    pub strike_rate: f64,
    pub is_out: bool,
    pub dismissal_type: Option<WicketType>,
    pub dismissed_by: Option<PlayerId>,
    pub fielder: Option<PlayerId>,
    /// 1 and 2 are the openers.
    pub batting_position: u32,
}

impl BattingScorecard {
    pub fn new(innings_id: InningsId, player_id: PlayerId, batting_position: u32) -> Self {
        Self {
            innings_id,
            player_id,
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            dots: 0,
            strike_rate: 0.0,
            is_out: false,
            dismissal_type: None,
            dismissed_by: None,
            fielder: None,
            batting_position,
        }
    }
}

/// One bowler's figures for one innings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlingScorecard {
    pub innings_id: InningsId,
    pub player_id: PlayerId,
    pub balls_bowled: u32,
    /// Cricket notation.
    pub overs_bowled: f64,
    pub maidens: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub dots: u32,
    pub runs_conceded: u32,
    pub wickets_taken: u32,
    pub extras_conceded: u32,
    pub economy_rate: f64,
    pub bowling_average: f64,
    pub strike_rate: f64,
    /// Runs conceded so far in this bowler's incomplete over.
    pub current_over_runs: u32,
    /// Wickets taken so far in this bowler's incomplete over.
    pub current_over_wickets: u32,
}

impl BowlingScorecard {
    pub fn new(innings_id: InningsId, player_id: PlayerId) -> Self {
        Self {
            innings_id,
            player_id,
            balls_bowled: 0,
            overs_bowled: 0.0,
            maidens: 0,
            wides: 0,
            no_balls: 0,
            dots: 0,
            runs_conceded: 0,
            wickets_taken: 0,
            extras_conceded: 0,
            economy_rate: 0.0,
            bowling_average: 0.0,
            strike_rate: 0.0,
            current_over_runs: 0,
            current_over_wickets: 0,
        }
    }

    /// Figures in the usual `wickets/runs` form.
    pub fn figures(&self) -> String {
        format!("{}/{}", self.wickets_taken, self.runs_conceded)
    }
}
