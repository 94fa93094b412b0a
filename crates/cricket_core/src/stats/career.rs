//! Career aggregates re-derived from the delivery log.
//!
//! Career numbers never read scorecards; every figure comes from the
//! deliveries a player batted, bowled or was dismissed on.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::StatisticsView;
use crate::error::Result;
use crate::models::overs::{decimal_overs, round2};
use crate::models::{overs_from_balls, DeliveryEvent, InningsId, PlayerId};

/// One player's share of one innings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInnings {
    pub innings_id: InningsId,
    /// Faced at least one delivery.
    pub faced: bool,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dismissed: bool,
    pub bowled: bool,
    pub balls_bowled: u32,
    pub runs_conceded: u32,
    /// Wickets credited to the bowler.
    pub wickets: u32,
}

impl PlayerInnings {
    fn new(innings_id: InningsId) -> Self {
        Self {
            innings_id,
            faced: false,
            runs: 0,
            balls_faced: 0,
            fours: 0,
            sixes: 0,
            dismissed: false,
            bowled: false,
            balls_bowled: 0,
            runs_conceded: 0,
            wickets: 0,
        }
    }

    pub fn batted(&self) -> bool {
        self.faced || self.dismissed
    }
}

/// Split a player's deliveries into per-innings lines, in log order.
pub fn breakdown(deliveries: &[DeliveryEvent], player: PlayerId) -> Vec<PlayerInnings> {
    let mut lines: Vec<PlayerInnings> = Vec::new();
    let mut index: HashMap<InningsId, usize> = HashMap::new();

    for d in deliveries {
        let slot = *index.entry(d.innings_id).or_insert_with(|| {
            lines.push(PlayerInnings::new(d.innings_id));
            lines.len() - 1
        });
        let line = &mut lines[slot];

        if d.striker == player {
            line.faced = true;
            line.runs += d.runs_scored;
            if d.is_legal_delivery {
                line.balls_faced += 1;
            }
            match d.runs_scored {
                4 => line.fours += 1,
                6 => line.sixes += 1,
                _ => {}
            }
        }
        if d.is_wicket && d.dismissed_player == Some(player) {
            line.dismissed = true;
        }
        if d.bowler == player {
            line.bowled = true;
            if d.is_legal_delivery {
                line.balls_bowled += 1;
            }
            line.runs_conceded += d.total_runs();
            if d.is_wicket && d.wicket_type.is_some_and(|w| w.is_bowler_credited()) {
                line.wickets += 1;
            }
        }
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattingCareer {
    pub innings: u32,
    pub runs: u32,
    pub balls_faced: u32,
    pub dismissals: u32,
    pub not_outs: u32,
    /// Runs per dismissal; total runs while never dismissed.
    pub average: f64,
    pub strike_rate: f64,
    pub fours: u32,
    pub sixes: u32,
    pub highest_score: u32,
    pub highest_not_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Figures {
    pub wickets: u32,
    pub runs: u32,
}

impl Figures {
    /// More wickets, then fewer runs.
    fn better_than(&self, other: &Figures) -> bool {
        self.wickets > other.wickets || (self.wickets == other.wickets && self.runs < other.runs)
    }
}

impl fmt::Display for Figures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.wickets, self.runs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlingCareer {
    pub innings: u32,
    pub balls_bowled: u32,
    /// Cricket notation.
    pub overs: f64,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub average: f64,
    pub economy: f64,
    pub strike_rate: f64,
    pub best_figures: Option<Figures>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCareer {
    pub player_id: PlayerId,
    pub player_name: String,
    pub batting: BattingCareer,
    pub bowling: BowlingCareer,
}

pub fn batting_career(lines: &[PlayerInnings]) -> BattingCareer {
    let batted: Vec<&PlayerInnings> = lines.iter().filter(|l| l.batted()).collect();
    let runs: u32 = batted.iter().map(|l| l.runs).sum();
    let balls_faced: u32 = batted.iter().map(|l| l.balls_faced).sum();
    let dismissals = batted.iter().filter(|l| l.dismissed).count() as u32;
    let top = batted
        .iter()
        .max_by(|a, b| a.runs.cmp(&b.runs).then(b.dismissed.cmp(&a.dismissed)));

    BattingCareer {
        innings: batted.len() as u32,
        runs,
        balls_faced,
        dismissals,
        not_outs: batted.len() as u32 - dismissals,
        average: if dismissals > 0 { round2(runs as f64 / dismissals as f64) } else { runs as f64 },
        strike_rate: if balls_faced > 0 {
            round2(runs as f64 / balls_faced as f64 * 100.0)
        } else {
            0.0
        },
        fours: batted.iter().map(|l| l.fours).sum(),
        sixes: batted.iter().map(|l| l.sixes).sum(),
        highest_score: top.map_or(0, |l| l.runs),
        highest_not_out: top.is_some_and(|l| !l.dismissed),
    }
}

pub fn bowling_career(lines: &[PlayerInnings]) -> BowlingCareer {
    let bowled: Vec<&PlayerInnings> = lines.iter().filter(|l| l.bowled).collect();
    let balls_bowled: u32 = bowled.iter().map(|l| l.balls_bowled).sum();
    let runs_conceded: u32 = bowled.iter().map(|l| l.runs_conceded).sum();
    let wickets: u32 = bowled.iter().map(|l| l.wickets).sum();

    let mut best: Option<Figures> = None;
    for line in &bowled {
        let figures = Figures { wickets: line.wickets, runs: line.runs_conceded };
        if best.map_or(true, |b| figures.better_than(&b)) {
            best = Some(figures);
        }
    }

    let overs = decimal_overs(balls_bowled);
    BowlingCareer {
        innings: bowled.len() as u32,
        balls_bowled,
        overs: overs_from_balls(balls_bowled),
        runs_conceded,
        wickets,
        average: if wickets > 0 { round2(runs_conceded as f64 / wickets as f64) } else { 0.0 },
        economy: if overs > 0.0 { round2(runs_conceded as f64 / overs) } else { 0.0 },
        strike_rate: if wickets > 0 { round2(balls_bowled as f64 / wickets as f64) } else { 0.0 },
        best_figures: best,
    }
}

impl<'a> StatisticsView<'a> {
    /// Per-innings lines for a player, oldest innings first.
    pub fn player_innings(&self, player: PlayerId) -> Result<Vec<PlayerInnings>> {
        Ok(breakdown(&self.store.deliveries_for_player(player)?, player))
    }

    pub fn player_career(&self, player: PlayerId) -> Result<PlayerCareer> {
        let lines = self.player_innings(player)?;
        Ok(PlayerCareer {
            player_id: player,
            player_name: self.registry.player_name(player),
            batting: batting_career(&lines),
            bowling: bowling_career(&lines),
        })
    }
}
