use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{InningsId, PlayerId};

pub const MAX_RUNS_PER_BALL: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtraType {
    Wide,
    NoBall,
    Bye,
    LegBye,
    Penalty,
}

impl ExtraType {
    /// Wides and no-balls have to be bowled again.
    pub fn is_illegal_delivery(self) -> bool {
        matches!(self, ExtraType::Wide | ExtraType::NoBall)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExtraType::Wide => "wide",
            ExtraType::NoBall => "no-ball",
            ExtraType::Bye => "bye",
            ExtraType::LegBye => "leg-bye",
            ExtraType::Penalty => "penalty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WicketType {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    RetiredHurt,
    ObstructingField,
}

impl WicketType {
    /// Dismissals that count toward a bowler's career wicket tally.
    pub fn is_bowler_credited(self) -> bool {
        !matches!(self, WicketType::RunOut | WicketType::RetiredHurt | WicketType::ObstructingField)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WicketType::Bowled => "bowled",
            WicketType::Caught => "caught",
            WicketType::Lbw => "lbw",
            WicketType::RunOut => "run-out",
            WicketType::Stumped => "stumped",
            WicketType::HitWicket => "hit-wicket",
            WicketType::RetiredHurt => "retired-hurt",
            WicketType::ObstructingField => "obstructing-field",
        }
    }
}

impl fmt::Display for ExtraType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WicketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legality of a delivery with the given extra.
pub fn is_legal(extra_type: Option<ExtraType>) -> bool {
    !extra_type.is_some_and(ExtraType::is_illegal_delivery)
}

/// A delivery as submitted by the scorer, before sequencing.
///
/// `runs` and `extras` are signed so that out-of-range values coming from
/// an unvalidated entry path can be rejected rather than wrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInput {
    pub innings_id: InningsId,
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    #[serde(default)]
    pub runs: i32,
    #[serde(default)]
    pub extras: i32,
    #[serde(default)]
    pub extra_type: Option<ExtraType>,
    #[serde(default)]
    pub is_wicket: bool,
    #[serde(default)]
    pub wicket_type: Option<WicketType>,
    #[serde(default)]
    pub dismissed_player: Option<PlayerId>,
    #[serde(default)]
    pub fielder: Option<PlayerId>,
}

impl DeliveryInput {
    /// A dot ball from `bowler` to `striker`.
    pub fn new(
        innings_id: InningsId,
        striker: PlayerId,
        non_striker: PlayerId,
        bowler: PlayerId,
    ) -> Self {
        Self {
            innings_id,
            striker,
            non_striker,
            bowler,
            runs: 0,
            extras: 0,
            extra_type: None,
            is_wicket: false,
            wicket_type: None,
            dismissed_player: None,
            fielder: None,
        }
    }

    pub fn with_runs(mut self, runs: i32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_extras(mut self, extra_type: ExtraType, extras: i32) -> Self {
        self.extra_type = Some(extra_type);
        self.extras = extras;
        self
    }

    pub fn with_wicket(mut self, wicket_type: WicketType, dismissed: PlayerId) -> Self {
        self.is_wicket = true;
        self.wicket_type = Some(wicket_type);
        self.dismissed_player = Some(dismissed);
        self
    }

    pub fn with_fielder(mut self, fielder: PlayerId) -> Self {
        self.fielder = Some(fielder);
        self
    }
}

/// Over and ball of a delivery. `ball_number` counts legal balls only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallPosition {
    pub over_number: u32,
    pub ball_number: u8,
}

impl BallPosition {
    pub const FIRST: BallPosition = BallPosition { over_number: 0, ball_number: 1 };
}

impl fmt::Display for BallPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.over_number + 1, self.ball_number)
    }
}

/// A committed delivery. Never mutated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub innings_id: InningsId,
    /// Insertion index within the innings.
    pub sequence: u32,
    pub over_number: u32,
    pub ball_number: u8,
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    pub runs_scored: u32,
    pub extra_type: Option<ExtraType>,
    pub extra_runs: u32,
    pub is_wicket: bool,
    pub wicket_type: Option<WicketType>,
    pub dismissed_player: Option<PlayerId>,
    pub fielder: Option<PlayerId>,
    pub is_legal_delivery: bool,
    pub recorded_at: DateTime<Utc>,
}

impl DeliveryEvent {
    pub fn total_runs(&self) -> u32 {
        self.runs_scored + self.extra_runs
    }

    pub fn position(&self) -> BallPosition {
        BallPosition { over_number: self.over_number, ball_number: self.ball_number }
    }

    /// `over.ball` as shown on a scoreboard (overs counted from 1).
    pub fn over_display(&self) -> String {
        self.position().to_string()
    }

    /// True when this legal delivery was the sixth of its over.
    pub fn ends_over(&self) -> bool {
        self.is_legal_delivery && u32::from(self.ball_number) == super::overs::BALLS_PER_OVER
    }

    /// Runs physically run between the wickets, which decides whether the
    /// batters changed ends. Wide and no-ball penalties are not run.
    pub fn runs_run(&self) -> u32 {
        match self.extra_type {
            Some(ExtraType::Bye) | Some(ExtraType::LegBye) => self.runs_scored + self.extra_runs,
            Some(ExtraType::Wide) | Some(ExtraType::NoBall) => {
                self.runs_scored + self.extra_runs.saturating_sub(1)
            }
            Some(ExtraType::Penalty) | None => self.runs_scored,
        }
    }
}
