//! Match record: teams, format, toss, lifecycle status and result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{MatchId, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    T20,
    Odi,
    Test,
    Custom,
}

impl MatchType {
    /// Standard over limit for the format.
    pub fn default_over_limit(self) -> Option<u32> {
        match self {
            MatchType::T20 => Some(20),
            MatchType::Odi => Some(50),
            MatchType::Test | MatchType::Custom => None,
        }
    }

    /// Whether the two-innings result rule applies.
    pub fn is_single_innings_per_side(self) -> bool {
        !matches!(self, MatchType::Test)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Completed,
    Abandoned,
}

impl MatchStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
            MatchStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    pub winner: TeamId,
    pub decision: TossDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum WinMargin {
    Runs(u32),
    Wickets(u32),
    Tie,
}

impl fmt::Display for WinMargin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WinMargin::Runs(n) => write!(f, "by {} runs", n),
            WinMargin::Wickets(n) => write!(f, "by {} wickets", n),
            WinMargin::Tie => write!(f, "match tied"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// `None` on a tie.
    pub winner: Option<TeamId>,
    pub margin: WinMargin,
}

impl MatchResult {
    pub fn tie() -> Self {
        Self { winner: None, margin: WinMargin::Tie }
    }

    pub fn is_tie(&self) -> bool {
        self.winner.is_none()
    }
}

/// Parameters for creating a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub team_1: TeamId,
    pub team_2: TeamId,
    pub match_type: MatchType,
    /// `None` means unlimited overs.
    pub over_limit: Option<u32>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewMatch {
    /// A match of the given format using its standard over limit.
    pub fn new(team_1: TeamId, team_2: TeamId, match_type: MatchType) -> Self {
        Self {
            team_1,
            team_2,
            match_type,
            over_limit: match_type.default_over_limit(),
            scheduled_at: None,
        }
    }

    pub fn t20(team_1: TeamId, team_2: TeamId) -> Self {
        Self::new(team_1, team_2, MatchType::T20)
    }

    pub fn with_over_limit(mut self, over_limit: Option<u32>) -> Self {
        self.over_limit = over_limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub team_1: TeamId,
    pub team_2: TeamId,
    pub match_type: MatchType,
    pub over_limit: Option<u32>,
    pub status: MatchStatus,
    pub toss: Option<Toss>,
    pub result: Option<MatchResult>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn from_new(new: NewMatch) -> Self {
        let now = Utc::now();
        Self {
            id: MatchId::new(),
            team_1: new.team_1,
            team_2: new.team_2,
            match_type: new.match_type,
            over_limit: new.over_limit,
            status: MatchStatus::Scheduled,
            toss: None,
            result: None,
            scheduled_at: new.scheduled_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.team_1 == team || self.team_2 == team
    }

    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if team == self.team_1 {
            Some(self.team_2)
        } else if team == self.team_2 {
            Some(self.team_1)
        } else {
            None
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
