//! Score sheet replay
//!
//! JSON score sheet → registry + scorer → scorecards, result and career numbers.
//!
//! A sheet carries the squads, the fixture, an optional toss and the innings
//! ball by ball. Every ball goes through [`cricket_core::Scorer`], so a sheet
//! that breaks a scoring rule fails with the ball that broke it.

pub mod report;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use cricket_core::models::{
    DeliveryInput, ExtraType, InningsId, MatchId, MatchType, NewMatch, PlayerId, TeamId,
    TossDecision, WicketType,
};
use cricket_core::registry::{PlayerRecord, TeamRecord};
use cricket_core::{MemoryRegistry, Scorer, ScoringConfig, ScoringContext};

pub use report::{career_report, match_report, CareerReport, MatchReport};

/// Whole score sheet as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSheet {
    pub teams: Vec<TeamRecord>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(rename = "match")]
    pub fixture: FixtureSheet,
    #[serde(default)]
    pub toss: Option<TossSheet>,
    #[serde(default)]
    pub innings: Vec<InningsSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSheet {
    pub team_1: TeamId,
    pub team_2: TeamId,
    pub match_type: MatchType,
    /// Falls back to the format's standard limit.
    #[serde(default)]
    pub over_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TossSheet {
    #[serde(default)]
    pub winner: Option<TeamId>,
    #[serde(default)]
    pub decision: Option<TossDecision>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InningsSheet {
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    #[serde(default)]
    pub deliveries: Vec<BallSheet>,
    /// Close the innings after the last ball if no rule has ended it.
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallSheet {
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
    pub wicket: Option<WicketSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WicketSheet {
    pub kind: WicketType,
    /// Defaults to the striker.
    #[serde(default)]
    pub player: Option<PlayerId>,
    #[serde(default)]
    pub fielder: Option<PlayerId>,
}

impl BallSheet {
    fn to_input(&self, innings_id: InningsId) -> DeliveryInput {
        let mut input = DeliveryInput::new(innings_id, self.striker, self.non_striker, self.bowler)
            .with_runs(self.runs);
        input.extras = self.extras;
        input.extra_type = self.extra_type;
        if let Some(wicket) = &self.wicket {
            input.is_wicket = true;
            input.wicket_type = Some(wicket.kind);
            input.dismissed_player = wicket.player;
            input.fielder = wicket.fielder;
        }
        input
    }
}

/// Load a score sheet from a JSON file.
pub fn load(path: &Path) -> Result<ScoreSheet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read score sheet: {}", path.display()))?;
    let sheet: ScoreSheet = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse score sheet: {}", path.display()))?;
    log::info!(
        "Loaded score sheet {} ({} innings, {} players)",
        path.display(),
        sheet.innings.len(),
        sheet.players.len()
    );
    Ok(sheet)
}

/// Scorer holding a replayed sheet.
pub struct PlayedMatch {
    pub scorer: Scorer,
    pub match_id: MatchId,
    pub innings: Vec<InningsId>,
}

/// Replay every ball of the sheet through a fresh in-memory scorer.
pub fn play(sheet: &ScoreSheet, config: ScoringConfig) -> Result<PlayedMatch> {
    let registry = MemoryRegistry::new();
    for team in &sheet.teams {
        registry.insert_team(team.clone());
    }
    for player in &sheet.players {
        registry.insert_player(player.clone());
    }
    let scorer = Scorer::new(ScoringContext::in_memory(Arc::new(registry), config));

    let fixture = &sheet.fixture;
    let mut new = NewMatch::new(fixture.team_1, fixture.team_2, fixture.match_type);
    if fixture.over_limit.is_some() {
        new = new.with_over_limit(fixture.over_limit);
    }
    let record = scorer.create_match(new).context("Failed to create match")?;

    if let Some(toss) = &sheet.toss {
        scorer
            .record_toss(record.id, toss.winner, toss.decision)
            .context("Failed to record toss")?;
    }

    let mut innings_ids = Vec::with_capacity(sheet.innings.len());
    for (index, innings_sheet) in sheet.innings.iter().enumerate() {
        let number = index as u8 + 1;
        let innings = scorer
            .start_innings(record.id, number, innings_sheet.batting_team, innings_sheet.bowling_team)
            .with_context(|| format!("Failed to start innings {}", number))?;

        let mut completed = false;
        for (ball, sheet_ball) in innings_sheet.deliveries.iter().enumerate() {
            let outcome = scorer
                .record_delivery(sheet_ball.to_input(innings.id))
                .with_context(|| format!("Innings {} ball {} rejected", number, ball + 1))?;
            completed = outcome.innings_completed;
        }
        if innings_sheet.closed && !completed {
            scorer
                .complete_innings(innings.id)
                .with_context(|| format!("Failed to close innings {}", number))?;
        }
        innings_ids.push(innings.id);
    }

    Ok(PlayedMatch { scorer, match_id: record.id, innings: innings_ids })
}
