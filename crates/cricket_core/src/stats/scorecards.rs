//! Scorecards, over and partnership views, match snapshots.

use serde::Serialize;

use super::StatisticsView;
use crate::error::Result;
use crate::models::overs::round2;
use crate::models::{
    DeliveryEvent, InningsId, InningsSummary, Match, MatchId, MatchStatus, PlayerId,
    BALLS_PER_OVER,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattingLine {
    pub player_id: PlayerId,
    pub player_name: String,
    pub batting_position: u32,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub dots: u32,
    /// Rounded to two decimals; the stored card keeps full precision.
    pub strike_rate: f64,
    pub is_out: bool,
    /// Wicket type, or `not out`.
    pub dismissal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlingLine {
    pub player_id: PlayerId,
    pub player_name: String,
    pub overs: f64,
    pub maidens: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    /// Rounded to two decimals.
    pub economy: f64,
    pub dots: u32,
    pub wides: u32,
    pub no_balls: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverSummary {
    pub innings_id: InningsId,
    /// 0-based, as stored on deliveries.
    pub over_number: u32,
    pub deliveries: Vec<DeliveryEvent>,
    pub total_runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    /// Six legal balls bowled, or a wicket fell in the over.
    pub is_complete: bool,
}

impl OverSummary {
    /// Over number as a scorer reads it (first over is 1).
    pub fn display_number(&self) -> u32 {
        self.over_number + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnershipLine {
    pub wickets_fallen: u32,
    pub batsman_1: PlayerId,
    pub batsman_1_name: String,
    pub batsman_2: PlayerId,
    pub batsman_2_name: String,
    pub runs: u32,
    pub balls: u32,
    pub run_rate: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InningsReport {
    pub summary: InningsSummary,
    pub batting_team_name: String,
    pub bowling_team_name: String,
    pub batting: Vec<BattingLine>,
    pub bowling: Vec<BowlingLine>,
    pub partnerships: Vec<PartnershipLine>,
}

/// Snapshot sent to a viewer joining a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub record: Match,
    pub team_1_name: String,
    pub team_2_name: String,
    pub innings: Vec<InningsSummary>,
    pub result_text: Option<String>,
    pub recent_deliveries: Vec<DeliveryEvent>,
}

impl<'a> StatisticsView<'a> {
    /// Batting card ordered by batting position.
    pub fn batting_scorecard(&self, innings: InningsId) -> Result<Vec<BattingLine>> {
        let mut cards = self.store.batting_cards(innings)?;
        cards.sort_by_key(|c| c.batting_position);
        Ok(cards
            .into_iter()
            .map(|c| BattingLine {
                player_name: self.registry.player_name(c.player_id),
                player_id: c.player_id,
                batting_position: c.batting_position,
                runs: c.runs,
                balls: c.balls_faced,
                fours: c.fours,
                sixes: c.sixes,
                dots: c.dots,
                strike_rate: round2(c.strike_rate),
                is_out: c.is_out,
                dismissal: match (c.is_out, c.dismissal_type) {
                    (true, Some(how)) => how.as_str().to_string(),
                    (true, None) => "out".to_string(),
                    (false, _) => "not out".to_string(),
                },
            })
            .collect())
    }

    /// Bowling card, most wickets first; ties keep bowling order.
    pub fn bowling_scorecard(&self, innings: InningsId) -> Result<Vec<BowlingLine>> {
        let mut cards = self.store.bowling_cards(innings)?;
        cards.sort_by(|a, b| b.wickets_taken.cmp(&a.wickets_taken));
        Ok(cards
            .into_iter()
            .map(|c| BowlingLine {
                player_name: self.registry.player_name(c.player_id),
                player_id: c.player_id,
                overs: c.overs_bowled,
                maidens: c.maidens,
                runs_conceded: c.runs_conceded,
                wickets: c.wickets_taken,
                economy: round2(c.economy_rate),
                dots: c.dots,
                wides: c.wides,
                no_balls: c.no_balls,
            })
            .collect())
    }

    pub fn over_summary(&self, innings: InningsId, over_number: u32) -> Result<OverSummary> {
        let deliveries = self.store.deliveries_in_over(innings, over_number)?;
        let legal_balls = deliveries.iter().filter(|d| d.is_legal_delivery).count() as u32;
        let wickets = deliveries.iter().filter(|d| d.is_wicket).count() as u32;
        Ok(OverSummary {
            innings_id: innings,
            over_number,
            total_runs: deliveries.iter().map(DeliveryEvent::total_runs).sum(),
            wickets,
            legal_balls,
            is_complete: legal_balls >= BALLS_PER_OVER || wickets > 0,
            deliveries,
        })
    }

    pub fn partnerships(&self, innings: InningsId) -> Result<Vec<PartnershipLine>> {
        Ok(self
            .store
            .partnerships(innings)?
            .into_iter()
            .map(|p| PartnershipLine {
                wickets_fallen: p.wickets_fallen,
                batsman_1: p.batsman_1,
                batsman_1_name: self.registry.player_name(p.batsman_1),
                batsman_2: p.batsman_2,
                batsman_2_name: self.registry.player_name(p.batsman_2),
                runs: p.runs_scored,
                balls: p.balls_faced,
                run_rate: p.run_rate(),
                is_active: p.is_active,
            })
            .collect())
    }

    pub fn innings_summary(&self, innings_id: InningsId) -> Result<InningsReport> {
        let innings = self.innings(innings_id)?;
        let fixture = self.fixture(innings.match_id)?;
        Ok(InningsReport {
            summary: innings.summary(fixture.over_limit),
            batting_team_name: self.registry.team_name(innings.batting_team),
            bowling_team_name: self.registry.team_name(innings.bowling_team),
            batting: self.batting_scorecard(innings_id)?,
            bowling: self.bowling_scorecard(innings_id)?,
            partnerships: self.partnerships(innings_id)?,
        })
    }

    pub fn match_summary(&self, match_id: MatchId) -> Result<MatchSummary> {
        let record = self.fixture(match_id)?;
        let innings = self
            .store
            .innings_for_match(match_id)?
            .iter()
            .map(|i| i.summary(record.over_limit))
            .collect();
        Ok(MatchSummary {
            team_1_name: self.registry.team_name(record.team_1),
            team_2_name: self.registry.team_name(record.team_2),
            result_text: self.result_text(&record),
            recent_deliveries: self.recent_deliveries(match_id, self.config.recent_deliveries)?,
            innings,
            record,
        })
    }

    /// Last `limit` deliveries of the match across its innings, oldest first.
    pub fn recent_deliveries(&self, match_id: MatchId, limit: usize) -> Result<Vec<DeliveryEvent>> {
        let mut recent = Vec::new();
        for innings in self.store.innings_for_match(match_id)?.iter().rev() {
            if recent.len() >= limit {
                break;
            }
            let log = self.store.deliveries(innings.id)?;
            let take = (limit - recent.len()).min(log.len());
            let mut tail = log[log.len() - take..].to_vec();
            tail.append(&mut recent);
            recent = tail;
        }
        Ok(recent)
    }

    pub fn live_matches(&self) -> Result<Vec<Match>> {
        self.matches_by_status(MatchStatus::Live)
    }

    pub fn matches_by_status(&self, status: MatchStatus) -> Result<Vec<Match>> {
        Ok(self.store.matches(Some(status))?)
    }

    fn result_text(&self, record: &Match) -> Option<String> {
        match (record.status, record.result) {
            (MatchStatus::Abandoned, _) => Some("Match abandoned".to_string()),
            (_, Some(result)) => Some(match result.winner {
                Some(team) => format!("{} won {}", self.registry.team_name(team), result.margin),
                None => "Match tied".to_string(),
            }),
            _ => None,
        }
    }
}
