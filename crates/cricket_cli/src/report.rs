//! Printable match and career reports.

use anyhow::Result;
use serde::Serialize;
use std::fmt;

use cricket_core::models::PlayerId;
use cricket_core::stats::{
    ConsistencyReport, InningsReport, MatchSummary, PlayerCareer, RecentForm, VerificationReport,
};

use crate::PlayedMatch;

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub summary: MatchSummary,
    pub innings: Vec<InningsReport>,
    /// Replay check per innings.
    pub verification: Vec<VerificationReport>,
}

pub fn match_report(played: &PlayedMatch) -> Result<MatchReport> {
    let stats = played.scorer.stats();
    let mut innings = Vec::with_capacity(played.innings.len());
    let mut verification = Vec::with_capacity(played.innings.len());
    for id in &played.innings {
        innings.push(stats.innings_summary(*id)?);
        verification.push(stats.verify_innings(*id)?);
    }
    Ok(MatchReport { summary: stats.match_summary(played.match_id)?, innings, verification })
}

impl MatchReport {
    pub fn is_consistent(&self) -> bool {
        self.verification.iter().all(VerificationReport::is_consistent)
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} v {} ({:?}, {})",
            self.summary.team_1_name,
            self.summary.team_2_name,
            self.summary.record.match_type,
            self.summary.record.status
        )?;

        for report in &self.innings {
            writeln!(f)?;
            writeln!(
                f,
                "Innings {}: {} {}",
                report.summary.innings_number,
                report.batting_team_name,
                report.summary.scoreline()
            )?;
            if let Some(target) = report.summary.target {
                writeln!(f, "  Target {}", target)?;
            }

            writeln!(f, "  {:<20} {:<12} {:>4} {:>4} {:>3} {:>3} {:>7}", "Batter", "", "R", "B", "4s", "6s", "SR")?;
            for line in &report.batting {
                writeln!(
                    f,
                    "  {:<20} {:<12} {:>4} {:>4} {:>3} {:>3} {:>7.2}",
                    line.player_name, line.dismissal, line.runs, line.balls, line.fours, line.sixes, line.strike_rate
                )?;
            }
            writeln!(f, "  Extras {}", report.summary.extras)?;

            writeln!(f, "  {:<20} {:>5} {:>3} {:>4} {:>3} {:>6}", "Bowler", "O", "M", "R", "W", "Econ")?;
            for line in &report.bowling {
                writeln!(
                    f,
                    "  {:<20} {:>5} {:>3} {:>4} {:>3} {:>6.2}",
                    line.player_name, line.overs, line.maidens, line.runs_conceded, line.wickets, line.economy
                )?;
            }

            writeln!(f, "  Partnerships")?;
            for stand in &report.partnerships {
                writeln!(
                    f,
                    "  wkt {:>2}: {} & {} {} ({} balls){}",
                    stand.wickets_fallen + 1,
                    stand.batsman_1_name,
                    stand.batsman_2_name,
                    stand.runs,
                    stand.balls,
                    if stand.is_active { " *" } else { "" }
                )?;
            }
        }

        writeln!(f)?;
        match &self.summary.result_text {
            Some(text) => writeln!(f, "{}", text)?,
            None => writeln!(f, "No result yet")?,
        }
        for check in self.verification.iter().filter(|v| !v.is_consistent()) {
            writeln!(f, "WARNING: innings {} differs from its delivery log", check.innings_id)?;
            for mismatch in &check.mismatches {
                writeln!(f, "  {}", mismatch)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerReport {
    pub career: PlayerCareer,
    pub consistency: ConsistencyReport,
    pub form: RecentForm,
}

pub fn career_report(played: &PlayedMatch, player: PlayerId) -> Result<CareerReport> {
    let stats = played.scorer.stats();
    Ok(CareerReport {
        career: stats.player_career(player)?,
        consistency: stats.consistency(player)?,
        form: stats.recent_form(player)?,
    })
}

impl fmt::Display for CareerReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bat = &self.career.batting;
        let bowl = &self.career.bowling;
        writeln!(f, "{} ({})", self.career.player_name, self.career.player_id)?;
        writeln!(
            f,
            "  Batting: {} inns, {} runs, HS {}{}, avg {:.2}, SR {:.2}, {}x4 {}x6",
            bat.innings,
            bat.runs,
            bat.highest_score,
            if bat.highest_not_out { "*" } else { "" },
            bat.average,
            bat.strike_rate,
            bat.fours,
            bat.sixes
        )?;
        let best = bowl.best_figures.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string());
        writeln!(
            f,
            "  Bowling: {} inns, {} ov, {} wkts, {} runs, best {}, econ {:.2}",
            bowl.innings, bowl.overs, bowl.wickets, bowl.runs_conceded, best, bowl.economy
        )?;
        writeln!(
            f,
            "  Consistency: batting {:.2}, bowling {:.2}, combined {:.2}",
            self.consistency.batting.consistency, self.consistency.bowling.consistency, self.consistency.combined
        )?;
        writeln!(f, "  Recent form: {:?} -> {:.2}", self.form.runs, self.form.weighted_average)
    }
}
