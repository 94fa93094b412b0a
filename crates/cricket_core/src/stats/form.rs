//! Consistency and recent form.

use serde::Serialize;

use super::career::PlayerInnings;
use super::StatisticsView;
use crate::error::Result;
use crate::models::overs::round2;
use crate::models::PlayerId;

/// Share of batting consistency in the combined score; bowling gets the rest.
pub const BATTING_WEIGHT: f64 = 0.6;

/// Population statistics of a per-innings series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub samples: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// 1 / (1 + variance); 0 for an empty series.
    pub consistency: f64,
}

impl SeriesStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { samples: 0, mean: 0.0, variance: 0.0, std_dev: 0.0, consistency: 0.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            samples: values.len(),
            mean: round2(mean),
            variance: round2(variance),
            std_dev: round2(variance.sqrt()),
            consistency: round2(1.0 / (1.0 + variance)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub player_id: PlayerId,
    /// Over runs per innings faced.
    pub batting: SeriesStats,
    /// Over credited wickets per innings bowled.
    pub bowling: SeriesStats,
    pub combined: f64,
}

pub fn consistency(player_id: PlayerId, lines: &[PlayerInnings]) -> ConsistencyReport {
    let runs: Vec<f64> = lines.iter().filter(|l| l.faced).map(|l| l.runs as f64).collect();
    let wickets: Vec<f64> = lines.iter().filter(|l| l.bowled).map(|l| l.wickets as f64).collect();
    let batting = SeriesStats::from_values(&runs);
    let bowling = SeriesStats::from_values(&wickets);
    ConsistencyReport {
        player_id,
        combined: round2(
            BATTING_WEIGHT * batting.consistency + (1.0 - BATTING_WEIGHT) * bowling.consistency,
        ),
        batting,
        bowling,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentForm {
    pub player_id: PlayerId,
    /// Runs of the innings considered, oldest first.
    pub runs: Vec<u32>,
    pub weighted_average: f64,
}

/// Weighted mean with weights 1..=n from oldest to newest.
pub fn weighted_form(runs: &[u32]) -> f64 {
    if runs.is_empty() {
        return 0.0;
    }
    let weight_sum: u64 = (1..=runs.len() as u64).sum();
    let weighted: u64 = runs
        .iter()
        .enumerate()
        .map(|(i, r)| (i as u64 + 1) * u64::from(*r))
        .sum();
    round2(weighted as f64 / weight_sum as f64)
}

pub fn recent_form(player_id: PlayerId, lines: &[PlayerInnings], window: usize) -> RecentForm {
    let faced: Vec<u32> = lines.iter().filter(|l| l.faced).map(|l| l.runs).collect();
    let runs = faced[faced.len().saturating_sub(window)..].to_vec();
    RecentForm { player_id, weighted_average: weighted_form(&runs), runs }
}

impl<'a> StatisticsView<'a> {
    pub fn consistency(&self, player: PlayerId) -> Result<ConsistencyReport> {
        Ok(consistency(player, &self.player_innings(player)?))
    }

    /// Form over the configured number of most recent innings.
    pub fn recent_form(&self, player: PlayerId) -> Result<RecentForm> {
        self.recent_form_over(player, self.config.recent_form_innings)
    }

    pub fn recent_form_over(&self, player: PlayerId, window: usize) -> Result<RecentForm> {
        Ok(recent_form(player, &self.player_innings(player)?, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_stats() {
        let stats = SeriesStats::from_values(&[10.0, 20.0, 30.0]);
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.variance, 66.67);
        assert_eq!(stats.std_dev, 8.16);
        assert_eq!(stats.consistency, 0.01);

        let steady = SeriesStats::from_values(&[2.0, 2.0]);
        assert_eq!(steady.consistency, 1.0);
        assert_eq!(SeriesStats::from_values(&[]).consistency, 0.0);
    }

    #[test]
    fn test_weighted_form_favours_recent() {
        // (1*10 + 2*20 + 3*60) / 6
        assert_eq!(weighted_form(&[10, 20, 60]), 38.33);
        assert_eq!(weighted_form(&[]), 0.0);
        assert!(weighted_form(&[0, 50]) > weighted_form(&[50, 0]));
    }
}
