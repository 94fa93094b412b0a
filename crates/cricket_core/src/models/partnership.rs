use serde::{Deserialize, Serialize};

use super::ids::{InningsId, PlayerId};
use super::overs::{decimal_overs, round2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partnership {
    pub innings_id: InningsId,
    pub batsman_1: PlayerId,
    pub batsman_2: PlayerId,
    pub runs_scored: u32,
    pub balls_faced: u32,
    /// Wickets down when the stand began; doubles as its index in the innings.
    pub wickets_fallen: u32,
    pub is_active: bool,
}

impl Partnership {
    pub fn open(
        innings_id: InningsId,
        batsman_1: PlayerId,
        batsman_2: PlayerId,
        wickets_fallen: u32,
    ) -> Self {
        Self {
            innings_id,
            batsman_1,
            batsman_2,
            runs_scored: 0,
            balls_faced: 0,
            wickets_fallen,
            is_active: true,
        }
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.batsman_1 == player || self.batsman_2 == player
    }

    /// Runs per six legal balls.
    pub fn run_rate(&self) -> f64 {
        if self.balls_faced == 0 {
            return 0.0;
        }
        round2(self.runs_scored as f64 / decimal_overs(self.balls_faced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_rate() {
        let mut stand = Partnership::open(InningsId::new(), PlayerId(1), PlayerId(2), 0);
        assert_eq!(stand.run_rate(), 0.0);
        stand.runs_scored = 45;
        stand.balls_faced = 30;
        assert_eq!(stand.run_rate(), 9.0);
        assert!(stand.involves(PlayerId(2)));
        assert!(!stand.involves(PlayerId(3)));
    }
}
