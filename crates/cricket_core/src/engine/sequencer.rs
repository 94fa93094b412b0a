//! # Delivery sequencer
//!
//! Derives the over/ball position of an incoming delivery and the batting
//! pair the engine expects to face it, both from the previous delivery of
//! the same innings.
//!
//! ## Numbering
//! - no previous delivery: over 0, ball 1
//! - previous legal and sixth of its over: next over, ball 1
//! - previous legal otherwise: same over, next ball
//! - previous illegal (wide / no-ball): same position again

use std::fmt;

use crate::error::{DomainError, ValidationError};
use crate::models::delivery::{is_legal, MAX_RUNS_PER_BALL};
use crate::models::{BallPosition, DeliveryEvent, DeliveryInput, PlayerId, BALLS_PER_OVER};

/// Reject the few input rules the engine depends on.
pub fn validate_input(input: &DeliveryInput) -> Result<(), ValidationError> {
    if !(0..=MAX_RUNS_PER_BALL).contains(&input.runs) {
        return Err(ValidationError::RunsOutOfRange { runs: input.runs });
    }
    if input.extras < 0 {
        return Err(ValidationError::NegativeExtras { extras: input.extras });
    }
    if input.is_wicket && input.wicket_type.is_none() {
        return Err(ValidationError::MissingWicketType);
    }
    Ok(())
}

pub fn next_position(previous: Option<&DeliveryEvent>) -> BallPosition {
    let Some(prev) = previous else {
        return BallPosition::FIRST;
    };
    if !prev.is_legal_delivery {
        return prev.position();
    }
    if u32::from(prev.ball_number) >= BALLS_PER_OVER {
        BallPosition { over_number: prev.over_number + 1, ball_number: 1 }
    } else {
        BallPosition { over_number: prev.over_number, ball_number: prev.ball_number + 1 }
    }
}

/// Build the committed event for `input` at `position`.
pub fn sequence(input: &DeliveryInput, position: BallPosition, sequence: u32) -> DeliveryEvent {
    let is_wicket = input.is_wicket;
    DeliveryEvent {
        innings_id: input.innings_id,
        sequence,
        over_number: position.over_number,
        ball_number: position.ball_number,
        striker: input.striker,
        non_striker: input.non_striker,
        bowler: input.bowler,
        // range checked by validate_input
        runs_scored: input.runs.max(0) as u32,
        extra_type: input.extra_type,
        extra_runs: input.extras.max(0) as u32,
        is_wicket,
        wicket_type: if is_wicket { input.wicket_type } else { None },
        dismissed_player: if is_wicket {
            input.dismissed_player.or(Some(input.striker))
        } else {
            None
        },
        fielder: if is_wicket { input.fielder } else { None },
        is_legal_delivery: is_legal(input.extra_type),
        recorded_at: chrono::Utc::now(),
    }
}

/// Which batters the engine expects at the crease for the next delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedStrike {
    /// Nothing bowled yet; any two different batters may open.
    Open,
    Pair { striker: PlayerId, non_striker: PlayerId },
    /// A batter was just dismissed; the replacement may take either end.
    AfterWicket { survivor: PlayerId, dismissed: PlayerId },
}

impl ExpectedStrike {
    pub fn after(previous: Option<&DeliveryEvent>) -> Self {
        let Some(prev) = previous else {
            return ExpectedStrike::Open;
        };

        let (mut striker, mut non_striker) = (prev.striker, prev.non_striker);
        if prev.runs_run() % 2 == 1 {
            std::mem::swap(&mut striker, &mut non_striker);
        }
        if prev.ends_over() {
            std::mem::swap(&mut striker, &mut non_striker);
        }

        match prev.dismissed_player.filter(|_| prev.is_wicket) {
            Some(out) if out == striker => {
                ExpectedStrike::AfterWicket { survivor: non_striker, dismissed: out }
            }
            Some(out) if out == non_striker => {
                ExpectedStrike::AfterWicket { survivor: striker, dismissed: out }
            }
            _ => ExpectedStrike::Pair { striker, non_striker },
        }
    }

    /// Batters known to be at the crease, striker first when known.
    pub fn batsmen(&self) -> Vec<PlayerId> {
        match *self {
            ExpectedStrike::Open => Vec::new(),
            ExpectedStrike::Pair { striker, non_striker } => vec![striker, non_striker],
            ExpectedStrike::AfterWicket { survivor, .. } => vec![survivor],
        }
    }

    pub fn check(&self, striker: PlayerId, non_striker: PlayerId) -> Result<(), DomainError> {
        let accepted = striker != non_striker
            && match *self {
                ExpectedStrike::Open => true,
                ExpectedStrike::Pair { striker: s, non_striker: n } => {
                    striker == s && non_striker == n
                }
                ExpectedStrike::AfterWicket { survivor, dismissed } => {
                    (striker == survivor || non_striker == survivor)
                        && striker != dismissed
                        && non_striker != dismissed
                }
            };
        if accepted {
            Ok(())
        } else {
            Err(DomainError::StrikeMismatch { expected: self.to_string(), striker, non_striker })
        }
    }
}

impl fmt::Display for ExpectedStrike {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpectedStrike::Open => write!(f, "two different opening batters"),
            ExpectedStrike::Pair { striker, non_striker } => {
                write!(f, "striker {} / non-striker {}", striker, non_striker)
            }
            ExpectedStrike::AfterWicket { survivor, dismissed } => {
                write!(f, "{} with a new batter (not {})", survivor, dismissed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraType, InningsId, WicketType};

    fn committed(input: DeliveryInput, previous: Option<&DeliveryEvent>) -> DeliveryEvent {
        let seq = previous.map_or(0, |p| p.sequence + 1);
        sequence(&input, next_position(previous), seq)
    }

    fn ball(innings: InningsId) -> DeliveryInput {
        DeliveryInput::new(innings, PlayerId(1), PlayerId(2), PlayerId(11))
    }

    #[test]
    fn test_first_delivery_is_over_zero_ball_one() {
        assert_eq!(next_position(None), BallPosition::FIRST);
    }

    #[test]
    fn test_illegal_delivery_repeats_position() {
        let innings = InningsId::new();
        let first = committed(ball(innings), None);
        let wide = committed(ball(innings).with_extras(ExtraType::Wide, 1), Some(&first));
        assert_eq!(wide.position(), BallPosition { over_number: 0, ball_number: 2 });
        assert!(!wide.is_legal_delivery);
        let next = committed(ball(innings), Some(&wide));
        assert_eq!(next.position(), BallPosition { over_number: 0, ball_number: 2 });
    }

    #[test]
    fn test_sixth_ball_rolls_over() {
        let innings = InningsId::new();
        let mut prev = committed(ball(innings), None);
        for _ in 0..5 {
            prev = committed(ball(innings), Some(&prev));
        }
        assert_eq!(prev.position(), BallPosition { over_number: 0, ball_number: 6 });
        assert_eq!(next_position(Some(&prev)), BallPosition { over_number: 1, ball_number: 1 });
    }

    #[test]
    fn test_validation_rules() {
        let innings = InningsId::new();
        assert_eq!(
            validate_input(&ball(innings).with_runs(8)),
            Err(ValidationError::RunsOutOfRange { runs: 8 })
        );
        assert_eq!(
            validate_input(&ball(innings).with_runs(-1)),
            Err(ValidationError::RunsOutOfRange { runs: -1 })
        );
        assert_eq!(
            validate_input(&ball(innings).with_extras(ExtraType::Bye, -2)),
            Err(ValidationError::NegativeExtras { extras: -2 })
        );
        let mut no_type = ball(innings);
        no_type.is_wicket = true;
        assert_eq!(validate_input(&no_type), Err(ValidationError::MissingWicketType));
        assert!(validate_input(&ball(innings).with_runs(7)).is_ok());
    }

    #[test]
    fn test_odd_runs_swap_strike() {
        let innings = InningsId::new();
        let single = committed(ball(innings).with_runs(1), None);
        assert_eq!(
            ExpectedStrike::after(Some(&single)),
            ExpectedStrike::Pair { striker: PlayerId(2), non_striker: PlayerId(1) }
        );
        // one wide plus one run taken
        let wide_run = committed(ball(innings).with_extras(ExtraType::Wide, 2), None);
        assert_eq!(ExpectedStrike::after(Some(&wide_run)).batsmen(), vec![PlayerId(2), PlayerId(1)]);
    }

    #[test]
    fn test_single_off_last_ball_keeps_striker() {
        let innings = InningsId::new();
        let mut prev = committed(ball(innings), None);
        for _ in 0..4 {
            prev = committed(ball(innings), Some(&prev));
        }
        let last = committed(ball(innings).with_runs(1), Some(&prev));
        assert!(last.ends_over());
        assert_eq!(ExpectedStrike::after(Some(&last)).batsmen(), vec![PlayerId(1), PlayerId(2)]);
    }

    #[test]
    fn test_after_wicket_rules() {
        let innings = InningsId::new();
        let out = committed(ball(innings).with_wicket(WicketType::Bowled, PlayerId(1)), None);
        let expected = ExpectedStrike::after(Some(&out));
        assert_eq!(expected, ExpectedStrike::AfterWicket { survivor: PlayerId(2), dismissed: PlayerId(1) });
        assert!(expected.check(PlayerId(3), PlayerId(2)).is_ok());
        assert!(expected.check(PlayerId(2), PlayerId(3)).is_ok());
        assert!(expected.check(PlayerId(1), PlayerId(2)).is_err());
        assert!(expected.check(PlayerId(3), PlayerId(4)).is_err());
    }

    #[test]
    fn test_check_rejects_same_batter_twice() {
        assert!(ExpectedStrike::Open.check(PlayerId(1), PlayerId(1)).is_err());
        assert!(ExpectedStrike::Open.check(PlayerId(1), PlayerId(2)).is_ok());
    }

    #[test]
    fn test_wicket_defaults_dismissed_to_striker() {
        let innings = InningsId::new();
        let mut input = ball(innings);
        input.is_wicket = true;
        input.wicket_type = Some(WicketType::Lbw);
        let event = committed(input, None);
        assert_eq!(event.dismissed_player, Some(PlayerId(1)));
    }
}
