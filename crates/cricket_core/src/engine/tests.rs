//! Scoring scenarios run end to end through [`Scorer`] and [`MemoryStore`].

use super::*;
use crate::broadcast::RecordingBroadcaster;
use crate::error::{ScoringError, StorageError};
use crate::models::{overs_from_balls, BallPosition, ExtraType, MatchType, WicketType, WinMargin};
use crate::registry::MemoryRegistry;
use proptest::prelude::*;
use std::sync::mpsc;
use std::time::Duration;

const LIONS: TeamId = TeamId(1);
const TIGERS: TeamId = TeamId(2);

struct Harness {
    scorer: Scorer,
    store: Arc<MemoryStore>,
    broadcaster: Arc<RecordingBroadcaster>,
}

fn registry() -> Arc<MemoryRegistry> {
    let registry = MemoryRegistry::new();
    registry.add_team(LIONS, "Lions").add_team(TIGERS, "Tigers");
    for n in 1..=11 {
        registry.add_player(PlayerId(n), format!("Lion {}", n), LIONS);
        registry.add_player(PlayerId(20 + n), format!("Tiger {}", n), TIGERS);
    }
    Arc::new(registry)
}

fn harness_with(config: ScoringConfig, broadcaster: RecordingBroadcaster) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let broadcaster = Arc::new(broadcaster);
    let ctx = ScoringContext::new(store.clone(), broadcaster.clone(), registry(), config);
    Harness { scorer: Scorer::new(ctx), store, broadcaster }
}

fn harness() -> Harness {
    harness_with(ScoringConfig::default(), RecordingBroadcaster::new())
}

fn live_match(h: &Harness, new: NewMatch) -> (Match, Innings) {
    let fixture = h.scorer.create_match(new).unwrap();
    h.scorer.record_toss(fixture.id, Some(LIONS), Some(TossDecision::Bat)).unwrap();
    let innings = h.scorer.start_innings(fixture.id, 1, LIONS, TIGERS).unwrap();
    (fixture, innings)
}

fn ball(innings: &Innings, striker: u32, non_striker: u32, bowler: u32) -> DeliveryInput {
    DeliveryInput::new(innings.id, PlayerId(striker), PlayerId(non_striker), PlayerId(bowler))
}

fn stored_innings(h: &Harness, innings: &Innings) -> Innings {
    h.store.innings_by_id(innings.id).unwrap().unwrap()
}

// ------------------------------------------------------------------
// Sequencing and aggregation
// ------------------------------------------------------------------

#[test]
fn test_first_over_numbering() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let mut positions = Vec::new();
    for runs in [4, 6, 1, 0, 0, 1] {
        let outcome = h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(runs)).unwrap();
        positions.push(outcome.delivery.position());
    }
    let expected: Vec<BallPosition> =
        (1..=6).map(|b| BallPosition { over_number: 0, ball_number: b }).collect();
    assert_eq!(positions, expected);

    let seventh = h.scorer.record_delivery(ball(&innings, 2, 1, 22)).unwrap();
    assert_eq!(seventh.delivery.position(), BallPosition { over_number: 1, ball_number: 1 });
    assert_eq!(seventh.delivery.over_display(), "2.1");
    assert_eq!(seventh.innings.total_runs, 12);
}

#[test]
fn test_long_spell_overs_notation() {
    let h = harness_with(
        ScoringConfig { require_registered_players: false, ..ScoringConfig::default() },
        RecordingBroadcaster::new(),
    );
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS).with_over_limit(None));

    let mut last = None;
    for _ in 0..37 {
        last = Some(h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap());
    }
    let bowling = last.unwrap().bowling;
    assert_eq!(bowling.balls_bowled, 37);
    assert!((bowling.overs_bowled - 6.1).abs() < 1e-9);
    assert_eq!(bowling.maidens, 6);
    assert!((stored_innings(&h, &innings).total_overs - 6.1).abs() < 1e-9);
}

#[test]
fn test_wide_and_no_ball_do_not_advance() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let wide = h
        .scorer
        .record_delivery(ball(&innings, 1, 2, 21).with_extras(ExtraType::Wide, 1))
        .unwrap();
    let no_ball = h
        .scorer
        .record_delivery(ball(&innings, 1, 2, 21).with_extras(ExtraType::NoBall, 1).with_runs(4))
        .unwrap();
    let legal = h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap();

    for outcome in [&wide, &no_ball, &legal] {
        assert_eq!(outcome.delivery.position(), BallPosition::FIRST);
    }
    assert!(!wide.delivery.is_legal_delivery);
    assert!(!no_ball.delivery.is_legal_delivery);
    assert_eq!(legal.batting.balls_faced, 1);
    assert_eq!(legal.batting.runs, 4);
    assert_eq!(legal.bowling.wides, 1);
    assert_eq!(legal.bowling.no_balls, 1);
    assert_eq!(legal.bowling.runs_conceded, 6);
    assert_eq!(legal.innings.extras, 2);
    assert_eq!(legal.innings.total_runs, 6);
}

#[test]
fn test_batting_positions_in_order_of_appearance() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(1)).unwrap();
    h.scorer.record_delivery(ball(&innings, 2, 1, 21)).unwrap();
    h.scorer
        .record_delivery(ball(&innings, 2, 1, 21).with_wicket(WicketType::Bowled, PlayerId(2)))
        .unwrap();
    h.scorer.record_delivery(ball(&innings, 3, 1, 21)).unwrap();

    let lines = h.scorer.stats().batting_scorecard(innings.id).unwrap();
    let order: Vec<(PlayerId, u32)> = lines.iter().map(|l| (l.player_id, l.batting_position)).collect();
    assert_eq!(order, vec![(PlayerId(1), 1), (PlayerId(2), 2), (PlayerId(3), 3)]);
    assert_eq!(lines[1].dismissal, "bowled");
    assert_eq!(lines[0].dismissal, "not out");
}

#[test]
fn test_non_striker_run_out() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let outcome = h
        .scorer
        .record_delivery(
            ball(&innings, 1, 2, 21)
                .with_runs(1)
                .with_wicket(WicketType::RunOut, PlayerId(2))
                .with_fielder(PlayerId(25)),
        )
        .unwrap();
    assert!(!outcome.batting.is_out);
    assert_eq!(outcome.batting.runs, 1);
    assert!(!outcome.partnership.is_active);
    assert_eq!(outcome.bowling.wickets_taken, 1);

    let runner = h.store.batting_card(innings.id, PlayerId(2)).unwrap().unwrap();
    assert!(runner.is_out);
    assert_eq!(runner.dismissal_type, Some(WicketType::RunOut));
    assert_eq!(runner.fielder, Some(PlayerId(25)));
    assert_eq!(runner.balls_faced, 0);
    assert_eq!(runner.batting_position, 2);

    let next = h.scorer.record_delivery(ball(&innings, 3, 1, 21)).unwrap();
    assert_eq!(next.partnership.wickets_fallen, 1);
    assert!(next.partnership.involves(PlayerId(3)));
    assert_eq!(h.store.partnerships(innings.id).unwrap().len(), 2);
}

// ------------------------------------------------------------------
// Innings and match completion
// ------------------------------------------------------------------

#[test]
fn test_innings_completes_when_overs_run_out() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let mut outcome = None;
    for n in 0..120 {
        let bowler = 21 + (n / 6) % 2;
        outcome = Some(h.scorer.record_delivery(ball(&innings, 1, 2, bowler)).unwrap());
    }
    let outcome = outcome.unwrap();
    assert!(outcome.innings_completed);
    assert_eq!(outcome.innings.completion, Some(InningsCompletion::OversExhausted));
    assert_eq!(outcome.innings.total_overs, 20.0);
    assert!(outcome.match_result.is_none());

    let before = h.store.delivery_count();
    let err = h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap_err();
    assert_eq!(err, ScoringError::Domain(DomainError::InningsCompleted(innings.id)));
    assert!(!err.is_retryable());
    assert_eq!(h.store.delivery_count(), before);
    assert_eq!(stored_innings(&h, &innings).legal_balls, 120);
}

#[test]
fn test_all_out_completes_innings() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let mut last = None;
    for n in 0..10u32 {
        let striker = 1 + n;
        let input = ball(&innings, striker, 11, 21).with_wicket(WicketType::Bowled, PlayerId(striker));
        last = Some(h.scorer.record_delivery(input).unwrap());
    }
    let last = last.unwrap();
    assert!(last.innings_completed);
    assert_eq!(last.innings.completion, Some(InningsCompletion::AllOut));
    assert_eq!(last.innings.total_wickets, 10);
    assert_eq!(h.store.partnerships(innings.id).unwrap().len(), 10);
}

/// Lions make 150 off 25 balls and declare.
fn first_innings_of_150(h: &Harness, innings: &Innings) {
    for _ in 0..25 {
        h.scorer.record_delivery(ball(innings, 1, 2, 21).with_runs(6)).unwrap();
    }
    let (closed, result) = h.scorer.complete_innings(innings.id).unwrap();
    assert!(closed.is_completed);
    assert_eq!(closed.completion, Some(InningsCompletion::Closed));
    assert!(result.is_none());
}

#[test]
fn test_chase_completes_mid_over_with_result() {
    let h = harness();
    let (fixture, first) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    first_innings_of_150(&h, &first);

    let chase = h.scorer.start_innings(fixture.id, 2, TIGERS, LIONS).unwrap();
    assert_eq!(chase.target, Some(151));

    h.scorer
        .record_delivery(ball(&chase, 21, 22, 1).with_wicket(WicketType::Caught, PlayerId(21)))
        .unwrap();
    h.scorer
        .record_delivery(ball(&chase, 23, 22, 1).with_wicket(WicketType::Lbw, PlayerId(23)))
        .unwrap();
    for _ in 0..25 {
        let outcome = h.scorer.record_delivery(ball(&chase, 24, 22, 2).with_runs(6)).unwrap();
        assert!(!outcome.innings_completed);
    }
    let winning = h.scorer.record_delivery(ball(&chase, 24, 22, 3).with_runs(1)).unwrap();

    assert_eq!(winning.delivery.position(), BallPosition { over_number: 4, ball_number: 4 });
    assert!(winning.innings_completed);
    assert_eq!(winning.innings.completion, Some(InningsCompletion::TargetReached));
    assert_eq!(winning.innings.total_runs, 151);

    let result = winning.match_result.unwrap();
    assert_eq!(result.winner, Some(TIGERS));
    assert_eq!(result.margin, WinMargin::Wickets(8));

    let record = h.store.match_by_id(fixture.id).unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Completed);
    assert_eq!(record.result, Some(result));

    let summary = h.scorer.stats().match_summary(fixture.id).unwrap();
    assert_eq!(summary.result_text.as_deref(), Some("Tigers won by 8 wickets"));
}

#[test]
fn test_defending_side_wins_by_runs() {
    let h = harness();
    let (fixture, first) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    first_innings_of_150(&h, &first);
    let chase = h.scorer.start_innings(fixture.id, 2, TIGERS, LIONS).unwrap();

    h.scorer.record_delivery(ball(&chase, 21, 22, 1).with_runs(4)).unwrap();
    let (_, result) = h.scorer.complete_innings(chase.id).unwrap();
    let result = result.unwrap();
    assert_eq!(result.winner, Some(LIONS));
    assert_eq!(result.margin, WinMargin::Runs(146));
    assert!(h.scorer.start_innings(fixture.id, 3, LIONS, TIGERS).is_err());
}

#[test]
fn test_test_match_stays_live_after_two_innings() {
    let h = harness();
    let (fixture, first) = live_match(&h, NewMatch::new(LIONS, TIGERS, MatchType::Test));
    h.scorer.record_delivery(ball(&first, 1, 2, 21).with_runs(2)).unwrap();
    h.scorer.complete_innings(first.id).unwrap();

    let second = h.scorer.start_innings(fixture.id, 2, TIGERS, LIONS).unwrap();
    assert_eq!(second.target, None);
    let outcome = h.scorer.record_delivery(ball(&second, 21, 22, 1).with_runs(3)).unwrap();
    assert!(!outcome.innings_completed);
    assert_eq!(outcome.innings.target, None);
    let (_, result) = h.scorer.complete_innings(second.id).unwrap();
    assert!(result.is_none());

    let record = h.store.match_by_id(fixture.id).unwrap().unwrap();
    assert_eq!(record.status, MatchStatus::Live);
    assert!(h.scorer.start_innings(fixture.id, 3, LIONS, TIGERS).is_ok());
}

// ------------------------------------------------------------------
// Lifecycle rules
// ------------------------------------------------------------------

#[test]
fn test_create_match_rules() {
    let h = harness();
    assert_eq!(
        h.scorer.create_match(NewMatch::t20(LIONS, LIONS)).unwrap_err(),
        ScoringError::Domain(DomainError::SameTeam(LIONS))
    );
    assert_eq!(
        h.scorer.create_match(NewMatch::t20(LIONS, TeamId(9))).unwrap_err(),
        ScoringError::Domain(DomainError::UnknownTeam(TeamId(9)))
    );
    let fixture = h.scorer.create_match(NewMatch::t20(LIONS, TIGERS)).unwrap();
    assert_eq!(fixture.status, MatchStatus::Scheduled);
    assert_eq!(fixture.over_limit, Some(20));
}

#[test]
fn test_toss_recorded_once() {
    let h = harness();
    let fixture = h.scorer.create_match(NewMatch::t20(LIONS, TIGERS)).unwrap();

    let err = h.scorer.record_toss(fixture.id, Some(TeamId(9)), Some(TossDecision::Bat)).unwrap_err();
    assert!(matches!(err, ScoringError::Domain(DomainError::InvalidToss { .. })));

    let record = h.scorer.record_toss(fixture.id, Some(TIGERS), Some(TossDecision::Field)).unwrap();
    assert_eq!(record.toss.unwrap().winner, TIGERS);

    let again = h.scorer.record_toss(fixture.id, Some(LIONS), Some(TossDecision::Bat)).unwrap_err();
    assert_eq!(again, ScoringError::Domain(DomainError::TossAlreadyRecorded(fixture.id)));
}

#[test]
fn test_legacy_toss_is_repaired() {
    let h = harness_with(ScoringConfig::legacy(), RecordingBroadcaster::new());
    let fixture = h.scorer.create_match(NewMatch::t20(LIONS, TIGERS)).unwrap();
    let record = h.scorer.record_toss(fixture.id, Some(TeamId(9)), None).unwrap();
    assert!(fixture.involves(record.toss.unwrap().winner));
}

#[test]
fn test_start_innings_rules() {
    let h = harness();
    let (fixture, first) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let cases = [
        (5, LIONS, TIGERS, ScoringError::Validation(ValidationError::InvalidInningsNumber { number: 5 })),
        (
            1,
            LIONS,
            TIGERS,
            ScoringError::Domain(DomainError::DuplicateInnings { match_id: fixture.id, number: 1 }),
        ),
        (2, TIGERS, LIONS, ScoringError::Domain(DomainError::PreviousInningsOpen { number: 2, previous: 1 })),
        (2, TIGERS, TIGERS, ScoringError::Domain(DomainError::SameTeam(TIGERS))),
        (
            2,
            TeamId(9),
            LIONS,
            ScoringError::Domain(DomainError::TeamNotInMatch { match_id: fixture.id, team: TeamId(9) }),
        ),
    ];
    for (number, batting, bowling, expected) in cases {
        assert_eq!(h.scorer.start_innings(fixture.id, number, batting, bowling).unwrap_err(), expected);
    }

    h.scorer.complete_innings(first.id).unwrap();
    assert!(h.scorer.start_innings(fixture.id, 2, TIGERS, LIONS).is_ok());
}

#[test]
fn test_first_innings_makes_match_live() {
    let h = harness();
    let fixture = h.scorer.create_match(NewMatch::t20(LIONS, TIGERS)).unwrap();
    h.scorer.start_innings(fixture.id, 1, TIGERS, LIONS).unwrap();
    let live = h.scorer.stats().live_matches().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, fixture.id);
    assert_eq!(h.broadcaster.kinds(), vec![BroadcastKind::MatchStatus]);
}

#[test]
fn test_abandoned_match_takes_no_more_balls() {
    let h = harness();
    let (fixture, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap();

    let record = h.scorer.abandon_match(fixture.id).unwrap();
    assert_eq!(record.status, MatchStatus::Abandoned);

    let err = h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap_err();
    assert!(matches!(err, ScoringError::Domain(DomainError::MatchClosed { .. })));
    assert!(matches!(
        h.scorer.abandon_match(fixture.id).unwrap_err(),
        ScoringError::Domain(DomainError::InvalidStatusTransition { .. })
    ));
    assert_eq!(
        h.scorer.stats().match_summary(fixture.id).unwrap().result_text.as_deref(),
        Some("Match abandoned")
    );
}

// ------------------------------------------------------------------
// Rejections leave no trace
// ------------------------------------------------------------------

#[test]
fn test_invalid_input_changes_nothing() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    let err = h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(8)).unwrap_err();
    assert!(err.is_validation());
    let err = h
        .scorer
        .record_delivery(ball(&innings, 1, 2, 21).with_extras(ExtraType::Bye, -1))
        .unwrap_err();
    assert!(err.is_validation());
    let err = h.scorer.record_delivery(ball(&innings, 1, 99, 21)).unwrap_err();
    assert_eq!(err, ScoringError::Domain(DomainError::UnknownPlayer(PlayerId(99))));
    let missing = InningsId::new();
    let err = h
        .scorer
        .record_delivery(DeliveryInput::new(missing, PlayerId(1), PlayerId(2), PlayerId(21)))
        .unwrap_err();
    assert_eq!(err, ScoringError::Domain(DomainError::InningsNotFound(missing)));

    assert_eq!(h.store.delivery_count(), 0);
    assert!(h.store.batting_cards(innings.id).unwrap().is_empty());
    assert_eq!(stored_innings(&h, &innings).total_runs, 0);
}

#[test]
fn test_storage_failure_is_atomic_and_retryable() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(2)).unwrap();

    let input = ball(&innings, 1, 2, 21).with_runs(4);
    h.store.fail_next_writes(1);
    let err = h.scorer.record_delivery(input.clone()).unwrap_err();
    assert!(matches!(err, ScoringError::Storage(StorageError::Unavailable(_))));
    assert!(err.is_retryable());

    assert_eq!(h.store.delivery_count(), 1);
    assert_eq!(stored_innings(&h, &innings).total_runs, 2);
    assert_eq!(h.store.batting_card(innings.id, PlayerId(1)).unwrap().unwrap().runs, 2);
    assert_eq!(h.store.bowling_card(innings.id, PlayerId(21)).unwrap().unwrap().balls_bowled, 1);

    let retried = h.scorer.record_delivery(input).unwrap();
    assert_eq!(retried.delivery.sequence, 1);
    assert_eq!(retried.delivery.position(), BallPosition { over_number: 0, ball_number: 2 });
    assert_eq!(retried.innings.total_runs, 6);
    assert!(h.scorer.stats().verify_innings(innings.id).unwrap().is_consistent());
}

// ------------------------------------------------------------------
// Strike
// ------------------------------------------------------------------

#[test]
fn test_enforced_strike_rotation() {
    let h = harness_with(ScoringConfig::strict(), RecordingBroadcaster::new());
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));

    h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(1)).unwrap();
    let err = h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap_err();
    assert!(matches!(err, ScoringError::Domain(DomainError::StrikeMismatch { .. })));

    for _ in 0..4 {
        h.scorer.record_delivery(ball(&innings, 2, 1, 21)).unwrap();
    }
    // last ball of the over: no run, ends change for the new over
    h.scorer.record_delivery(ball(&innings, 2, 1, 21)).unwrap();
    assert_eq!(h.scorer.current_batsmen(innings.id).unwrap(), vec![PlayerId(1), PlayerId(2)]);

    h.scorer
        .record_delivery(ball(&innings, 1, 2, 22).with_wicket(WicketType::Stumped, PlayerId(1)))
        .unwrap();
    assert_eq!(
        h.scorer.expected_strike(innings.id).unwrap(),
        ExpectedStrike::AfterWicket { survivor: PlayerId(2), dismissed: PlayerId(1) }
    );
    assert!(h.scorer.record_delivery(ball(&innings, 1, 2, 22)).is_err());
    assert!(h.scorer.record_delivery(ball(&innings, 3, 2, 22)).is_ok());
}

#[test]
fn test_trusted_strike_records_caller_pair() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(1)).unwrap();
    let outcome = h.scorer.record_delivery(ball(&innings, 1, 2, 21)).unwrap();
    assert_eq!(outcome.delivery.striker, PlayerId(1));
    assert_eq!(h.scorer.current_batsmen(innings.id).unwrap(), vec![PlayerId(1), PlayerId(2)]);
}

// ------------------------------------------------------------------
// Live updates
// ------------------------------------------------------------------

#[test]
fn test_broadcast_after_commit() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    h.broadcaster.clear();

    h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(4)).unwrap();
    assert_eq!(h.broadcaster.kinds(), vec![BroadcastKind::BallUpdate, BroadcastKind::ScoreUpdate]);
    let ball_update = &h.broadcaster.messages()[0];
    assert_eq!(ball_update.payload["commentary"], "1.1 Tiger 1 to Lion 1, FOUR");

    h.broadcaster.clear();
    h.store.fail_next_writes(1);
    assert!(h.scorer.record_delivery(ball(&innings, 1, 2, 21)).is_err());
    assert!(h.broadcaster.messages().is_empty());
}

#[test]
fn test_failed_broadcast_keeps_the_ball() {
    let h = harness_with(ScoringConfig::default(), RecordingBroadcaster::failing());
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    let outcome = h.scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(6)).unwrap();
    assert_eq!(outcome.innings.total_runs, 6);
    assert_eq!(h.store.delivery_count(), 1);
}

// ------------------------------------------------------------------
// Concurrency
// ------------------------------------------------------------------

#[test]
fn test_concurrent_deliveries_get_distinct_positions() {
    let h = harness();
    let (_, innings) = live_match(&h, NewMatch::t20(LIONS, TIGERS).with_over_limit(None));

    std::thread::scope(|scope| {
        for worker in 0..4u32 {
            let scorer = &h.scorer;
            let innings = &innings;
            scope.spawn(move || {
                for _ in 0..25 {
                    scorer.record_delivery(ball(innings, 1, 2, 21 + worker)).unwrap();
                }
            });
        }
    });

    let log = h.store.deliveries(innings.id).unwrap();
    assert_eq!(log.len(), 100);
    for (i, d) in log.iter().enumerate() {
        assert_eq!(d.sequence as usize, i);
        assert_eq!(d.over_number, i as u32 / 6);
        assert_eq!(u32::from(d.ball_number), i as u32 % 6 + 1);
    }
    assert_eq!(stored_innings(&h, &innings).legal_balls, 100);
    assert!(h.scorer.stats().verify_innings(innings.id).unwrap().is_consistent());
}

#[test]
fn test_innings_of_different_matches_in_parallel() {
    let h = harness();
    let (_, a) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    let (_, b) = live_match(&h, NewMatch::t20(TIGERS, LIONS));

    std::thread::scope(|scope| {
        for innings in [&a, &b] {
            let scorer = &h.scorer;
            scope.spawn(move || {
                for _ in 0..30 {
                    scorer.record_delivery(ball(innings, 1, 2, 21).with_runs(1)).unwrap();
                }
            });
        }
    });

    assert_eq!(stored_innings(&h, &a).total_runs, 30);
    assert_eq!(stored_innings(&h, &b).total_runs, 30);
}

#[test]
fn test_lock_slots_released_once_closed() {
    let h = harness();
    let (fixture, first) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    h.scorer.record_delivery(ball(&first, 1, 2, 21).with_runs(2)).unwrap();
    h.scorer.complete_innings(first.id).unwrap();
    assert!(h.scorer.innings_locks.is_empty());
    assert_eq!(h.scorer.match_locks.len(), 1);

    let second = h.scorer.start_innings(fixture.id, 2, TIGERS, LIONS).unwrap();
    let outcome = h.scorer.record_delivery(ball(&second, 21, 22, 1).with_runs(3)).unwrap();
    assert!(outcome.match_result.is_some());
    assert!(h.scorer.innings_locks.is_empty());
    assert!(h.scorer.match_locks.is_empty());

    let (other, _) = live_match(&h, NewMatch::t20(LIONS, TIGERS));
    assert_eq!(h.scorer.match_locks.len(), 1);
    h.scorer.abandon_match(other.id).unwrap();
    assert!(h.scorer.match_locks.is_empty());
}

/// Holds the first ball update until the test opens the gate.
struct GatedBroadcaster {
    entered: mpsc::SyncSender<()>,
    gate: parking_lot::Mutex<Option<mpsc::Receiver<()>>>,
}

impl Broadcaster for GatedBroadcaster {
    fn publish(&self, message: BroadcastMessage) -> std::result::Result<(), broadcast::BroadcastError> {
        if message.kind == BroadcastKind::BallUpdate {
            let gate = self.gate.lock().take();
            if let Some(gate) = gate {
                let _ = self.entered.send(());
                let _ = gate.recv();
            }
        }
        Ok(())
    }
}

#[test]
fn test_slow_broadcast_does_not_hold_the_innings() {
    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let (open_tx, open_rx) = mpsc::channel();
    let broadcaster = GatedBroadcaster { entered: entered_tx, gate: parking_lot::Mutex::new(Some(open_rx)) };
    let store = Arc::new(MemoryStore::new());
    let ctx = ScoringContext::new(store, Arc::new(broadcaster), registry(), ScoringConfig::default());
    let scorer = Scorer::new(ctx);
    let fixture = scorer.create_match(NewMatch::t20(LIONS, TIGERS)).unwrap();
    let innings = scorer.start_innings(fixture.id, 1, LIONS, TIGERS).unwrap();

    std::thread::scope(|scope| {
        let first = scope.spawn(|| scorer.record_delivery(ball(&innings, 1, 2, 21).with_runs(4)));
        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let (scorer, innings) = (&scorer, &innings);
        scope.spawn(move || {
            let _ = done_tx.send(scorer.record_delivery(ball(innings, 1, 2, 21)));
        });
        let second = done_rx.recv_timeout(Duration::from_secs(5));
        open_tx.send(()).unwrap();

        let second = second.expect("second ball waited on the first ball's broadcast").unwrap();
        assert_eq!(second.delivery.sequence, 1);
        assert_eq!(first.join().unwrap().unwrap().delivery.sequence, 0);
    });
}

// ------------------------------------------------------------------
// Properties over random innings
// ------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Ball {
    runs: i32,
    extra: u8,
    extra_runs: i32,
    wicket: bool,
}

fn ball_strategy() -> impl Strategy<Value = Ball> {
    (0..=6i32, 0..8u8, 1..=4i32, prop::bool::weighted(0.08)).prop_map(|(runs, extra, extra_runs, wicket)| Ball {
        runs,
        extra,
        extra_runs,
        wicket,
    })
}

fn to_input(innings: &Innings, b: &Ball, striker: u32, non_striker: u32, bowler: u32) -> DeliveryInput {
    let mut input = ball(innings, striker, non_striker, bowler).with_runs(b.runs);
    input = match b.extra {
        4 => input.with_extras(ExtraType::Wide, b.extra_runs),
        5 => input.with_extras(ExtraType::NoBall, b.extra_runs),
        6 => input.with_runs(0).with_extras(ExtraType::Bye, b.extra_runs),
        7 => input.with_runs(0).with_extras(ExtraType::LegBye, b.extra_runs),
        _ => input,
    };
    if b.wicket {
        input = input.with_wicket(WicketType::Caught, PlayerId(striker)).with_fielder(PlayerId(50));
    }
    input
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_innings_stays_consistent(balls in prop::collection::vec(ball_strategy(), 1..150)) {
        let h = harness_with(
            ScoringConfig { require_registered_players: false, ..ScoringConfig::default() },
            RecordingBroadcaster::new(),
        );
        let (_, innings) = live_match(&h, NewMatch::new(LIONS, TIGERS, MatchType::Custom));

        let (mut striker, non_striker, mut next_batter) = (1u32, 2u32, 3u32);
        for (n, b) in balls.iter().enumerate() {
            let bowler = 100 + (n as u32 / 6) % 3;
            match h.scorer.record_delivery(to_input(&innings, b, striker, non_striker, bowler)) {
                Ok(outcome) => {
                    if b.wicket {
                        striker = next_batter;
                        next_batter += 1;
                    }
                    if outcome.innings_completed {
                        break;
                    }
                }
                Err(err) => return Err(TestCaseError::fail(format!("rejected: {}", err))),
            }
        }

        let log = h.store.deliveries(innings.id).unwrap();
        let stored = stored_innings(&h, &innings);

        // numbering: every delivery sits where the next legal ball would
        let mut legal = 0u32;
        for d in &log {
            prop_assert_eq!(d.over_number, legal / 6);
            prop_assert_eq!(u32::from(d.ball_number), legal % 6 + 1);
            let illegal = matches!(d.extra_type, Some(ExtraType::Wide) | Some(ExtraType::NoBall));
            prop_assert_eq!(d.is_legal_delivery, !illegal);
            prop_assert_eq!(d.total_runs(), d.runs_scored + d.extra_runs);
            if d.is_legal_delivery {
                legal += 1;
            }
        }

        prop_assert_eq!(stored.legal_balls, legal);
        prop_assert!((stored.total_overs - overs_from_balls(legal)).abs() < 1e-9);
        prop_assert_eq!(stored.total_wickets as usize, log.iter().filter(|d| d.is_wicket).count());
        prop_assert_eq!(stored.total_runs, log.iter().map(|d| d.total_runs()).sum::<u32>());

        let stands = h.store.partnerships(innings.id).unwrap();
        prop_assert!(stands.iter().filter(|p| p.is_active).count() <= 1);

        let report = h.scorer.stats().verify_innings(innings.id).unwrap();
        prop_assert!(report.is_consistent(), "{:?}", report.mismatches);
    }
}
