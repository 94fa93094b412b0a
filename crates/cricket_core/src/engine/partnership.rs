//! Partnership tracking: one active stand per innings.

use crate::models::{DeliveryEvent, Partnership};

/// The stand a delivery belongs to: the active one, or a new one opened by
/// the delivery's batters when the previous stand ended.
pub fn current_or_open(
    active: Option<Partnership>,
    existing: u32,
    delivery: &DeliveryEvent,
) -> Partnership {
    active.unwrap_or_else(|| {
        Partnership::open(delivery.innings_id, delivery.striker, delivery.non_striker, existing)
    })
}

pub fn apply(partnership: &mut Partnership, delivery: &DeliveryEvent) {
    partnership.runs_scored += delivery.total_runs();
    if delivery.is_legal_delivery {
        partnership.balls_faced += 1;
    }
    if delivery.is_wicket {
        partnership.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraType, InningsId, PlayerId, WicketType};
    use chrono::Utc;

    fn delivery(innings: InningsId, runs: u32) -> DeliveryEvent {
        DeliveryEvent {
            innings_id: innings,
            sequence: 0,
            over_number: 0,
            ball_number: 1,
            striker: PlayerId(3),
            non_striker: PlayerId(2),
            bowler: PlayerId(11),
            runs_scored: runs,
            extra_type: None,
            extra_runs: 0,
            is_wicket: false,
            wicket_type: None,
            dismissed_player: None,
            fielder: None,
            is_legal_delivery: true,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_opens_with_index_after_fallen_stands() {
        let innings = InningsId::new();
        let stand = current_or_open(None, 2, &delivery(innings, 0));
        assert_eq!(stand.wickets_fallen, 2);
        assert!(stand.involves(PlayerId(3)) && stand.involves(PlayerId(2)));
        assert!(stand.is_active);
    }

    #[test]
    fn test_extras_count_and_wicket_closes() {
        let innings = InningsId::new();
        let mut stand = Partnership::open(innings, PlayerId(3), PlayerId(2), 0);

        let mut wide = delivery(innings, 0);
        wide.extra_type = Some(ExtraType::Wide);
        wide.extra_runs = 5;
        wide.is_legal_delivery = false;
        apply(&mut stand, &wide);
        assert_eq!((stand.runs_scored, stand.balls_faced), (5, 0));

        let mut out = delivery(innings, 1);
        out.is_wicket = true;
        out.wicket_type = Some(WicketType::RunOut);
        out.dismissed_player = Some(PlayerId(2));
        apply(&mut stand, &out);
        assert_eq!((stand.runs_scored, stand.balls_faced), (6, 1));
        assert!(!stand.is_active);
    }
}
