//! One-line ball commentary for live updates.

use crate::models::{DeliveryEvent, ExtraType};
use crate::registry::Registry;

/// `"3.4 Starc to Smith, FOUR"` style line for a committed delivery.
pub fn describe(delivery: &DeliveryEvent, registry: &dyn Registry) -> String {
    let lead = format!(
        "{} {} to {}",
        delivery.over_display(),
        registry.player_name(delivery.bowler),
        registry.player_name(delivery.striker)
    );
    format!("{}, {}", lead, outcome(delivery, registry))
}

fn outcome(delivery: &DeliveryEvent, registry: &dyn Registry) -> String {
    if delivery.is_wicket {
        let batter = delivery.dismissed_player.unwrap_or(delivery.striker);
        let how = delivery.wicket_type.map(|w| w.as_str()).unwrap_or("out");
        return format!("OUT! {} {}", registry.player_name(batter), how);
    }

    match delivery.extra_type {
        Some(ExtraType::Wide) => return format!("wide, {}", runs(delivery.total_runs())),
        Some(ExtraType::NoBall) => return format!("no-ball, {}", runs(delivery.total_runs())),
        Some(extra) if delivery.runs_scored == 0 => {
            return format!("{} {}", delivery.extra_runs, extra.as_str())
        }
        _ => {}
    }

    match delivery.runs_scored {
        6 => "SIX".to_string(),
        4 => "FOUR".to_string(),
        0 if delivery.total_runs() == 0 => "dot ball".to_string(),
        _ => runs(delivery.total_runs()),
    }
}

fn runs(n: u32) -> String {
    if n == 1 {
        "1 run".to_string()
    } else {
        format!("{} runs", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InningsId, PlayerId, TeamId, WicketType};
    use crate::registry::MemoryRegistry;
    use chrono::Utc;

    fn registry() -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        registry
            .add_player(PlayerId(1), "Smith", TeamId(1))
            .add_player(PlayerId(11), "Starc", TeamId(2));
        registry
    }

    fn delivery(runs: u32) -> DeliveryEvent {
        DeliveryEvent {
            innings_id: InningsId::new(),
            sequence: 21,
            over_number: 3,
            ball_number: 4,
            striker: PlayerId(1),
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
    fn test_boundary_lines() {
        let registry = registry();
        assert_eq!(describe(&delivery(4), &registry), "4.4 Starc to Smith, FOUR");
        assert_eq!(describe(&delivery(6), &registry), "4.4 Starc to Smith, SIX");
        assert_eq!(describe(&delivery(0), &registry), "4.4 Starc to Smith, dot ball");
        assert_eq!(describe(&delivery(1), &registry), "4.4 Starc to Smith, 1 run");
    }

    #[test]
    fn test_extras_and_wickets() {
        let registry = registry();
        let mut wide = delivery(0);
        wide.extra_type = Some(ExtraType::Wide);
        wide.extra_runs = 1;
        wide.is_legal_delivery = false;
        assert!(describe(&wide, &registry).ends_with("wide, 1 run"));

        let mut leg_byes = delivery(0);
        leg_byes.extra_type = Some(ExtraType::LegBye);
        leg_byes.extra_runs = 2;
        assert!(describe(&leg_byes, &registry).ends_with("2 leg-bye"));

        let mut out = delivery(0);
        out.is_wicket = true;
        out.wicket_type = Some(WicketType::Lbw);
        out.dismissed_player = Some(PlayerId(1));
        assert!(describe(&out, &registry).ends_with("OUT! Smith lbw"));
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let registry = MemoryRegistry::new();
        assert_eq!(describe(&delivery(2), &registry), "4.4 Unknown to Unknown, 2 runs");
    }
}
