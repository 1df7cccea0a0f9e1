//! State bucket selection.

use timecrunch_types::StateName;

use crate::definition::States;

/// Pick the state whose bucket holds `count`.
///
/// Buckets are the half-open ranges between ascending thresholds, the last
/// one unbounded. A count below the smallest threshold wraps around to the
/// highest state, so `{ winter: 11, spring: 3 }` reads as winter for 0..3.
/// A single state always matches.
pub fn select_state(mut states: States, count: i64) -> Option<StateName> {
    // Stable: equal thresholds keep declaration order.
    states.sort_by_key(|(_, threshold)| *threshold);

    if states.len() == 1 {
        return states.pop().map(|(name, _)| name);
    }

    let lowest = states.first()?.1;
    if count < lowest {
        return states.pop().map(|(name, _)| name);
    }

    let upper_bounds = states
        .iter()
        .skip(1)
        .map(|(_, threshold)| Some(*threshold))
        .chain([None]);

    states
        .iter()
        .zip(upper_bounds)
        .find(|((_, lower), upper)| *lower <= count && upper.is_none_or(|upper| count < upper))
        .map(|((name, _), _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasons() -> States {
        vec![
            ("winter".to_string(), 11),
            ("spring".to_string(), 3),
            ("summer".to_string(), 5),
            ("fall".to_string(), 9),
        ]
    }

    #[test]
    fn test_seasons() {
        assert_eq!(select_state(seasons(), 0).as_deref(), Some("winter"));
        assert_eq!(select_state(seasons(), 2).as_deref(), Some("winter"));
        assert_eq!(select_state(seasons(), 3).as_deref(), Some("spring"));
        assert_eq!(select_state(seasons(), 5).as_deref(), Some("summer"));
        assert_eq!(select_state(seasons(), 10).as_deref(), Some("fall"));
        assert_eq!(select_state(seasons(), 11).as_deref(), Some("winter"));
    }

    #[test]
    fn test_single_state_always_matches() {
        let states = vec![("day".to_string(), 6)];
        assert_eq!(select_state(states.clone(), 0).as_deref(), Some("day"));
        assert_eq!(select_state(states, 99).as_deref(), Some("day"));
    }

    #[test]
    fn test_empty_states_match_nothing() {
        assert_eq!(select_state(Vec::new(), 0), None);
    }

    #[test]
    fn test_equal_thresholds_keep_declaration_order() {
        let states = vec![
            ("dawn".to_string(), 6),
            ("day".to_string(), 6),
            ("night".to_string(), 20),
        ];
        // dawn's bucket is empty; day owns [6, 20)
        assert_eq!(select_state(states, 7).as_deref(), Some("day"));
    }
}
