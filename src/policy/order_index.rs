//! Fractional order indexes for lists and tasks.
//!
//! New siblings are appended at `max + STEP`, insertions between two siblings take
//! the midpoint, and the whole sibling set is renumbered once the numeric space
//! above the minimum (or between two neighbours) runs out.

use crate::error::{PlanworkError, Result};

pub const STEP: f64 = 1000.0;
pub const INITIAL: f64 = 1000.0;

/// Position for an item appended after every existing sibling.
pub fn calculate_top_position(current_max: Option<f64>) -> f64 {
    match current_max {
        Some(max) => max + STEP,
        None => INITIAL,
    }
}

/// Position for an item placed before every existing sibling.
pub fn calculate_insert_at_top(current_min: Option<f64>) -> Result<f64> {
    let Some(min) = current_min else {
        return Ok(INITIAL);
    };
    let position = min - STEP;
    if position <= 0.0 {
        return Err(PlanworkError::capacity_exceeded(format!(
            "no room above order index {min}"
        )));
    }
    Ok(position)
}

/// Position for an item placed directly after `before`. `after` is the next
/// sibling, or `None` when `before` is the last one.
pub fn calculate_between(before: f64, after: Option<f64>) -> Result<f64> {
    let Some(after) = after else {
        return Ok(calculate_top_position(Some(before)));
    };
    let (low, high) = if before <= after { (before, after) } else { (after, before) };
    let mid = low + (high - low) / 2.0;
    if mid <= low || mid >= high {
        return Err(PlanworkError::capacity_exceeded(format!(
            "no room between order indexes {low} and {high}"
        )));
    }
    Ok(mid)
}

/// `count` evenly spaced indexes starting at `start_index`.
pub fn generate_reindexed_order(count: usize, start_index: f64) -> Vec<f64> {
    (0..count).map(|i| start_index + STEP * i as f64).collect()
}

pub fn needs_reindexing(min_index: f64) -> bool {
    min_index <= STEP
}

/// Start index for a renumbering that must leave room for one top insertion.
pub fn reindex_start_for_top_insert() -> f64 {
    INITIAL + STEP
}

/// Requested position of an item among its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// After every sibling.
    Bottom,
    /// Before every sibling.
    Top,
    /// An explicit order index chosen by the caller.
    Index(f64),
    /// Directly after the sibling with this id.
    After(String),
}

impl Placement {
    /// Where a renumbering should start so that a retry of this placement succeeds.
    pub fn reindex_start(&self) -> f64 {
        match self {
            Self::Top => reindex_start_for_top_insert(),
            _ => INITIAL,
        }
    }
}

/// Order index for `placement` given the siblings (excluding the moved item),
/// sorted ascending by order index.
pub fn position_for(siblings: &[(String, f64)], placement: &Placement) -> Result<f64> {
    match placement {
        Placement::Bottom => Ok(calculate_top_position(siblings.last().map(|s| s.1))),
        Placement::Top => calculate_insert_at_top(siblings.first().map(|s| s.1)),
        Placement::Index(index) => {
            if !index.is_finite() || *index <= 0.0 {
                return Err(PlanworkError::validation(format!(
                    "order index must be a positive number, got {index}"
                )));
            }
            Ok(*index)
        }
        Placement::After(target) => {
            let pos = siblings
                .iter()
                .position(|(id, _)| id == target)
                .ok_or_else(|| PlanworkError::invariant(format!("{target} is not a sibling")))?;
            calculate_between(siblings[pos].1, siblings.get(pos + 1).map(|s| s.1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn top_position_starts_at_initial() {
        assert_eq!(calculate_top_position(None), INITIAL);
        assert_eq!(calculate_top_position(Some(3000.0)), 4000.0);
    }

    #[test]
    fn top_position_is_strictly_greater() {
        for max in [0.5, 1000.0, 1234.5, 1e9] {
            assert!(calculate_top_position(Some(max)) > max);
        }
    }

    #[test]
    fn insert_at_top_is_strictly_smaller() {
        assert_eq!(calculate_insert_at_top(None).unwrap(), INITIAL);
        for min in [1000.5, 2000.0, 50_000.0] {
            assert!(calculate_insert_at_top(Some(min)).unwrap() < min);
        }
    }

    #[test]
    fn insert_at_top_fails_when_space_is_exhausted() {
        let err = calculate_insert_at_top(Some(1000.0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::CapacityExceeded);
        assert!(calculate_insert_at_top(Some(400.0)).is_err());
    }

    #[test]
    fn reindexed_order_is_evenly_spaced() {
        let order = generate_reindexed_order(5, INITIAL);
        assert_eq!(order, vec![1000.0, 2000.0, 3000.0, 4000.0, 5000.0]);
        let order = generate_reindexed_order(3, 2000.0);
        assert_eq!(order, vec![2000.0, 3000.0, 4000.0]);
        assert!(generate_reindexed_order(0, INITIAL).is_empty());
        assert!(order.windows(2).all(|w| w[1] - w[0] == STEP));
    }

    #[test]
    fn needs_reindexing_threshold() {
        assert!(needs_reindexing(1000.0));
        assert!(needs_reindexing(1.0));
        assert!(!needs_reindexing(1000.001));
        assert!(!needs_reindexing(2000.0));
    }

    #[test]
    fn midpoint_lies_strictly_between() {
        let mid = calculate_between(1000.0, Some(2000.0)).unwrap();
        assert_eq!(mid, 1500.0);
        let mid = calculate_between(1000.0, Some(1000.5)).unwrap();
        assert!(mid > 1000.0 && mid < 1000.5);
    }

    #[test]
    fn midpoint_after_last_item_appends() {
        assert_eq!(calculate_between(3000.0, None).unwrap(), 4000.0);
    }

    #[test]
    fn repeated_bisection_eventually_exhausts() {
        let low = 1000.0;
        let mut high = 2000.0;
        let mut exhausted = false;
        for _ in 0..200 {
            match calculate_between(low, Some(high)) {
                Ok(mid) => high = mid,
                Err(e) => {
                    assert_eq!(e.code, ErrorCode::CapacityExceeded);
                    exhausted = true;
                    break;
                }
            }
        }
        assert!(exhausted);
    }

    fn siblings(indexes: &[f64]) -> Vec<(String, f64)> {
        indexes
            .iter()
            .enumerate()
            .map(|(i, idx)| (format!("s{i}"), *idx))
            .collect()
    }

    #[test]
    fn position_for_each_placement() {
        let sibs = siblings(&[2000.0, 3000.0, 4000.0]);
        assert_eq!(position_for(&sibs, &Placement::Bottom).unwrap(), 5000.0);
        assert_eq!(position_for(&sibs, &Placement::Top).unwrap(), 1000.0);
        assert_eq!(position_for(&sibs, &Placement::Index(42.0)).unwrap(), 42.0);
        assert_eq!(position_for(&sibs, &Placement::After("s0".into())).unwrap(), 2500.0);
        assert_eq!(position_for(&sibs, &Placement::After("s2".into())).unwrap(), 5000.0);
        assert_eq!(position_for(&[], &Placement::Top).unwrap(), INITIAL);
        assert_eq!(position_for(&[], &Placement::Bottom).unwrap(), INITIAL);
    }

    #[test]
    fn position_for_rejects_bad_input() {
        let sibs = siblings(&[1000.0]);
        assert_eq!(
            position_for(&sibs, &Placement::Index(-1.0)).unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert!(position_for(&sibs, &Placement::Index(f64::NAN)).is_err());
        assert_eq!(
            position_for(&sibs, &Placement::After("nope".into())).unwrap_err().code,
            ErrorCode::InvariantViolation
        );
        assert_eq!(
            position_for(&sibs, &Placement::Top).unwrap_err().code,
            ErrorCode::CapacityExceeded
        );
    }

    #[test]
    fn repeated_top_insertion_triggers_reindex() {
        let mut min = 10_000.0;
        let mut inserts = 0;
        while !needs_reindexing(min) {
            min = calculate_insert_at_top(Some(min)).unwrap();
            inserts += 1;
        }
        assert_eq!(inserts, 9);
        assert!(calculate_insert_at_top(Some(min)).is_err());

        let renumbered = generate_reindexed_order(10, reindex_start_for_top_insert());
        assert!(calculate_insert_at_top(renumbered.first().copied()).is_ok());
    }
}
