//! Structural rules over a user's set of lists.
//!
//! Every user owns exactly one Done list and at least one backlog. The Done list is
//! immutable; backlogs and intermediate lists may change role as long as the
//! backlog floor of one holds. Functions here are pure: callers load the user's
//! lists, ask what is legal, then apply the answer inside a transaction.

use crate::error::{PlanworkError, Result};
use crate::models::{ListRole, TaskList};

/// Compensating actions required when a list is deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionCompensation {
    /// Intermediate list to flag as backlog.
    pub promote: Option<String>,
    pub reassign_origin_backlog_from: Option<String>,
    pub reassign_origin_backlog_to: Option<String>,
}

fn by_order<'a>(lists: impl Iterator<Item = &'a TaskList>) -> Vec<&'a TaskList> {
    let mut sorted: Vec<&TaskList> = lists.collect();
    sorted.sort_by(|a, b| {
        a.order_index
            .total_cmp(&b.order_index)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

fn others<'a>(list: &'a TaskList, all: &'a [TaskList]) -> impl Iterator<Item = &'a TaskList> {
    all.iter().filter(move |l| l.id != list.id)
}

pub fn backlog_count(all: &[TaskList]) -> usize {
    all.iter().filter(|l| l.role() == ListRole::Backlog).count()
}

/// Leftmost intermediate list other than `list`.
fn first_intermediate<'a>(list: &'a TaskList, all: &'a [TaskList]) -> Option<&'a TaskList> {
    by_order(others(list, all).filter(|l| l.is_intermediate()))
        .into_iter()
        .next()
}

fn first_backlog<'a>(list: &'a TaskList, all: &'a [TaskList]) -> Option<&'a TaskList> {
    by_order(others(list, all).filter(|l| l.role() == ListRole::Backlog))
        .into_iter()
        .next()
}

pub fn can_delete(list: &TaskList, all: &[TaskList]) -> bool {
    check_delete(list, all).is_ok()
}

pub fn check_delete(list: &TaskList, all: &[TaskList]) -> Result<()> {
    match list.role() {
        ListRole::Done => Err(PlanworkError::invariant("the Done list cannot be deleted")),
        ListRole::Backlog => {
            if first_backlog(list, all).is_some() || first_intermediate(list, all).is_some() {
                Ok(())
            } else {
                Err(PlanworkError::invariant(
                    "cannot delete the last backlog without another list to promote",
                ))
            }
        }
        ListRole::Intermediate => Ok(()),
    }
}

/// Promotion and origin-backlog reassignment needed before `list` is removed.
/// Assumes `check_delete` passed.
pub fn resolve_deletion_compensation(list: &TaskList, all: &[TaskList]) -> DeletionCompensation {
    if list.role() != ListRole::Backlog {
        return DeletionCompensation::default();
    }

    if let Some(next) = first_backlog(list, all) {
        return DeletionCompensation {
            promote: None,
            reassign_origin_backlog_from: Some(list.id.clone()),
            reassign_origin_backlog_to: Some(next.id.clone()),
        };
    }

    match first_intermediate(list, all) {
        Some(promoted) => DeletionCompensation {
            promote: Some(promoted.id.clone()),
            reassign_origin_backlog_from: Some(list.id.clone()),
            reassign_origin_backlog_to: Some(promoted.id.clone()),
        },
        None => DeletionCompensation::default(),
    }
}

/// Where the tasks of a deleted list go.
///
/// An explicit destination must be one of `all` (callers check ownership first),
/// must not be Done and must not be the list itself. Otherwise the leftmost
/// intermediate list is used, then the leftmost remaining backlog.
pub fn resolve_destination(
    list: &TaskList,
    explicit_dest: Option<&str>,
    all: &[TaskList],
) -> Result<String> {
    if let Some(dest_id) = explicit_dest {
        let dest = all
            .iter()
            .find(|l| l.id == dest_id)
            .ok_or_else(|| PlanworkError::list_not_found(dest_id))?;
        if dest.is_done {
            return Err(PlanworkError::invariant(
                "tasks cannot be relocated into the Done list",
            ));
        }
        if dest.id == list.id {
            return Err(PlanworkError::invariant(
                "destination must differ from the list being deleted",
            ));
        }
        return Ok(dest.id.clone());
    }

    first_intermediate(list, all)
        .or_else(|| first_backlog(list, all))
        .map(|l| l.id.clone())
        .ok_or_else(|| PlanworkError::invariant("no list available to receive the tasks"))
}

pub fn can_toggle_backlog_off(list: &TaskList, backlog_count: usize) -> bool {
    !list.is_done && backlog_count > 1
}

pub fn can_toggle_backlog_on(list: &TaskList) -> bool {
    !list.is_done
}

/// Validates flipping the backlog flag of `list`.
pub fn check_toggle_backlog(list: &TaskList, all: &[TaskList]) -> Result<()> {
    if list.is_done {
        return Err(PlanworkError::invariant(
            "the Done list cannot become a backlog",
        ));
    }
    if list.is_backlog && !can_toggle_backlog_off(list, backlog_count(all)) {
        return Err(PlanworkError::invariant(
            "at least one backlog list must remain",
        ));
    }
    if !list.is_backlog && !can_toggle_backlog_on(list) {
        return Err(PlanworkError::invariant("list cannot become a backlog"));
    }
    Ok(())
}

/// Rename, recolour and reorder are rejected for the Done list.
pub fn check_mutable(list: &TaskList, action: &str) -> Result<()> {
    if list.is_done {
        return Err(PlanworkError::invariant(format!(
            "the Done list cannot be {action}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn list(id: &str, order: f64, role: ListRole) -> TaskList {
        TaskList {
            id: id.to_string(),
            user_id: "u".to_string(),
            name: id.to_string(),
            order_index: order,
            is_backlog: role == ListRole::Backlog,
            is_done: role == ListRole::Done,
            color: None,
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    fn standard() -> Vec<TaskList> {
        vec![
            list("backlog", 1.0, ListRole::Backlog),
            list("today", 2.0, ListRole::Intermediate),
            list("done", 99.0, ListRole::Done),
        ]
    }

    #[test]
    fn done_list_is_never_deletable() {
        let all = standard();
        assert!(!can_delete(&all[2], &all));
        let err = check_delete(&all[2], &all).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
    }

    #[test]
    fn sole_backlog_without_intermediate_is_not_deletable() {
        let all = vec![list("b", 1.0, ListRole::Backlog), list("d", 9.0, ListRole::Done)];
        assert!(!can_delete(&all[0], &all));
    }

    #[test]
    fn sole_backlog_with_intermediate_is_deletable() {
        let all = standard();
        assert!(can_delete(&all[0], &all));
        assert!(can_delete(&all[1], &all));
    }

    #[test]
    fn deleting_sole_backlog_promotes_leftmost_intermediate() {
        let mut all = standard();
        all.push(list("later", 0.5, ListRole::Intermediate));
        let comp = resolve_deletion_compensation(&all[0], &all);
        assert_eq!(comp.promote.as_deref(), Some("later"));
        assert_eq!(comp.reassign_origin_backlog_from.as_deref(), Some("backlog"));
        assert_eq!(comp.reassign_origin_backlog_to.as_deref(), Some("later"));
    }

    #[test]
    fn deleting_one_of_two_backlogs_reassigns_without_promotion() {
        let mut all = standard();
        all.push(list("side", 5.0, ListRole::Backlog));
        let comp = resolve_deletion_compensation(&all[0], &all);
        assert_eq!(comp.promote, None);
        assert_eq!(comp.reassign_origin_backlog_to.as_deref(), Some("side"));
    }

    #[test]
    fn deleting_intermediate_needs_no_compensation() {
        let all = standard();
        assert_eq!(resolve_deletion_compensation(&all[1], &all), DeletionCompensation::default());
    }

    #[test]
    fn destination_prefers_explicit_then_intermediate_then_backlog() {
        let mut all = standard();
        all.push(list("second", 3.0, ListRole::Backlog));
        assert_eq!(resolve_destination(&all[0], Some("second"), &all).unwrap(), "second");
        assert_eq!(resolve_destination(&all[0], None, &all).unwrap(), "today");
        assert_eq!(resolve_destination(&all[1], None, &all).unwrap(), "backlog");
    }

    #[test]
    fn explicit_destination_is_validated() {
        let all = standard();
        let err = resolve_destination(&all[1], Some("done"), &all).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
        let err = resolve_destination(&all[1], Some("today"), &all).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
        let err = resolve_destination(&all[1], Some("missing"), &all).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn no_destination_available() {
        let all = vec![list("only", 1.0, ListRole::Intermediate), list("d", 2.0, ListRole::Done)];
        assert!(resolve_destination(&all[0], None, &all).is_err());
    }

    #[test]
    fn backlog_floor_on_toggle() {
        let mut all = standard();
        assert!(!can_toggle_backlog_off(&all[0], backlog_count(&all)));
        assert!(check_toggle_backlog(&all[0], &all).is_err());
        assert!(check_toggle_backlog(&all[1], &all).is_ok());

        all[1].is_backlog = true;
        assert_eq!(backlog_count(&all), 2);
        assert!(check_toggle_backlog(&all[0], &all).is_ok());
        assert!(!can_toggle_backlog_on(&all[2]));
        assert!(check_toggle_backlog(&all[2], &all).is_err());
    }

    #[test]
    fn done_list_is_immutable() {
        let all = standard();
        assert!(check_mutable(&all[2], "renamed").is_err());
        assert!(check_mutable(&all[1], "renamed").is_ok());
    }
}
