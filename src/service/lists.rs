use serde::Serialize;

use crate::db::list_repo::{self, NewList};
use crate::db::task_repo;
use crate::error::{PlanworkError, Result};
use crate::models::{ListColor, Task, TaskList};
use crate::policy::lifecycle;
use crate::policy::order_index::{self, Placement};

use super::{place_with_reindex, validate_text, Context, MAX_NAME_LEN};

#[derive(Debug, Clone, Serialize)]
pub struct DeletionOutcome {
    pub deleted: TaskList,
    pub destination: TaskList,
    pub promoted: Option<TaskList>,
    pub moved_tasks: usize,
    pub reassigned_tasks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListWithTasks {
    pub list: TaskList,
    pub tasks: Vec<Task>,
}

fn ensure_unique_name(conn: &rusqlite::Connection, user_id: &str, name: &str, except: Option<&str>) -> Result<()> {
    let clash = list_repo::list_lists_by_user(conn, user_id)?
        .into_iter()
        .any(|l| l.name.eq_ignore_ascii_case(name) && Some(l.id.as_str()) != except);
    if clash {
        return Err(PlanworkError::name_conflict(name));
    }
    Ok(())
}

/// Claim `requested` for a backlog, or allocate the next free colour.
fn claim_color(ctx: &Context, user_id: &str, requested: Option<ListColor>) -> Result<Option<ListColor>> {
    match requested {
        Some(color) => {
            if !ctx.palette.try_claim(user_id, color) {
                return Err(PlanworkError::invariant(format!(
                    "colour {} is already used by another backlog",
                    color.as_str()
                )));
            }
            Ok(Some(color))
        }
        None => Ok(ctx.palette.allocate(user_id)),
    }
}

pub fn create_list(
    ctx: &Context,
    user_id: &str,
    name: &str,
    is_backlog: bool,
    color: Option<ListColor>,
) -> Result<TaskList> {
    let name = validate_text("list name", name, MAX_NAME_LEN)?;
    if color.is_some() && !is_backlog {
        return Err(PlanworkError::validation("only backlog lists carry a colour"));
    }

    let list = ctx.transaction(|conn| {
        ensure_unique_name(conn, user_id, &name, None)?;
        let max = list_repo::max_order_index(conn, user_id)?;
        let color = if is_backlog { claim_color(ctx, user_id, color)? } else { None };
        let id = ulid::Ulid::new().to_string();
        list_repo::create_list(
            conn,
            &NewList {
                id: &id,
                user_id,
                name: &name,
                order_index: order_index::calculate_top_position(max),
                is_backlog,
                is_done: false,
                color,
            },
        )
    })?;

    tracing::info!(list = %list.name, id = %list.id, backlog = list.is_backlog, "list created");
    Ok(list)
}

pub fn show_list(ctx: &Context, user_id: &str, list_id: &str) -> Result<ListWithTasks> {
    let list = list_repo::get_owned_list(&ctx.conn, user_id, list_id)?;
    let tasks = task_repo::list_tasks_in_list(&ctx.conn, &list.id, list.is_done)?;
    Ok(ListWithTasks { list, tasks })
}

pub fn rename_list(ctx: &Context, user_id: &str, list_id: &str, name: &str) -> Result<TaskList> {
    let name = validate_text("list name", name, MAX_NAME_LEN)?;
    ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        lifecycle::check_mutable(&list, "renamed")?;
        ensure_unique_name(conn, user_id, &name, Some(&list.id))?;
        list_repo::update_name(conn, &list.id, &name)?;
        list_repo::get_list_by_id(conn, &list.id)
    })
}

/// Set or clear the colour of a backlog list.
pub fn set_color(ctx: &Context, user_id: &str, list_id: &str, color: Option<ListColor>) -> Result<TaskList> {
    ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        lifecycle::check_mutable(&list, "recoloured")?;
        if !list.is_backlog && color.is_some() {
            return Err(PlanworkError::validation("only backlog lists carry a colour"));
        }
        if list.color == color {
            return Ok(list);
        }
        if let Some(new_color) = color {
            claim_color(ctx, user_id, Some(new_color))?;
        }
        if let Some(old) = list.color {
            ctx.palette.release(user_id, old);
        }
        list_repo::update_color(conn, &list.id, color)?;
        list_repo::get_list_by_id(conn, &list.id)
    })
}

/// Flip a list between backlog and intermediate, keeping at least one backlog.
pub fn toggle_backlog(ctx: &Context, user_id: &str, list_id: &str) -> Result<TaskList> {
    let list = ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        let all = list_repo::list_lists_by_user(conn, user_id)?;
        lifecycle::check_toggle_backlog(&list, &all)?;

        if list.is_backlog {
            if let Some(color) = list.color {
                ctx.palette.release(user_id, color);
            }
            list_repo::update_backlog(conn, &list.id, false, None)?;
        } else {
            let color = ctx.palette.allocate(user_id);
            list_repo::update_backlog(conn, &list.id, true, color)?;
        }
        list_repo::get_list_by_id(conn, &list.id)
    })?;

    tracing::info!(list = %list.name, backlog = list.is_backlog, "backlog flag toggled");
    Ok(list)
}

/// Move a list among its siblings. The Done list never moves.
pub fn reorder_list(ctx: &Context, user_id: &str, list_id: &str, placement: Placement) -> Result<TaskList> {
    ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        lifecycle::check_mutable(&list, "reordered")?;

        if let Placement::After(ref target_id) = placement {
            let target = list_repo::get_owned_list(conn, user_id, target_id)?;
            if target.id == list.id {
                return Err(PlanworkError::invariant("a list cannot be placed after itself"));
            }
            if target.is_done {
                return Err(PlanworkError::invariant("lists cannot be placed after the Done list"));
            }
        }

        let siblings: Vec<(String, f64)> = list_repo::list_lists_by_user(conn, user_id)?
            .into_iter()
            .filter(|l| !l.is_done && l.id != list.id)
            .map(|l| (l.id, l.order_index))
            .collect();

        let index = place_with_reindex(conn, siblings, &placement, list_repo::update_order_index)?;
        tracing::debug!(list = %list.id, index, "list reordered");
        list_repo::update_order_index(conn, &list.id, index)?;
        list_repo::get_list_by_id(conn, &list.id)
    })
}

/// Delete a list, relocating its tasks and promoting a backlog if needed.
///
/// `destination` must already be resolved to a list id owned by the user.
pub fn delete_list(
    ctx: &Context,
    user_id: &str,
    list_id: &str,
    destination: Option<&str>,
) -> Result<DeletionOutcome> {
    let outcome = ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        if let Some(dest) = destination {
            list_repo::get_owned_list(conn, user_id, dest)?;
        }
        let all = list_repo::list_lists_by_user(conn, user_id)?;

        lifecycle::check_delete(&list, &all)?;
        let compensation = lifecycle::resolve_deletion_compensation(&list, &all);
        let destination_id = lifecycle::resolve_destination(&list, destination, &all)?;

        let promoted = match compensation.promote {
            Some(ref promote_id) => {
                let color = ctx.palette.allocate(user_id);
                list_repo::update_backlog(conn, promote_id, true, color)?;
                let promoted = list_repo::get_list_by_id(conn, promote_id)?;
                tracing::info!(list = %promoted.name, "promoted to backlog");
                Some(promoted)
            }
            None => None,
        };

        let reassigned_tasks = match (
            compensation.reassign_origin_backlog_from.as_deref(),
            compensation.reassign_origin_backlog_to.as_deref(),
        ) {
            (Some(from), Some(to)) => task_repo::reassign_origin_backlog(conn, from, to)?,
            _ => 0,
        };

        let destination = list_repo::get_list_by_id(conn, &destination_id)?;
        let moving = task_repo::list_tasks_in_list(conn, &list.id, false)?;
        let start = order_index::calculate_top_position(task_repo::max_order_index(conn, &destination.id)?);
        let positions = order_index::generate_reindexed_order(moving.len(), start);
        for (task, index) in moving.iter().zip(positions) {
            let origin = if destination.is_backlog {
                Some(destination.id.clone())
            } else {
                task_repo::get_task_by_id(conn, &task.id)?.origin_backlog_id
            };
            task_repo::update_placement(conn, &task.id, &destination.id, origin.as_deref(), index, false)?;
        }

        list_repo::delete_list(conn, &list.id)?;
        if let Some(color) = list.color {
            ctx.palette.release(user_id, color);
        }

        Ok(DeletionOutcome {
            deleted: list,
            destination,
            promoted,
            moved_tasks: moving.len(),
            reassigned_tasks,
        })
    })?;

    tracing::info!(
        list = %outcome.deleted.name,
        destination = %outcome.destination.name,
        moved = outcome.moved_tasks,
        "list deleted"
    );
    Ok(outcome)
}

/// Renumber a list's tasks `INITIAL, INITIAL + STEP, …` in their current order.
pub fn reindex_tasks(ctx: &Context, user_id: &str, list_id: &str) -> Result<usize> {
    let count = ctx.transaction(|conn| {
        let list = list_repo::get_owned_list(conn, user_id, list_id)?;
        let tasks = task_repo::list_tasks_in_list(conn, &list.id, false)?;
        let positions = order_index::generate_reindexed_order(tasks.len(), order_index::INITIAL);
        for (task, index) in tasks.iter().zip(positions) {
            task_repo::update_order_index(conn, &task.id, index)?;
        }
        Ok(tasks.len())
    })?;
    tracing::info!(list = %list_id, count, "tasks reindexed");
    Ok(count)
}
