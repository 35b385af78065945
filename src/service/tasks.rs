use rusqlite::Connection;

use crate::db::connection::with_transaction;
use crate::db::list_repo;
use crate::db::task_repo::{self, NewTask};
use crate::error::{PlanworkError, Result};
use crate::models::{Task, TaskList};
use crate::policy::order_index::{self, Placement};

use super::{normalize_description, place_with_reindex, validate_text, Context, MAX_TITLE_LEN};

/// Open tasks a regular list may hold.
pub const MAX_TASKS_PER_LIST: i64 = 100;

fn check_capacity(conn: &Connection, list: &TaskList) -> Result<()> {
    if list.is_done {
        return Ok(());
    }
    if task_repo::count_tasks_in_list(conn, &list.id)? >= MAX_TASKS_PER_LIST {
        return Err(PlanworkError::validation(format!(
            "list {} already holds {MAX_TASKS_PER_LIST} tasks",
            list.name
        )));
    }
    Ok(())
}

fn check_open(task: &Task, action: &str) -> Result<()> {
    if task.is_completed() {
        return Err(PlanworkError::invariant(format!(
            "completed tasks cannot be {action}"
        )));
    }
    Ok(())
}

fn siblings_of(conn: &Connection, list_id: &str, except: &str) -> Result<Vec<(String, f64)>> {
    Ok(task_repo::list_tasks_in_list(conn, list_id, false)?
        .into_iter()
        .filter(|t| t.id != except)
        .map(|t| (t.id, t.order_index))
        .collect())
}

/// Create a task at the bottom (or top) of a list; defaults to the first backlog.
pub fn create_task(
    ctx: &Context,
    user_id: &str,
    list_id: Option<&str>,
    title: &str,
    description: Option<&str>,
    top: bool,
) -> Result<Task> {
    let title = validate_text("title", title, MAX_TITLE_LEN)?;
    let description = normalize_description(description)?;

    let task = with_transaction(&ctx.conn, |conn| {
        let first_backlog = list_repo::first_backlog(conn, user_id)?;
        let list = match list_id {
            Some(id) => list_repo::get_owned_list(conn, user_id, id)?,
            None => first_backlog
                .clone()
                .ok_or_else(|| PlanworkError::invariant("user has no backlog list"))?,
        };
        if list.is_done {
            return Err(PlanworkError::invariant(
                "tasks cannot be created in the Done list; complete them instead",
            ));
        }
        check_capacity(conn, &list)?;

        let origin = if list.is_backlog {
            Some(list.id.clone())
        } else {
            first_backlog.map(|b| b.id)
        };
        let placement = if top { Placement::Top } else { Placement::Bottom };
        let siblings = siblings_of(conn, &list.id, "")?;
        let index = place_with_reindex(conn, siblings, &placement, task_repo::update_order_index)?;
        tracing::debug!(list = %list.id, index, "task position computed");

        let id = ulid::Ulid::new().to_string();
        task_repo::create_task(
            conn,
            &NewTask {
                id: &id,
                user_id,
                list_id: &list.id,
                origin_backlog_id: origin.as_deref(),
                title: &title,
                description: description.as_deref(),
                order_index: index,
            },
        )
    })?;

    tracing::info!(task = %task.id, list = %task.list_id, "task created");
    Ok(task)
}

/// Change title and/or description. An empty description clears it.
pub fn edit_task(
    ctx: &Context,
    user_id: &str,
    task_id: &str,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Task> {
    if title.is_none() && description.is_none() {
        return Err(PlanworkError::validation("nothing to update: pass --title or --description"));
    }
    let title = title.map(|t| validate_text("title", t, MAX_TITLE_LEN)).transpose()?;
    let description = description.map(|d| normalize_description(Some(d))).transpose()?;

    with_transaction(&ctx.conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_id)?;
        check_open(&task, "edited")?;
        let title = title.unwrap_or_else(|| task.title.clone());
        let description = description.unwrap_or_else(|| task.description.clone());
        task_repo::update_content(conn, &task.id, &title, description.as_deref())?;
        task_repo::get_task_by_id(conn, &task.id)
    })
}

/// Reposition a task within its own list.
pub fn reorder_task(ctx: &Context, user_id: &str, task_id: &str, placement: Placement) -> Result<Task> {
    with_transaction(&ctx.conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_id)?;
        check_open(&task, "reordered")?;
        reposition(conn, &task, placement)
    })
}

fn reposition(conn: &Connection, task: &Task, placement: Placement) -> Result<Task> {
    if let Placement::After(ref target) = placement {
        if target == &task.id {
            return Err(PlanworkError::invariant("a task cannot be placed after itself"));
        }
    }
    let siblings = siblings_of(conn, &task.list_id, &task.id)?;
    let index = place_with_reindex(conn, siblings, &placement, task_repo::update_order_index)?;
    tracing::debug!(task = %task.id, index, "task reordered");
    task_repo::update_order_index(conn, &task.id, index)?;
    task_repo::get_task_by_id(conn, &task.id)
}

/// Move a task into another list. Moving into Done completes it.
pub fn move_task(
    ctx: &Context,
    user_id: &str,
    task_id: &str,
    list_id: &str,
    placement: Placement,
) -> Result<Task> {
    let task = with_transaction(&ctx.conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_id)?;
        check_open(&task, "moved")?;
        let dest = list_repo::get_owned_list(conn, user_id, list_id)?;

        if dest.id == task.list_id {
            return reposition(conn, &task, placement);
        }
        if dest.is_done {
            return complete_in(conn, &task, &dest);
        }
        check_capacity(conn, &dest)?;

        let siblings = siblings_of(conn, &dest.id, &task.id)?;
        let index = place_with_reindex(conn, siblings, &placement, task_repo::update_order_index)?;
        let origin = if dest.is_backlog {
            Some(dest.id.clone())
        } else {
            task.origin_backlog_id.clone()
        };
        task_repo::update_placement(conn, &task.id, &dest.id, origin.as_deref(), index, false)?;
        task_repo::get_task_by_id(conn, &task.id)
    })?;

    tracing::info!(task = %task.id, list = %task.list_id, "task moved");
    Ok(task)
}

fn complete_in(conn: &Connection, task: &Task, done: &TaskList) -> Result<Task> {
    let index = order_index::calculate_top_position(task_repo::max_order_index(conn, &done.id)?);
    task_repo::update_placement(
        conn,
        &task.id,
        &done.id,
        task.origin_backlog_id.as_deref(),
        index,
        true,
    )?;
    task_repo::get_task_by_id(conn, &task.id)
}

/// Move a task to the top of the Done list and stamp its completion time.
pub fn complete_task(ctx: &Context, user_id: &str, task_id: &str) -> Result<Task> {
    let task = with_transaction(&ctx.conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_id)?;
        check_open(&task, "completed again")?;
        let done = list_repo::find_done_list(conn, user_id)?;
        complete_in(conn, &task, &done)
    })?;
    tracing::info!(task = %task.id, "task completed");
    Ok(task)
}

pub fn delete_task(ctx: &Context, user_id: &str, task_id: &str) -> Result<Task> {
    let task = with_transaction(&ctx.conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_id)?;
        task_repo::delete_task(conn, &task.id)?;
        Ok(task)
    })?;
    tracing::info!(task = %task.id, "task deleted");
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::service::testing::fixture;
    use crate::service::users;

    #[test]
    fn tasks_default_to_first_backlog() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, None, "  Plan trip ", None, false).unwrap();
        assert_eq!(task.list_id, f.backlog.id);
        assert_eq!(task.title, "Plan trip");
        assert_eq!(task.origin_backlog_id.as_deref(), Some(f.backlog.id.as_str()));
        assert_eq!(task.order_index, order_index::INITIAL);
    }

    #[test]
    fn tasks_in_intermediate_lists_are_tagged_with_first_backlog() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, Some(&f.today.id), "Call", Some(""), false).unwrap();
        assert_eq!(task.origin_backlog_id.as_deref(), Some(f.backlog.id.as_str()));
        assert_eq!(task.description, None);
    }

    #[test]
    fn cannot_create_in_done() {
        let f = fixture();
        let err = create_task(&f.ctx, &f.user.id, Some(&f.done.id), "x", None, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
    }

    #[test]
    fn top_insertion_reindexes_when_exhausted() {
        let f = fixture();
        let first = create_task(&f.ctx, &f.user.id, None, "first", None, false).unwrap();
        assert_eq!(first.order_index, 1000.0);
        let top = create_task(&f.ctx, &f.user.id, None, "top", None, true).unwrap();
        assert_eq!(top.order_index, 1000.0);

        let tasks = task_repo::list_tasks_in_list(&f.ctx.conn, &f.backlog.id, false).unwrap();
        assert_eq!(tasks[0].id, top.id);
        assert_eq!(tasks[1].id, first.id);
        assert_eq!(tasks[1].order_index, 2000.0);
    }

    #[test]
    fn list_capacity_is_enforced() {
        let f = fixture();
        for i in 0..MAX_TASKS_PER_LIST {
            create_task(&f.ctx, &f.user.id, Some(&f.today.id), &format!("t{i}"), None, false).unwrap();
        }
        let err = create_task(&f.ctx, &f.user.id, Some(&f.today.id), "overflow", None, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn moving_keeps_origin_unless_entering_a_backlog() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, None, "Read", None, false).unwrap();
        let moved = move_task(&f.ctx, &f.user.id, &task.id, &f.today.id, Placement::Bottom).unwrap();
        assert_eq!(moved.list_id, f.today.id);
        assert_eq!(moved.origin_backlog_id.as_deref(), Some(f.backlog.id.as_str()));

        let ideas = crate::service::lists::create_list(&f.ctx, &f.user.id, "Ideas", true, None).unwrap();
        let moved = move_task(&f.ctx, &f.user.id, &task.id, &ideas.id, Placement::Top).unwrap();
        assert_eq!(moved.origin_backlog_id.as_deref(), Some(ideas.id.as_str()));
    }

    #[test]
    fn move_after_places_between_neighbours() {
        let f = fixture();
        let a = create_task(&f.ctx, &f.user.id, Some(&f.today.id), "a", None, false).unwrap();
        let b = create_task(&f.ctx, &f.user.id, Some(&f.today.id), "b", None, false).unwrap();
        let c = create_task(&f.ctx, &f.user.id, None, "c", None, false).unwrap();

        let moved = move_task(&f.ctx, &f.user.id, &c.id, &f.today.id, Placement::After(a.id.clone())).unwrap();
        assert!(moved.order_index > a.order_index && moved.order_index < b.order_index);

        let err = move_task(&f.ctx, &f.user.id, &a.id, &f.backlog.id, Placement::After(b.id.clone())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvariantViolation);
    }

    #[test]
    fn completing_puts_newest_first_in_done() {
        let f = fixture();
        let a = create_task(&f.ctx, &f.user.id, None, "a", None, false).unwrap();
        let b = create_task(&f.ctx, &f.user.id, None, "b", None, false).unwrap();
        let a = complete_task(&f.ctx, &f.user.id, &a.id).unwrap();
        let b = move_task(&f.ctx, &f.user.id, &b.id, &f.done.id, Placement::Bottom).unwrap();
        assert!(a.completed_at.is_some());
        assert!(b.completed_at.is_some());
        assert_eq!(b.list_id, f.done.id);

        let done = task_repo::list_tasks_in_list(&f.ctx.conn, &f.done.id, true).unwrap();
        assert_eq!(done[0].id, b.id);
        assert_eq!(done[1].id, a.id);
    }

    #[test]
    fn completed_tasks_are_frozen() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, None, "a", None, false).unwrap();
        complete_task(&f.ctx, &f.user.id, &task.id).unwrap();

        let codes = [
            edit_task(&f.ctx, &f.user.id, &task.id, Some("b"), None).unwrap_err().code,
            move_task(&f.ctx, &f.user.id, &task.id, &f.today.id, Placement::Bottom).unwrap_err().code,
            reorder_task(&f.ctx, &f.user.id, &task.id, Placement::Top).unwrap_err().code,
            complete_task(&f.ctx, &f.user.id, &task.id).unwrap_err().code,
        ];
        assert!(codes.iter().all(|c| *c == ErrorCode::InvariantViolation));
        delete_task(&f.ctx, &f.user.id, &task.id).unwrap();
    }

    #[test]
    fn edit_updates_fields() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, None, "a", Some("notes"), false).unwrap();
        let edited = edit_task(&f.ctx, &f.user.id, &task.id, Some("renamed"), None).unwrap();
        assert_eq!(edited.title, "renamed");
        assert_eq!(edited.description.as_deref(), Some("notes"));
        let edited = edit_task(&f.ctx, &f.user.id, &task.id, None, Some("")).unwrap();
        assert_eq!(edited.description, None);
        assert!(edit_task(&f.ctx, &f.user.id, &task.id, None, None).is_err());
    }

    #[test]
    fn other_users_tasks_are_forbidden() {
        let f = fixture();
        let task = create_task(&f.ctx, &f.user.id, None, "mine", None, false).unwrap();
        let bob = users::create_user(&f.ctx, "bob").unwrap();
        let err = complete_task(&f.ctx, &bob.user.id, &task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        let err = move_task(&f.ctx, &bob.user.id, &task.id, &f.today.id, Placement::Bottom).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
