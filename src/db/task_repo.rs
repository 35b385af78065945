use rusqlite::{params, Connection};

use super::escape_like;
use crate::error::{ErrorCode, PlanworkError, Result};
use crate::models::{ArchivedTask, Task};

const TASK_COLUMNS: &str = "id, user_id, list_id, origin_backlog_id, title, description,
                order_index, completed_at, created_at, updated_at";

pub struct NewTask<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub list_id: &'a str,
    pub origin_backlog_id: Option<&'a str>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub order_index: f64,
}

pub fn create_task(conn: &Connection, task: &NewTask) -> Result<Task> {
    conn.execute(
        "INSERT INTO tasks (id, user_id, list_id, origin_backlog_id, title, description, order_index)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            task.id,
            task.user_id,
            task.list_id,
            task.origin_backlog_id,
            task.title,
            task.description,
            task.order_index,
        ],
    )?;
    get_task_by_id(conn, task.id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => PlanworkError::task_not_found(id),
        _ => PlanworkError::from(e),
    })
}

/// Resolve a task by ID or ID prefix among a user's tasks.
pub fn resolve_task(conn: &Connection, user_id: &str, reference: &str) -> Result<Task> {
    // Exact ID match first
    match get_task_by_id(conn, reference) {
        Ok(task) if task.user_id == user_id => return Ok(task),
        Ok(task) => return Err(PlanworkError::forbidden("Task", &task.id)),
        Err(e) if e.is(ErrorCode::NotFound) => {}
        Err(e) => return Err(e),
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND id LIKE ?2 ESCAPE '\\'"
    ))?;
    let prefix = format!("{}%", escape_like(reference));
    let mut tasks: Vec<Task> = stmt
        .query_map(params![user_id, prefix], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    match tasks.len() {
        0 => Err(PlanworkError::task_not_found(reference)),
        1 => Ok(tasks.remove(0)),
        _ => {
            let candidates: Vec<String> = tasks.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(PlanworkError::ambiguous_ref(reference, &candidates))
        }
    }
}

/// Tasks of a list by order index. The Done list reads newest first.
pub fn list_tasks_in_list(conn: &Connection, list_id: &str, descending: bool) -> Result<Vec<Task>> {
    let direction = if descending { "DESC" } else { "ASC" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE list_id = ?1
         ORDER BY order_index {direction}, created_at {direction}, id {direction}"
    ))?;
    let tasks = stmt
        .query_map(params![list_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn count_tasks_in_list(conn: &Connection, list_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE list_id = ?1",
        params![list_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn max_order_index(conn: &Connection, list_id: &str) -> Result<Option<f64>> {
    let max = conn.query_row(
        "SELECT MAX(order_index) FROM tasks WHERE list_id = ?1",
        params![list_id],
        |row| row.get(0),
    )?;
    Ok(max)
}

pub fn update_content(conn: &Connection, id: &str, title: &str, description: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET title = ?1, description = ?2, updated_at = datetime('now') WHERE id = ?3",
        params![title, description, id],
    )?;
    Ok(())
}

pub fn update_order_index(conn: &Connection, id: &str, order_index: f64) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET order_index = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![order_index, id],
    )?;
    Ok(())
}

/// Move a task to another list. `completed` stamps `completed_at` if not yet set.
pub fn update_placement(
    conn: &Connection,
    id: &str,
    list_id: &str,
    origin_backlog_id: Option<&str>,
    order_index: f64,
    completed: bool,
) -> Result<()> {
    let completed_clause = if completed {
        "completed_at = COALESCE(completed_at, datetime('now')),"
    } else {
        ""
    };
    let sql = format!(
        "UPDATE tasks SET list_id = ?1, origin_backlog_id = ?2, order_index = ?3, {completed_clause}
         updated_at = datetime('now')
         WHERE id = ?4"
    );
    conn.execute(&sql, params![list_id, origin_backlog_id, order_index, id])?;
    Ok(())
}

/// Point every task tagged with `from` at `to`.
pub fn reassign_origin_backlog(conn: &Connection, from: &str, to: &str) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE tasks SET origin_backlog_id = ?1, updated_at = datetime('now') WHERE origin_backlog_id = ?2",
        params![to, from],
    )?;
    Ok(changed)
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PlanworkError::task_not_found(id));
    }
    Ok(())
}

/// Completed tasks newest first, tagged with their origin backlog.
pub fn list_archived(conn: &Connection, user_id: &str, limit: u32, offset: u32) -> Result<Vec<ArchivedTask>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.title, t.description, t.completed_at, t.origin_backlog_id, l.name, l.color
         FROM tasks t
         LEFT JOIN lists l ON l.id = t.origin_backlog_id
         WHERE t.user_id = ?1 AND t.completed_at IS NOT NULL
         ORDER BY t.completed_at DESC, t.order_index DESC, t.id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let tasks = stmt
        .query_map(params![user_id, limit, offset], |row| {
            Ok(ArchivedTask {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                completed_at: row.get(3)?,
                origin_backlog_id: row.get(4)?,
                origin_backlog_name: row.get(5)?,
                origin_backlog_color: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn count_completed(conn: &Connection, user_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND completed_at IS NOT NULL",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Completion timestamps on or after `since` (`%Y-%m-%d %H:%M:%S`).
pub fn completion_times_since(conn: &Connection, user_id: &str, since: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT completed_at FROM tasks
         WHERE user_id = ?1 AND completed_at IS NOT NULL AND completed_at >= ?2
         ORDER BY completed_at ASC",
    )?;
    let times = stmt
        .query_map(params![user_id, since], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(times)
}

/// Delete completed tasks finished before `cutoff`. Returns the number removed.
pub fn delete_completed_before(conn: &Connection, cutoff: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM tasks WHERE completed_at IS NOT NULL AND completed_at < ?1",
        params![cutoff],
    )?;
    Ok(removed)
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        list_id: row.get(2)?,
        origin_backlog_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        order_index: row.get(6)?,
        completed_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
