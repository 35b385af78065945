use rusqlite::{params, Connection, OptionalExtension};

use super::escape_like;
use crate::error::{ErrorCode, PlanworkError, Result};
use crate::models::{ListColor, TaskList};

const LIST_COLUMNS: &str =
    "id, user_id, name, order_index, is_backlog, is_done, color, created_at, updated_at";

pub struct NewList<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub order_index: f64,
    pub is_backlog: bool,
    pub is_done: bool,
    pub color: Option<ListColor>,
}

pub fn create_list(conn: &Connection, list: &NewList) -> Result<TaskList> {
    conn.execute(
        "INSERT INTO lists (id, user_id, name, order_index, is_backlog, is_done, color)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            list.id,
            list.user_id,
            list.name,
            list.order_index,
            list.is_backlog,
            list.is_done,
            list.color.map(|c| c.as_str()),
        ],
    )?;
    get_list_by_id(conn, list.id)
}

pub fn get_list_by_id(conn: &Connection, id: &str) -> Result<TaskList> {
    conn.query_row(
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ?1"),
        params![id],
        row_to_list,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => PlanworkError::list_not_found(id),
        _ => PlanworkError::from(e),
    })
}

/// Fetch a list and check it belongs to `user_id`.
pub fn get_owned_list(conn: &Connection, user_id: &str, id: &str) -> Result<TaskList> {
    let list = get_list_by_id(conn, id)?;
    if list.user_id != user_id {
        return Err(PlanworkError::forbidden("List", id));
    }
    Ok(list)
}

/// Resolve a list reference for a user: exact name → ID prefix → partial name.
/// An exact ID owned by someone else is FORBIDDEN.
pub fn resolve_list(conn: &Connection, user_id: &str, reference: &str) -> Result<TaskList> {
    match get_owned_list(conn, user_id, reference) {
        Ok(list) => return Ok(list),
        Err(e) if e.is(ErrorCode::Forbidden) => return Err(e),
        Err(_) => {}
    }

    let exact = query_lists(
        conn,
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 AND name = ?2 ORDER BY order_index ASC"),
        params![user_id, reference],
    )?;
    if let Some(list) = pick_one(reference, exact)? {
        return Ok(list);
    }

    let by_prefix = query_lists(
        conn,
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 AND id LIKE ?2 ESCAPE '\\'"),
        params![user_id, format!("{}%", escape_like(reference))],
    )?;
    if let Some(list) = pick_one(reference, by_prefix)? {
        return Ok(list);
    }

    let partial = query_lists(
        conn,
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 AND name LIKE ?2 ESCAPE '\\' ORDER BY order_index ASC"),
        params![user_id, format!("%{}%", escape_like(reference))],
    )?;
    pick_one(reference, partial)?.ok_or_else(|| PlanworkError::list_not_found(reference))
}

fn pick_one(reference: &str, mut lists: Vec<TaskList>) -> Result<Option<TaskList>> {
    match lists.len() {
        0 => Ok(None),
        1 => Ok(Some(lists.remove(0))),
        _ => {
            let candidates: Vec<String> = lists.iter().map(|l| format!("{} ({})", l.name, l.id)).collect();
            Err(PlanworkError::ambiguous_ref(reference, &candidates))
        }
    }
}

/// All lists of a user in display order: regular lists by order index, Done last.
pub fn list_lists_by_user(conn: &Connection, user_id: &str) -> Result<Vec<TaskList>> {
    query_lists(
        conn,
        &format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1
             ORDER BY is_done ASC, order_index ASC, created_at ASC, id ASC"
        ),
        params![user_id],
    )
}

pub fn list_all_backlogs(conn: &Connection) -> Result<Vec<TaskList>> {
    query_lists(
        conn,
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE is_backlog = 1"),
        params![],
    )
}

pub fn find_done_list(conn: &Connection, user_id: &str) -> Result<TaskList> {
    conn.query_row(
        &format!("SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 AND is_done = 1"),
        params![user_id],
        row_to_list,
    )
    .optional()?
    .ok_or_else(|| PlanworkError::list_not_found("Done"))
}

/// Leftmost backlog of a user.
pub fn first_backlog(conn: &Connection, user_id: &str) -> Result<Option<TaskList>> {
    let lists = query_lists(
        conn,
        &format!(
            "SELECT {LIST_COLUMNS} FROM lists WHERE user_id = ?1 AND is_backlog = 1
             ORDER BY order_index ASC, created_at ASC, id ASC LIMIT 1"
        ),
        params![user_id],
    )?;
    Ok(lists.into_iter().next())
}

/// Highest order index among the user's non-Done lists.
pub fn max_order_index(conn: &Connection, user_id: &str) -> Result<Option<f64>> {
    let max = conn.query_row(
        "SELECT MAX(order_index) FROM lists WHERE user_id = ?1 AND is_done = 0",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(max)
}

pub fn update_name(conn: &Connection, id: &str, name: &str) -> Result<()> {
    conn.execute(
        "UPDATE lists SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![name, id],
    )?;
    Ok(())
}

pub fn update_color(conn: &Connection, id: &str, color: Option<ListColor>) -> Result<()> {
    conn.execute(
        "UPDATE lists SET color = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![color.map(|c| c.as_str()), id],
    )?;
    Ok(())
}

pub fn update_backlog(conn: &Connection, id: &str, is_backlog: bool, color: Option<ListColor>) -> Result<()> {
    conn.execute(
        "UPDATE lists SET is_backlog = ?1, color = ?2, updated_at = datetime('now') WHERE id = ?3",
        params![is_backlog, color.map(|c| c.as_str()), id],
    )?;
    Ok(())
}

pub fn update_order_index(conn: &Connection, id: &str, order_index: f64) -> Result<()> {
    conn.execute(
        "UPDATE lists SET order_index = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![order_index, id],
    )?;
    Ok(())
}

pub fn delete_list(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM lists WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PlanworkError::list_not_found(id));
    }
    Ok(())
}

fn query_lists<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<TaskList>> {
    let mut stmt = conn.prepare(sql)?;
    let lists = stmt
        .query_map(params, row_to_list)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lists)
}

fn row_to_list(row: &rusqlite::Row) -> rusqlite::Result<TaskList> {
    let color: Option<String> = row.get(6)?;
    Ok(TaskList {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
        is_backlog: row.get(4)?,
        is_done: row.get(5)?,
        color: color.as_deref().and_then(ListColor::from_str),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
