use rusqlite::{params, Connection};

use super::escape_like;
use crate::error::{PlanworkError, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, created_at";

pub fn create_user(conn: &Connection, id: &str, name: &str) -> Result<User> {
    if find_user_by_name(conn, name)?.is_some() {
        return Err(PlanworkError::name_conflict(name));
    }

    conn.execute(
        "INSERT INTO users (id, name) VALUES (?1, ?2)",
        params![id, name],
    )?;

    get_user_by_id(conn, id)
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => PlanworkError::user_not_found(id),
        _ => PlanworkError::from(e),
    })
}

pub fn find_user_by_name(conn: &Connection, name: &str) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"))?;
    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_user(row)?)),
        None => Ok(None),
    }
}

/// Resolve a user reference: exact name → ULID prefix.
pub fn resolve_user(conn: &Connection, reference: &str) -> Result<User> {
    if let Some(user) = find_user_by_name(conn, reference)? {
        return Ok(user);
    }

    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id LIKE ?1 ESCAPE '\\'"))?;
    let prefix = format!("{}%", escape_like(reference));
    let mut users: Vec<User> = stmt
        .query_map(params![prefix], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;

    match users.len() {
        0 => Err(PlanworkError::user_not_found(reference)),
        1 => Ok(users.remove(0)),
        _ => {
            let candidates: Vec<String> = users.iter().map(|u| format!("{} ({})", u.name, u.id)).collect();
            Err(PlanworkError::ambiguous_ref(reference, &candidates))
        }
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC, id ASC"))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Delete a user with all of their tasks and lists.
pub fn delete_user(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM tasks WHERE user_id = ?1", params![id])?;
    conn.execute("DELETE FROM lists WHERE user_id = ?1", params![id])?;
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(PlanworkError::user_not_found(id));
    }
    Ok(())
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}
