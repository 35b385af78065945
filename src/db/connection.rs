use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::{PlanworkError, Result};

use super::migrations;

pub const DATA_DIR_NAME: &str = ".planwork";
pub const DATA_DIR_ENV: &str = "PLANWORK_DIR";

/// Find the nearest `.planwork` directory by walking up from the current directory.
/// `PLANWORK_DIR` overrides the search.
pub fn find_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let mut dir = env::current_dir().map_err(|e| PlanworkError::database(e.to_string()))?;
    loop {
        let candidate = dir.join(DATA_DIR_NAME);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !dir.pop() {
            return Err(PlanworkError::not_initialized());
        }
    }
}

/// Directory `init` creates: the override, or `.planwork` under the current directory.
fn init_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let cwd = env::current_dir().map_err(|e| PlanworkError::database(e.to_string()))?;
    Ok(cwd.join(DATA_DIR_NAME))
}

pub fn db_path() -> Result<PathBuf> {
    Ok(find_data_dir()?.join("planwork.db"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(find_data_dir()?.join("config.json"))
}

/// Open the database. Fails with NOT_INITIALIZED when `init` has not run.
pub fn open_db() -> Result<Connection> {
    let path = db_path()?;
    if !path.exists() {
        return Err(PlanworkError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    tracing::debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Create the data directory and database, then run migrations. Idempotent.
pub fn init_db() -> Result<PathBuf> {
    let dir = init_data_dir()?;
    fs::create_dir_all(&dir).map_err(|e| PlanworkError::database(e.to_string()))?;
    let path = dir.join("planwork.db");
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    tracing::info!(path = %path.display(), "database initialized");
    Ok(path)
}

/// In-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run `f` inside `BEGIN IMMEDIATE`, committing on success and rolling back on error.
///
/// IMMEDIATE takes the write lock up front so check-then-act sequences
/// (e.g. "is this the last backlog?") cannot interleave across processes.
pub fn with_transaction<T>(conn: &Connection, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %rollback, "rollback failed");
            }
            Err(e)
        }
    }
}
