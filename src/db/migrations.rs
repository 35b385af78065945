use rusqlite::Connection;

use crate::error::Result;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            order_index REAL NOT NULL,
            is_backlog INTEGER NOT NULL DEFAULT 0,
            is_done INTEGER NOT NULL DEFAULT 0,
            color TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (NOT (is_backlog = 1 AND is_done = 1))
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            list_id TEXT NOT NULL REFERENCES lists(id),
            origin_backlog_id TEXT REFERENCES lists(id) ON DELETE SET NULL,
            title TEXT NOT NULL,
            description TEXT,
            order_index REAL NOT NULL,
            completed_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_lists_one_done
            ON lists(user_id) WHERE is_done = 1;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_lists_backlog_color
            ON lists(user_id, color) WHERE is_backlog = 1 AND color IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_lists_user_order ON lists(user_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_tasks_list_order ON tasks(list_id, order_index);
        CREATE INDEX IF NOT EXISTS idx_tasks_origin ON tasks(origin_backlog_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(user_id, completed_at)
            WHERE completed_at IS NOT NULL;
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'lists', 'tasks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn second_done_list_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("INSERT INTO users (id, name) VALUES ('u', 'u')", []).unwrap();
        conn.execute(
            "INSERT INTO lists (id, user_id, name, order_index, is_done) VALUES ('d1', 'u', 'Done', 1, 1)",
            [],
        )
        .unwrap();
        let second = conn.execute(
            "INSERT INTO lists (id, user_id, name, order_index, is_done) VALUES ('d2', 'u', 'Done', 2, 1)",
            [],
        );
        assert!(second.is_err());
    }
}
