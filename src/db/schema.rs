//! Database schema definitions

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreError;

pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS skills (
    skill_id              TEXT PRIMARY KEY,
    display_name          TEXT NOT NULL,
    description           TEXT NOT NULL DEFAULT '',
    prerequisite_skill_id TEXT REFERENCES skills(skill_id)
);

CREATE TABLE IF NOT EXISTS user_progress (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id               INTEGER NOT NULL REFERENCES users(id),
    skill_id              TEXT NOT NULL REFERENCES skills(skill_id),
    consecutive_correct   INTEGER NOT NULL DEFAULT 0,
    total_correct         INTEGER NOT NULL DEFAULT 0,
    total_attempted       INTEGER NOT NULL DEFAULT 0,
    consecutive_incorrect INTEGER NOT NULL DEFAULT 0,
    UNIQUE (user_id, skill_id),
    CHECK (total_correct <= total_attempted)
);

CREATE TABLE IF NOT EXISTS skill_dependencies (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    prerequisite_id TEXT NOT NULL REFERENCES skills(skill_id),
    target_id       TEXT NOT NULL REFERENCES skills(skill_id),
    UNIQUE (prerequisite_id, target_id)
);
"#;

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;
    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    if current < SCHEMA_VERSION {
        info!(target: "algebra_tutor", from = current, to = SCHEMA_VERSION, "Creating database schema");
        conn.execute_batch(SCHEMA_V1)?;
        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION])?;
    }
    Ok(())
}
