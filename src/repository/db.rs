//! Database Connection and Setup
//!
//! Opens the local SQLite database and runs migrations.

use rusqlite::Connection;
use std::path::Path;

use super::traits::RepoResult;

/// Open the database at `db_path` (or `:memory:`) and migrate it
pub fn init_db(db_path: &Path) -> RepoResult<Connection> {
    let conn = Connection::open(db_path)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> RepoResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER
        )",
        (),
    )?;

    // databases created before updated_at existed
    if !column_exists(conn, "kv_store", "updated_at")? {
        conn.execute("ALTER TABLE kv_store ADD COLUMN updated_at INTEGER", ())?;
    }

    Ok(())
}
