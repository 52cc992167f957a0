use anyhow::{Context, Result};
use rusqlite::Connection;

use super::migrations;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_entries_table(conn)?;
    run_entries_migrations(conn)?;
    create_entries_index(conn)?;
    Ok(())
}

// Instants are stored as UTC RFC 3339 strings with a fixed width, so string
// comparison orders them chronologically.
fn create_entries_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS time_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_at TEXT NOT NULL,
            end_at TEXT NOT NULL,
            task_id TEXT,
            project_id TEXT,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create time_entries table")?;

    Ok(())
}

fn run_entries_migrations(conn: &Connection) -> Result<()> {
    migrations::ensure_column(
        conn,
        "time_entries",
        "billable",
        "ALTER TABLE time_entries ADD COLUMN billable INTEGER NOT NULL DEFAULT 0",
    )?;

    Ok(())
}

fn create_entries_index(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_time_entries_range ON time_entries (start_at, end_at)",
        [],
    )
    .context("Failed to create time_entries index")?;

    Ok(())
}
