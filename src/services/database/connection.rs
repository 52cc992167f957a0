use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::schema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const IN_MEMORY: &str = ":memory:";

/// The SQLite file behind [`SqliteBackend`](crate::services::backend::SqliteBackend).
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the entry database at `path`; `":memory:"` gives a
    /// private in-memory one. File databases run in WAL mode so a second
    /// process can read while we write.
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open entry database at {}", path))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;

        if path != IN_MEMORY {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .context("Failed to switch to WAL journal")?;
            log::debug!("Entry database journal mode: {}", mode);
        }

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the entry table and bring older files up to date.
    pub fn initialize_schema(&self) -> Result<()> {
        schema::initialize_schema(self.connection())
    }
}
