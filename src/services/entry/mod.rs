//! Time entry persistence.
//! SQLite-backed CRUD and range queries over the `time_entries` table.

use rusqlite::Connection;

pub mod crud;
pub mod queries;
mod shared;

/// Service for time entries stored in SQLite.
pub struct EntryService<'a> {
    pub(crate) conn: &'a Connection,
}

impl<'a> EntryService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}
