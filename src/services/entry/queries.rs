use super::shared::{map_entry_row, to_db_timestamp, ENTRY_COLUMNS};
use super::EntryService;
use crate::models::entry::Entry;
use anyhow::Result;
use chrono::{DateTime, Utc};

impl<'a> EntryService<'a> {
    /// Entries intersecting `[start, end)`, ordered by start.
    pub fn find_by_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM time_entries
             WHERE start_at < ?1 AND end_at > ?2
             ORDER BY start_at ASC, id ASC",
            ENTRY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(
                [to_db_timestamp(end), to_db_timestamp(start)],
                map_entry_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }
}
