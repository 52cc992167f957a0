use super::shared::{map_entry_row, row_id, to_db_timestamp, ENTRY_COLUMNS};
use super::EntryService;
use crate::models::entry::{Entry, EntryDraft, EntryId, EntryPatch};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{self, params};

impl<'a> EntryService<'a> {
    /// Insert a new entry; the database assigns its id.
    pub fn create(&self, draft: EntryDraft) -> Result<Entry> {
        draft.validate().map_err(|e| anyhow!(e))?;

        let now = to_db_timestamp(Utc::now());
        self.conn
            .execute(
                "INSERT INTO time_entries (
                    start_at, end_at, task_id, project_id, description, billable,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    to_db_timestamp(draft.start),
                    to_db_timestamp(draft.end),
                    draft.task_id,
                    draft.project_id,
                    draft.description,
                    draft.billable as i32,
                    &now,
                    &now,
                ],
            )
            .context("Failed to insert entry")?;

        let id = self.conn.last_insert_rowid();
        Ok(Entry::from_draft(id, draft))
    }

    /// Retrieve an entry by id.
    pub fn get(&self, id: &EntryId) -> Result<Option<Entry>> {
        let Some(row) = row_id(id) else {
            return Ok(None);
        };
        let result = self.conn.query_row(
            &format!("SELECT {} FROM time_entries WHERE id = ?", ENTRY_COLUMNS),
            [row],
            map_entry_row,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a partial update and return the stored result.
    pub fn update(&self, id: &EntryId, patch: &EntryPatch) -> Result<Entry> {
        let current = self
            .get(id)?
            .ok_or_else(|| anyhow!("Entry with id {} not found", id))?;
        let updated = patch.apply(&current).map_err(|e| anyhow!(e))?;

        self.conn
            .execute(
                "UPDATE time_entries SET
                    start_at = ?, end_at = ?, task_id = ?, project_id = ?,
                    description = ?, billable = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    to_db_timestamp(updated.start),
                    to_db_timestamp(updated.end),
                    updated.task_id,
                    updated.project_id,
                    updated.description,
                    updated.billable as i32,
                    to_db_timestamp(Utc::now()),
                    row_id(id),
                ],
            )
            .context("Failed to update entry")?;

        Ok(updated)
    }

    /// Delete an entry by id.
    pub fn delete(&self, id: &EntryId) -> Result<()> {
        let row = row_id(id).ok_or_else(|| anyhow!("Entry with id {} not found", id))?;
        let rows_affected = self
            .conn
            .execute("DELETE FROM time_entries WHERE id = ?", [row])
            .context("Failed to delete entry")?;

        if rows_affected == 0 {
            return Err(anyhow!("Entry with id {} not found", id));
        }

        Ok(())
    }
}
