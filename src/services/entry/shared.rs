use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{self, Result, Row};

use crate::models::entry::{Entry, EntryId};

pub(crate) const ENTRY_COLUMNS: &str =
    "id, start_at, end_at, task_id, project_id, description, billable";

/// Fixed-width UTC timestamp; sorts the same as the instant it encodes.
pub(crate) fn to_db_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn to_utc_datetime(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Row ids of locally created entries; anything else is not in this table.
pub(crate) fn row_id(id: &EntryId) -> Option<i64> {
    id.as_str().parse().ok()
}

pub(crate) fn map_entry_row(row: &Row<'_>) -> Result<Entry> {
    Ok(Entry {
        id: EntryId::from(row.get::<_, i64>(0)?),
        start: to_utc_datetime(row.get(1)?)?,
        end: to_utc_datetime(row.get(2)?)?,
        task_id: row.get(3)?,
        project_id: row.get(4)?,
        description: row.get(5)?,
        billable: row.get::<_, i32>(6)? != 0,
    })
}
