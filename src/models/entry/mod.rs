// Entry module
// Time-tracked entry model shared by the store, the layout engine and the backends

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

const LOCAL_ID_PREFIX: &str = "local-";

/// Opaque entry identity.
///
/// Ids minted on this side of the wire (before the backend has answered a
/// create) use the `local-<n>` form and are never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Temporary id for an optimistic create.
    pub fn local(sequence: u64) -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{sequence}"))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// A persisted (or optimistically inserted) time entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub task_id: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub billable: bool,
}

impl Entry {
    /// Create an entry with only the required fields.
    ///
    /// # Examples
    /// ```
    /// use timegrid::models::entry::Entry;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let entry = Entry::new("42", start, start + Duration::hours(1)).unwrap();
    /// assert_eq!(entry.duration(), Duration::hours(1));
    /// ```
    pub fn new(
        id: impl Into<EntryId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let entry = Self {
            id: id.into(),
            start,
            end,
            task_id: None,
            project_id: None,
            description: None,
            billable: false,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn from_draft(id: impl Into<EntryId>, draft: EntryDraft) -> Self {
        Self {
            id: id.into(),
            start: draft.start,
            end: draft.end,
            task_id: draft.task_id,
            project_id: draft.project_id,
            description: draft.description,
            billable: draft.billable,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(Error::EmptyInterval);
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the entry intersects the half-open range `[start, end)`.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            start: self.start,
            end: self.end,
            task_id: self.task_id.clone(),
            project_id: self.project_id.clone(),
            description: self.description.clone(),
            billable: self.billable,
        }
    }
}

/// The fields of an entry that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub task_id: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub billable: bool,
}

impl EntryDraft {
    pub fn builder() -> EntryBuilder {
        EntryBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.end <= self.start {
            return Err(Error::EmptyInterval);
        }
        Ok(())
    }
}

/// Partial update. `None` leaves a field untouched; for the nullable
/// associations `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
}

impl EntryPatch {
    /// Patch that only moves the entry's bounds.
    pub fn times(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the patched entry, rejecting results with `end <= start`.
    pub fn apply(&self, entry: &Entry) -> Result<Entry> {
        let mut patched = entry.clone();
        if let Some(start) = self.start {
            patched.start = start;
        }
        if let Some(end) = self.end {
            patched.end = end;
        }
        if let Some(task_id) = &self.task_id {
            patched.task_id = task_id.clone();
        }
        if let Some(project_id) = &self.project_id {
            patched.project_id = project_id.clone();
        }
        if let Some(description) = &self.description {
            patched.description = description.clone();
        }
        if let Some(billable) = self.billable {
            patched.billable = billable;
        }
        patched.validate()?;
        Ok(patched)
    }
}

/// Builder for drafts with optional associations
pub struct EntryBuilder {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    task_id: Option<String>,
    project_id: Option<String>,
    description: Option<String>,
    billable: bool,
}

impl EntryBuilder {
    pub fn new() -> Self {
        Self {
            start: None,
            end: None,
            task_id: None,
            project_id: None,
            description: None,
            billable: false,
        }
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn billable(mut self, billable: bool) -> Self {
        self.billable = billable;
        self
    }

    pub fn build(self) -> Result<EntryDraft> {
        let start = self
            .start
            .ok_or_else(|| Error::InvalidPatch("start time is required".into()))?;
        let end = self
            .end
            .ok_or_else(|| Error::InvalidPatch("end time is required".into()))?;

        let draft = EntryDraft {
            start,
            end,
            task_id: self.task_id,
            project_id: self.project_id,
            description: self.description,
            billable: self.billable,
        };
        draft.validate()?;
        Ok(draft)
    }
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
