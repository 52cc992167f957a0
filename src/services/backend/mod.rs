//! Persistence collaborators the reconciler talks to.
//!
//! The grid only needs CRUD over entries plus a realtime change feed; where
//! the records live is up to the implementation.

mod rest;
mod sqlite;

pub use rest::RestBackend;
pub use sqlite::SqliteBackend;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::entry::{Entry, EntryDraft, EntryId, EntryPatch};

/// CRUD contract of an entry store.
///
/// Implementations return the authoritative record for every write, with
/// the id the backend assigned.
#[allow(async_fn_in_trait)]
pub trait EntryBackend {
    /// Entries intersecting `[start, end)`.
    async fn get_entries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>>;

    /// `Ok(None)` when the record does not exist.
    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>>;

    async fn create_entry(&self, draft: EntryDraft) -> Result<Entry>;

    async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<Entry>;

    async fn delete_entry(&self, id: &EntryId) -> Result<()>;
}

impl<B: EntryBackend> EntryBackend for std::sync::Arc<B> {
    async fn get_entries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>> {
        (**self).get_entries(start, end).await
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        (**self).get_entry(id).await
    }

    async fn create_entry(&self, draft: EntryDraft) -> Result<Entry> {
        (**self).create_entry(draft).await
    }

    async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<Entry> {
        (**self).update_entry(id, patch).await
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        (**self).delete_entry(id).await
    }
}
