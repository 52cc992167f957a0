//! Optimistic updates and realtime reconciliation.
//!
//! Local mutations land in the [`EntryStore`](crate::services::store::EntryStore)
//! before the backend confirms them. The [`PendingRegistry`] remembers which
//! ids have a mutation in flight so the realtime feed's echo of our own write
//! is not applied a second time.

mod pending;
mod realtime;
mod reconciler;

pub use pending::PendingRegistry;
pub use realtime::{RealtimeEvent, RealtimeKind};
pub use reconciler::{RealtimeOutcome, Reconciler};

use thiserror::Error;

use crate::models::entry::EntryId;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend rejected or failed the call; the local change was rolled back.
    #[error("backend request failed: {0:#}")]
    Backend(anyhow::Error),

    #[error("entry {0} is not in the store")]
    NotFound(EntryId),

    /// The entry's create has not been confirmed yet, so the backend does
    /// not know it.
    #[error("entry {0} has not been saved yet")]
    NotSaved(EntryId),

    #[error("invalid entry: {0}")]
    InvalidEntry(#[from] crate::errors::Error),

    #[error("malformed realtime event: {0}")]
    MalformedEvent(String),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
