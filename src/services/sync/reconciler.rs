use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::pending::PendingRegistry;
use super::realtime::{RealtimeEvent, RealtimeKind};
use super::{SyncError, SyncResult};
use crate::interaction::{MoveCommit, ResizeCommit};
use crate::models::entry::{Entry, EntryDraft, EntryId, EntryPatch};
use crate::models::settings::SyncConfig;
use crate::services::backend::EntryBackend;
use crate::services::store::{self, SharedStore};
use crate::utils::clock::Clock;

/// What a realtime notification did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeOutcome {
    /// Our own write coming back; ignored.
    Echo(EntryId),
    Upserted(EntryId),
    Removed(EntryId),
    /// The record could not be fetched; the event was dropped.
    Dropped(EntryId),
}

/// Applies local mutations optimistically and folds backend changes into
/// the shared store.
pub struct Reconciler<B, C> {
    backend: B,
    store: SharedStore,
    pending: Mutex<PendingRegistry<C>>,
    next_local: AtomicU64,
}

impl<B: EntryBackend, C: Clock> Reconciler<B, C> {
    pub fn new(backend: B, store: SharedStore, clock: C, config: &SyncConfig) -> Self {
        Self {
            backend,
            store,
            pending: Mutex::new(PendingRegistry::new(clock, config)),
            next_local: AtomicU64::new(1),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn is_pending(&self, id: &EntryId) -> bool {
        self.pending().is_pending(id)
    }

    /// Refetch `[start, end)` and replace what the store holds for it.
    /// Entries with a mutation in flight keep their local version.
    pub async fn load_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SyncResult<usize> {
        let fresh = self
            .backend
            .get_entries(start, end)
            .await
            .map_err(SyncError::Backend)?;
        let count = fresh.len();

        let mut store = store::lock(&self.store);
        let pending = self.pending();
        store.replace_range(start, end, fresh, |id| id.is_local() || pending.is_pending(id));
        log::info!("Loaded {} entries between {} and {}", count, start, end);
        Ok(count)
    }

    pub async fn create(&self, draft: EntryDraft) -> SyncResult<Entry> {
        draft.validate()?;
        let temp_id = EntryId::local(self.next_local.fetch_add(1, Ordering::Relaxed));
        store::lock(&self.store).upsert(Entry::from_draft(temp_id.clone(), draft.clone()));
        self.pending().mark(&temp_id);

        match self.backend.create_entry(draft).await {
            Ok(created) => {
                store::lock(&self.store).replace(&temp_id, created.clone());
                let mut pending = self.pending();
                pending.clear(&temp_id);
                pending.mark(&created.id);
                pending.schedule_clear(&created.id);
                log::info!("Created entry {} (was {})", created.id, temp_id);
                Ok(created)
            }
            Err(err) => {
                self.pending().clear(&temp_id);
                store::lock(&self.store).remove(&temp_id);
                log::error!("Create failed, dropped {}: {:#}", temp_id, err);
                Err(SyncError::Backend(err))
            }
        }
    }

    pub async fn update(&self, id: &EntryId, patch: EntryPatch) -> SyncResult<Entry> {
        if id.is_local() {
            return Err(SyncError::NotSaved(id.clone()));
        }
        let previous = {
            let mut store = store::lock(&self.store);
            let previous = store
                .get(id)
                .cloned()
                .ok_or_else(|| SyncError::NotFound(id.clone()))?;
            store.upsert(patch.apply(&previous)?);
            previous
        };
        self.pending().mark(id);

        match self.backend.update_entry(id, &patch).await {
            Ok(updated) => {
                store::lock(&self.store).upsert(updated.clone());
                self.pending().schedule_clear(id);
                log::info!("Updated entry {}", id);
                Ok(updated)
            }
            Err(err) => {
                self.pending().clear(id);
                store::lock(&self.store).restore(id, Some(previous));
                log::error!("Update of {} failed, rolled back: {:#}", id, err);
                Err(SyncError::Backend(err))
            }
        }
    }

    pub async fn delete(&self, id: &EntryId) -> SyncResult<()> {
        if id.is_local() {
            return Err(SyncError::NotSaved(id.clone()));
        }
        let previous = store::lock(&self.store)
            .remove(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        self.pending().mark(id);

        match self.backend.delete_entry(id).await {
            Ok(()) => {
                self.pending().schedule_clear(id);
                log::info!("Deleted entry {}", id);
                Ok(())
            }
            Err(err) => {
                self.pending().clear(id);
                store::lock(&self.store).restore(id, Some(previous));
                log::error!("Delete of {} failed, restored: {:#}", id, err);
                Err(SyncError::Backend(err))
            }
        }
    }

    pub async fn commit_move(&self, commit: &MoveCommit) -> SyncResult<Entry> {
        self.update(&commit.entry_id, EntryPatch::times(commit.start_at, commit.end_at))
            .await
    }

    pub async fn commit_resize(&self, commit: &ResizeCommit) -> SyncResult<Entry> {
        self.update(&commit.entry_id, EntryPatch::times(commit.start_at, commit.end_at))
            .await
    }

    /// Fold one realtime notification into the store.
    pub async fn handle_realtime(&self, event: RealtimeEvent) -> RealtimeOutcome {
        let id = event.record_id;
        if self.is_pending(&id) {
            log::debug!("Realtime {:?} for {} is our own echo", event.kind, id);
            return RealtimeOutcome::Echo(id);
        }

        match event.kind {
            RealtimeKind::Delete => {
                store::lock(&self.store).remove(&id);
                RealtimeOutcome::Removed(id)
            }
            RealtimeKind::Insert | RealtimeKind::Update => {
                match self.backend.get_entry(&id).await {
                    // A local change may have started while the fetch was out.
                    Ok(_) if self.is_pending(&id) => RealtimeOutcome::Echo(id),
                    Ok(Some(entry)) => {
                        store::lock(&self.store).upsert(entry);
                        RealtimeOutcome::Upserted(id)
                    }
                    Ok(None) => {
                        store::lock(&self.store).remove(&id);
                        RealtimeOutcome::Removed(id)
                    }
                    Err(err) => {
                        log::warn!("Dropping realtime {:?} for {}: {:#}", event.kind, id, err);
                        RealtimeOutcome::Dropped(id)
                    }
                }
            }
        }
    }

    /// Drain a realtime feed until it closes. Returns how many events were
    /// handled.
    pub async fn run_realtime(&self, mut feed: broadcast::Receiver<RealtimeEvent>) -> usize {
        let mut handled = 0;
        loop {
            match feed.recv().await {
                Ok(event) => {
                    self.handle_realtime(event).await;
                    self.pending().purge();
                    handled += 1;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::warn!("Realtime feed lagged, {} events missed", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        log::info!("Realtime feed closed after {} events", handled);
        handled
    }

    fn pending(&self) -> MutexGuard<'_, PendingRegistry<C>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
