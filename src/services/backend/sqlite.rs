use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use tokio::sync::broadcast;

use super::EntryBackend;
use crate::models::entry::{Entry, EntryDraft, EntryId, EntryPatch};
use crate::models::settings::BackendConfig;
use crate::services::database::Database;
use crate::services::entry::EntryService;
use crate::services::sync::{RealtimeEvent, RealtimeKind};

const FEED_CAPACITY: usize = 256;
const DATABASE_FILE: &str = "timegrid.db";

/// Local SQLite store that also plays the realtime feed: every write is
/// announced to subscribers, with a payload carrying only the id.
pub struct SqliteBackend {
    db: Mutex<Database>,
    feed: broadcast::Sender<RealtimeEvent>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path` and bring its schema up to date.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::new(path)?;
        db.initialize_schema()
            .context("Failed to initialize entry database")?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        log::info!("Opened entry database at {}", path);
        Ok(Self {
            db: Mutex::new(db),
            feed,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Database at the configured path, or `timegrid.db` in the platform
    /// data directory.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let path = match &config.database_path {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let path = path
            .to_str()
            .context("Database path is not valid UTF-8")?
            .to_string();
        Self::open(&path)
    }

    /// Change notifications for every write made through this backend.
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.feed.subscribe()
    }

    /// Announce a change made outside this process (or simulate one).
    pub fn publish(&self, event: RealtimeEvent) {
        // No subscribers is fine; the event just has nobody to tell.
        let _ = self.feed.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn announce(&self, kind: RealtimeKind, id: &EntryId) {
        log::debug!("realtime {:?} for {}", kind, id);
        self.publish(RealtimeEvent::new(kind, id.clone()));
    }
}

fn default_database_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "timegrid", "timegrid")
        .context("Could not determine a data directory")?;
    Ok(dirs.data_dir().join(DATABASE_FILE))
}

impl EntryBackend for SqliteBackend {
    async fn get_entries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Entry>> {
        let db = self.lock();
        EntryService::new(db.connection()).find_by_range(start, end)
    }

    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        let db = self.lock();
        EntryService::new(db.connection()).get(id)
    }

    async fn create_entry(&self, draft: EntryDraft) -> Result<Entry> {
        let created = {
            let db = self.lock();
            EntryService::new(db.connection()).create(draft)?
        };
        self.announce(RealtimeKind::Insert, &created.id);
        Ok(created)
    }

    async fn update_entry(&self, id: &EntryId, patch: &EntryPatch) -> Result<Entry> {
        let updated = {
            let db = self.lock();
            EntryService::new(db.connection()).update(id, patch)?
        };
        self.announce(RealtimeKind::Update, id);
        Ok(updated)
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<()> {
        {
            let db = self.lock();
            EntryService::new(db.connection()).delete(id)?;
        }
        self.announce(RealtimeKind::Delete, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn draft() -> EntryDraft {
        let start = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        EntryDraft::builder()
            .start(start)
            .end(start + Duration::hours(1))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_writes_are_announced() {
        let backend = SqliteBackend::in_memory().unwrap();
        let mut feed = backend.subscribe();

        let created = backend.create_entry(draft()).await.unwrap();
        let event = feed.recv().await.unwrap();
        assert_eq!(event.kind, RealtimeKind::Insert);
        assert_eq!(event.record_id, created.id);

        backend.delete_entry(&created.id).await.unwrap();
        assert_eq!(feed.recv().await.unwrap().kind, RealtimeKind::Delete);
    }

    #[tokio::test]
    async fn test_failed_write_is_not_announced() {
        let backend = SqliteBackend::in_memory().unwrap();
        let mut feed = backend.subscribe();
        assert!(backend.delete_entry(&EntryId::from(1)).await.is_err());
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_from_config_uses_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("entries.db");
        let config = BackendConfig {
            database_path: Some(path.to_string_lossy().into_owned()),
            ..BackendConfig::default()
        };
        let backend = SqliteBackend::from_config(&config).unwrap();
        assert!(path.exists());
        let entries = backend
            .get_entries(Utc::now() - Duration::days(1), Utc::now())
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
