// Integration tests for optimistic sync against the SQLite backend
// Covers echo suppression, foreign changes, range loads and a full drag-to-save round

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::UTC;
use egui::{vec2, Pos2, Rect};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use timegrid::interaction::{
    DayColumns, GridEvent, InteractionCoordinator, PointerInput, PointerKind, PointerTarget,
};
use timegrid::models::entry::{EntryDraft, EntryPatch};
use timegrid::models::settings::{GridSettings, SyncConfig};
use timegrid::services::backend::{EntryBackend, SqliteBackend};
use timegrid::services::store::{self, shared, DayFragment, EntryStore};
use timegrid::services::sync::{RealtimeOutcome, Reconciler, SyncError};
use timegrid::utils::clock::ManualClock;

type TestReconciler = Reconciler<Arc<SqliteBackend>, Arc<ManualClock>>;

struct Harness {
    // Keeps the database file alive for the test's duration
    _dir: TempDir,
    backend: Arc<SqliteBackend>,
    clock: Arc<ManualClock>,
    reconciler: TestReconciler,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.db");
    let backend = Arc::new(SqliteBackend::open(path.to_str().unwrap()).unwrap());
    let clock = Arc::new(ManualClock::new());
    let reconciler = Reconciler::new(
        Arc::clone(&backend),
        shared(EntryStore::new(UTC)),
        Arc::clone(&clock),
        &SyncConfig::default(),
    );
    Harness {
        _dir: dir,
        backend,
        clock,
        reconciler,
    }
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, day, hour, minute, 0).unwrap()
}

fn draft(start: DateTime<Utc>, end: DateTime<Utc>) -> EntryDraft {
    EntryDraft::builder()
        .start(start)
        .end(end)
        .description("Standup")
        .build()
        .unwrap()
}

fn revision(reconciler: &TestReconciler) -> u64 {
    store::lock(reconciler.store()).revision()
}

#[tokio::test]
async fn test_own_writes_echo_is_ignored() {
    let h = harness();
    let mut feed = h.backend.subscribe();

    let created = h.reconciler.create(draft(at(1, 9, 0), at(1, 10, 0))).await.unwrap();
    assert!(!created.id.is_local());
    let before = revision(&h.reconciler);

    let echo = feed.try_recv().unwrap();
    assert_eq!(echo.record_id, created.id);
    let outcome = h.reconciler.handle_realtime(echo).await;
    assert_eq!(outcome, RealtimeOutcome::Echo(created.id.clone()));
    assert_eq!(revision(&h.reconciler), before);

    let stored = store::lock(h.reconciler.store()).get(&created.id).cloned();
    assert_eq!(stored, Some(created));
}

#[tokio::test]
async fn test_echo_after_window_is_refetched() {
    let h = harness();
    let mut feed = h.backend.subscribe();

    let created = h.reconciler.create(draft(at(1, 9, 0), at(1, 10, 0))).await.unwrap();
    let echo = feed.try_recv().unwrap();

    h.clock.advance(Duration::from_millis(1_600));
    let outcome = h.reconciler.handle_realtime(echo).await;
    assert_eq!(outcome, RealtimeOutcome::Upserted(created.id));
}

#[tokio::test]
async fn test_foreign_changes_reach_the_store() {
    let h = harness();
    let mut feed = h.backend.subscribe();

    // Another client writes straight to the backend.
    let foreign = h.backend.create_entry(draft(at(2, 14, 0), at(2, 15, 0))).await.unwrap();
    let event = feed.try_recv().unwrap();
    assert_eq!(
        h.reconciler.handle_realtime(event).await,
        RealtimeOutcome::Upserted(foreign.id.clone())
    );
    assert!(store::lock(h.reconciler.store()).contains(&foreign.id));

    h.backend.delete_entry(&foreign.id).await.unwrap();
    let event = feed.try_recv().unwrap();
    assert_eq!(
        h.reconciler.handle_realtime(event).await,
        RealtimeOutcome::Removed(foreign.id.clone())
    );
    assert!(!store::lock(h.reconciler.store()).contains(&foreign.id));
}

#[tokio::test]
async fn test_load_range_replaces_window_contents() {
    let h = harness();
    let morning = h.backend.create_entry(draft(at(3, 9, 0), at(3, 10, 0))).await.unwrap();
    let evening = h.backend.create_entry(draft(at(3, 18, 0), at(3, 19, 0))).await.unwrap();
    let next_week = h.backend.create_entry(draft(at(10, 9, 0), at(10, 10, 0))).await.unwrap();

    let loaded = h.reconciler.load_range(at(1, 0, 0), at(8, 0, 0)).await.unwrap();
    assert_eq!(loaded, 2);
    {
        let store = store::lock(h.reconciler.store());
        assert!(store.contains(&morning.id));
        assert!(store.contains(&evening.id));
        assert!(!store.contains(&next_week.id));
    }

    // Deleted elsewhere without a realtime event; the next load drops it.
    h.backend.delete_entry(&evening.id).await.unwrap();
    h.reconciler.load_range(at(1, 0, 0), at(8, 0, 0)).await.unwrap();
    let store = store::lock(h.reconciler.store());
    assert!(store.contains(&morning.id));
    assert!(!store.contains(&evening.id));
    assert_eq!(store.day_bucket(NaiveDate::from_ymd_opt(2025, 9, 3).unwrap()).len(), 1);
}

#[tokio::test]
async fn test_failed_update_rolls_back_only_that_entry() {
    let h = harness();
    let kept = h.reconciler.create(draft(at(4, 9, 0), at(4, 10, 0))).await.unwrap();
    let doomed = h.reconciler.create(draft(at(4, 11, 0), at(4, 12, 0))).await.unwrap();

    // Removed behind our back, so the update has nothing to write to.
    h.backend.delete_entry(&doomed.id).await.unwrap();
    let result = h
        .reconciler
        .update(&doomed.id, EntryPatch::times(at(4, 13, 0), at(4, 14, 0)))
        .await;
    assert!(matches!(result, Err(SyncError::Backend(_))));

    let updated = h
        .reconciler
        .update(&kept.id, EntryPatch::times(at(4, 8, 0), at(4, 9, 0)))
        .await
        .unwrap();

    let store = store::lock(h.reconciler.store());
    assert_eq!(store.get(&doomed.id), Some(&doomed));
    assert_eq!(store.get(&kept.id), Some(&updated));
    assert_eq!(h.backend.get_entry(&kept.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_dragged_entry_is_saved() {
    let h = harness();
    let entry = h.reconciler.create(draft(at(1, 9, 0), at(1, 10, 0))).await.unwrap();

    let monday = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let mut columns = DayColumns::new();
    columns.register(monday, Rect::from_min_size(Pos2::ZERO, vec2(100.0, 1440.0)));
    columns.register(
        monday.succ_opt().unwrap(),
        Rect::from_min_size(Pos2::new(100.0, 0.0), vec2(100.0, 1440.0)),
    );
    let mut settings = GridSettings::default();
    settings.grid.hour_height_px = 60.0;
    let mut grid = InteractionCoordinator::new(&settings, UTC, columns, Arc::clone(&h.clock));

    let fragment = DayFragment::clip(&entry, monday, UTC).unwrap();
    let rect = Rect::from_min_size(Pos2::new(0.0, 540.0), vec2(100.0, 60.0));
    grid.handle(PointerInput::Down {
        pos: Pos2::new(50.0, 560.0),
        kind: PointerKind::Mouse,
        target: PointerTarget::Entry { fragment, rect },
    });
    grid.handle(PointerInput::Move { pos: Pos2::new(120.0, 700.0) });
    grid.frame();
    let Some(GridEvent::MoveCommitted(commit)) =
        grid.handle(PointerInput::Up { pos: Pos2::new(150.0, 800.0) })
    else {
        panic!("expected a move commit");
    };

    let saved = h.reconciler.commit_move(&commit).await.unwrap();
    assert_eq!((saved.start, saved.end), (at(2, 13, 0), at(2, 14, 0)));
    assert_eq!(saved.description.as_deref(), Some("Standup"));
    assert_eq!(h.backend.get_entry(&entry.id).await.unwrap(), Some(saved));
}
