use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::entry::EntryId;
use crate::models::settings::SyncConfig;
use crate::utils::clock::Clock;

#[derive(Debug, Clone, Copy)]
struct PendingMark {
    marked_at: Instant,
    clear_at: Option<Instant>,
}

/// Ids with a local mutation in flight or recently settled.
///
/// A mark stops counting once its scheduled clear passes or it grows older
/// than the staleness window, whichever comes first. Losing a mark early can
/// only cause a brief flicker when the echo is re-applied.
#[derive(Debug)]
pub struct PendingRegistry<C> {
    clock: C,
    marks: HashMap<EntryId, PendingMark>,
    echo_window: Duration,
    stale_after: Duration,
}

impl<C: Clock> PendingRegistry<C> {
    pub fn new(clock: C, config: &SyncConfig) -> Self {
        Self {
            clock,
            marks: HashMap::new(),
            echo_window: config.echo_window(),
            stale_after: config.stale_after(),
        }
    }

    /// Mark (or re-mark) an id as having a mutation in flight.
    pub fn mark(&mut self, id: &EntryId) {
        let mark = PendingMark {
            marked_at: self.clock.now(),
            clear_at: None,
        };
        self.marks.insert(id.clone(), mark);
    }

    /// The mutation settled; keep swallowing echoes for the echo window.
    pub fn schedule_clear(&mut self, id: &EntryId) {
        let clear_at = self.clock.now() + self.echo_window;
        let mark = self.marks.entry(id.clone()).or_insert(PendingMark {
            marked_at: self.clock.now(),
            clear_at: None,
        });
        mark.clear_at = Some(clear_at);
    }

    pub fn is_pending(&self, id: &EntryId) -> bool {
        let now = self.clock.now();
        self.marks
            .get(id)
            .map_or(false, |mark| self.is_live(mark, now))
    }

    pub fn clear(&mut self, id: &EntryId) {
        self.marks.remove(id);
    }

    /// Drop marks that no longer count.
    pub fn purge(&mut self) {
        let now = self.clock.now();
        let stale_after = self.stale_after;
        self.marks.retain(|_, mark| live(mark, now, stale_after));
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    fn is_live(&self, mark: &PendingMark, now: Instant) -> bool {
        live(mark, now, self.stale_after)
    }
}

fn live(mark: &PendingMark, now: Instant, stale_after: Duration) -> bool {
    let fresh = now.saturating_duration_since(mark.marked_at) < stale_after;
    let uncleared = mark.clear_at.map_or(true, |clear_at| now < clear_at);
    fresh && uncleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;
    use std::sync::Arc;

    fn registry() -> (Arc<ManualClock>, PendingRegistry<Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new());
        let registry = PendingRegistry::new(clock.clone(), &SyncConfig::default());
        (clock, registry)
    }

    #[test]
    fn test_mark_and_scheduled_clear() {
        let (clock, mut pending) = registry();
        let id = EntryId::from("a");
        pending.mark(&id);
        assert!(pending.is_pending(&id));

        pending.schedule_clear(&id);
        clock.advance(Duration::from_millis(1_000));
        assert!(pending.is_pending(&id));
        clock.advance(Duration::from_millis(600));
        assert!(!pending.is_pending(&id));
    }

    #[test]
    fn test_stale_mark_stops_counting() {
        let (clock, mut pending) = registry();
        let id = EntryId::from("a");
        pending.mark(&id);
        clock.advance(Duration::from_secs(5));
        assert!(!pending.is_pending(&id));

        pending.purge();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_clear_is_immediate() {
        let (_clock, mut pending) = registry();
        let id = EntryId::from("a");
        pending.mark(&id);
        pending.clear(&id);
        assert!(!pending.is_pending(&id));
    }

    #[test]
    fn test_remark_resets_scheduled_clear() {
        let (clock, mut pending) = registry();
        let id = EntryId::from("a");
        pending.mark(&id);
        pending.schedule_clear(&id);
        clock.advance(Duration::from_millis(1_000));
        pending.mark(&id);
        clock.advance(Duration::from_millis(1_000));
        assert!(pending.is_pending(&id));
        assert_eq!(pending.len(), 1);
    }
}
