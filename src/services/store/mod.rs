//! Entry store: the single source of truth the controllers and the layout
//! engine read, with the per-day bucket view derived from it.
//!
//! Entries are kept once, by id. Day buckets are computed on demand by
//! clipping every entry to the calendar days it touches, so a record that
//! spans midnight can never drift apart from its own fragments.
//!
//! Writes are copy-on-write: [`EntryStore::snapshot`] hands out an `Arc` that
//! later mutations never disturb.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::entry::{Entry, EntryId};
use crate::utils::date::{days_touched, end_of_day, minute_of_day, start_of_day};

/// An entry clipped to one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFragment {
    pub entry: Entry,
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Minutes from local midnight, with second precision kept as a fraction.
    pub start_minute: f64,
    pub end_minute: f64,
    pub continues_before: bool,
    pub continues_after: bool,
}

impl DayFragment {
    /// Clip `entry` to `day`; `None` when they do not intersect.
    pub fn clip(entry: &Entry, day: NaiveDate, tz: Tz) -> Option<Self> {
        let day_start = start_of_day(day, tz);
        let day_end = end_of_day(day, tz);
        if !entry.intersects(day_start, day_end) {
            return None;
        }

        let start = entry.start.max(day_start);
        let end = entry.end.min(day_end);
        Some(Self {
            entry: entry.clone(),
            day,
            start,
            end,
            start_minute: minute_of_day(start, day, tz),
            end_minute: minute_of_day(end, day, tz),
            continues_before: entry.start < day_start,
            continues_after: entry.end > day_end,
        })
    }

    pub fn id(&self) -> &EntryId {
        &self.entry.id
    }

    /// Minutes between the entry's true start and this fragment's start.
    pub fn clipped_minutes(&self) -> f64 {
        (self.start - self.entry.start).num_milliseconds() as f64 / 60_000.0
    }
}

/// Calendar day → fragments intersecting it.
pub type DayBucketMap = BTreeMap<NaiveDate, Vec<DayFragment>>;

pub struct EntryStore {
    entries: Arc<HashMap<EntryId, Entry>>,
    tz: Tz,
    revision: u64,
}

impl EntryStore {
    pub fn new(tz: Tz) -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
            tz,
            revision: 0,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Bumped once per write that actually changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> Arc<HashMap<EntryId, Entry>> {
        Arc::clone(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert or replace; returns the previous version. Writing a record
    /// identical to the stored one is not a change.
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        if self.entries.get(&entry.id) == Some(&entry) {
            return Some(entry);
        }
        self.revision += 1;
        Arc::make_mut(&mut self.entries).insert(entry.id.clone(), entry)
    }

    pub fn remove(&mut self, id: &EntryId) -> Option<Entry> {
        if !self.entries.contains_key(id) {
            return None;
        }
        self.revision += 1;
        Arc::make_mut(&mut self.entries).remove(id)
    }

    /// Swap the record stored under `old_id` for `entry` (a temporary id
    /// giving way to the backend's) as a single change.
    pub fn replace(&mut self, old_id: &EntryId, entry: Entry) {
        if old_id == &entry.id {
            self.upsert(entry);
            return;
        }
        let entries = Arc::make_mut(&mut self.entries);
        entries.remove(old_id);
        entries.insert(entry.id.clone(), entry);
        self.revision += 1;
    }

    /// Put a record back the way it was before a failed mutation.
    pub fn restore(&mut self, id: &EntryId, previous: Option<Entry>) {
        match previous {
            Some(entry) => {
                self.upsert(entry);
            }
            None => {
                self.remove(id);
            }
        }
    }

    /// Replace every entry intersecting `[start, end)` with `fresh`, except
    /// ids for which `keep_local` is true; those keep their local version.
    pub fn replace_range<F>(
        &mut self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        fresh: Vec<Entry>,
        keep_local: F,
    ) where
        F: Fn(&EntryId) -> bool,
    {
        let mut next: HashMap<EntryId, Entry> = self
            .entries
            .iter()
            .filter(|(id, entry)| !entry.intersects(start, end) || keep_local(id))
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect();
        for entry in fresh {
            if keep_local(&entry.id) && next.contains_key(&entry.id) {
                continue;
            }
            next.insert(entry.id.clone(), entry);
        }

        if next != *self.entries {
            self.entries = Arc::new(next);
            self.revision += 1;
        }
    }

    /// Fragments of every entry touching `day`, in no particular order.
    pub fn day_bucket(&self, day: NaiveDate) -> Vec<DayFragment> {
        self.entries
            .values()
            .filter_map(|entry| DayFragment::clip(entry, day, self.tz))
            .collect()
    }

    /// Bucket map for the inclusive day range `[first, last]`. Days without
    /// entries are present with an empty bucket.
    pub fn day_buckets(&self, first: NaiveDate, last: NaiveDate) -> DayBucketMap {
        let mut buckets: DayBucketMap = first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| (day, Vec::new()))
            .collect();

        for entry in self.entries.values() {
            for day in days_touched(entry.start, entry.end, self.tz) {
                if let Some(bucket) = buckets.get_mut(&day) {
                    if let Some(fragment) = DayFragment::clip(entry, day, self.tz) {
                        bucket.push(fragment);
                    }
                }
            }
        }
        buckets
    }
}

/// Store handle shared between the reconciler and readers.
pub type SharedStore = Arc<Mutex<EntryStore>>;

pub fn shared(store: EntryStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Lock the store, recovering the data if a previous holder panicked.
pub fn lock(store: &SharedStore) -> MutexGuard<'_, EntryStore> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
