// Entry resize
//
// Dragging the top or bottom edge of an entry moves its start or end. The
// other edge stays where it was, and the entry never gets shorter than the
// configured minimum duration.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use egui::{Pos2, Rect, Vec2};

use crate::interaction::hit_test::DayHit;
use crate::models::entry::{Entry, EntryId};
use crate::models::settings::GridConfig;
use crate::services::store::DayFragment;
use crate::utils::date::{instant_at, local_date, minute_of_day};
use crate::utils::time_math::{snap_minute, MINUTES_PER_DAY};

/// Which edge of the entry is being dragged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Top edge - adjusts start time
    Top,
    /// Bottom edge - adjusts end time
    Bottom,
}

/// Largest height of a handle's hit area
pub const HANDLE_SIZE: f32 = 8.0;

/// Hit areas for the edges of one drawn fragment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleRects {
    pub top: Option<Rect>,
    pub bottom: Option<Rect>,
}

impl HandleRects {
    /// Handles for a fragment drawn at `rect`. An edge that was clipped away
    /// at midnight belongs to another day's fragment and gets no handle.
    pub fn for_fragment(rect: Rect, fragment: &DayFragment) -> Self {
        // Short entries keep most of their body grabbable for moving.
        let zone_height = HANDLE_SIZE.min(rect.height() / 4.0).max(0.0);
        let size = Vec2::new(rect.width(), zone_height);

        Self {
            top: (!fragment.continues_before && zone_height > 0.0)
                .then(|| Rect::from_min_size(rect.left_top(), size)),
            bottom: (!fragment.continues_after && zone_height > 0.0).then(|| {
                Rect::from_min_size(Pos2::new(rect.left(), rect.bottom() - zone_height), size)
            }),
        }
    }

    /// Check if a point hits a handle and return which one
    pub fn hit_test(&self, pos: Pos2) -> Option<ResizeHandle> {
        if self.top.map_or(false, |r| r.contains(pos)) {
            Some(ResizeHandle::Top)
        } else if self.bottom.map_or(false, |r| r.contains(pos)) {
            Some(ResizeHandle::Bottom)
        } else {
            None
        }
    }

    pub fn get(&self, handle: ResizeHandle) -> Option<Rect> {
        match handle {
            ResizeHandle::Top => self.top,
            ResizeHandle::Bottom => self.bottom,
        }
    }
}

/// Context for an active resize operation
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeContext {
    /// The entry as it was when the resize began
    pub entry: Entry,
    pub handle: ResizeHandle,
    /// Day the entry starts on; every minute below is relative to it
    pub anchor_day: NaiveDate,
    pub original_start_minute: f64,
    pub original_end_minute: f64,
    pub pointer_pos: Option<Pos2>,
    /// Snapped pointer minute relative to `anchor_day`
    pub hovered_minute: Option<i64>,
}

impl ResizeContext {
    fn new(entry: Entry, handle: ResizeHandle, tz: Tz) -> Self {
        let anchor_day = local_date(entry.start, tz);
        Self {
            original_start_minute: minute_of_day(entry.start, anchor_day, tz),
            original_end_minute: minute_of_day(entry.end, anchor_day, tz),
            entry,
            handle,
            anchor_day,
            pointer_pos: None,
            hovered_minute: None,
        }
    }

    /// Start and end with the dragged edge applied and the minimum duration
    /// enforced against the edge that stays put.
    pub fn hovered_times(&self, min_duration: Duration, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let Some(minute) = self.hovered_minute else {
            return (self.entry.start, self.entry.end);
        };
        let candidate = instant_at(self.anchor_day, minute, tz);
        match self.handle {
            ResizeHandle::Top => (candidate.min(self.entry.end - min_duration), self.entry.end),
            ResizeHandle::Bottom => (
                self.entry.start,
                candidate.max(self.entry.start + min_duration),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizePreview {
    pub entry_id: EntryId,
    pub handle: ResizeHandle,
    pub anchor_day: NaiveDate,
    pub start_minute: f64,
    pub end_minute: f64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeCommit {
    pub entry_id: EntryId,
    pub handle: ResizeHandle,
    pub anchor_day: NaiveDate,
    /// Minutes from the anchor day's start; either may fall outside one day.
    pub start_minute: f64,
    pub end_minute: f64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeState {
    Idle,
    Resizing(ResizeContext),
}

#[derive(Debug, Clone)]
pub struct ResizeController {
    state: ResizeState,
    snap_minutes: i64,
    min_duration: Duration,
    tz: Tz,
}

impl ResizeController {
    pub fn new(grid: &GridConfig, tz: Tz) -> Self {
        Self {
            state: ResizeState::Idle,
            snap_minutes: grid.snap_minutes.max(1),
            min_duration: Duration::minutes(grid.min_duration_minutes.max(1)),
            tz,
        }
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ResizeState::Resizing(_))
    }

    pub fn active(&self) -> Option<&ResizeContext> {
        match &self.state {
            ResizeState::Resizing(context) => Some(context),
            ResizeState::Idle => None,
        }
    }

    /// Is this entry the one being resized?
    pub fn is_resizing_entry(&self, id: &EntryId) -> bool {
        self.active().map_or(false, |c| &c.entry.id == id)
    }

    /// Grab an edge. Resizes start immediately, with no drag threshold.
    pub fn begin(&mut self, entry: Entry, handle: ResizeHandle) {
        log::debug!("resize: begin {:?} edge of {}", handle, entry.id);
        self.state = ResizeState::Resizing(ResizeContext::new(entry, handle, self.tz));
    }

    /// Apply one coalesced pointer position.
    pub fn frame(&mut self, pos: Pos2, hit: Option<DayHit>) {
        let snap = self.snap_minutes;
        let ResizeState::Resizing(context) = &mut self.state else {
            return;
        };
        context.pointer_pos = Some(pos);
        let Some((hit, minute)) = hit.and_then(|hit| Some((hit, hit.minute_at(pos)?))) else {
            log::warn!("resize: no day column under {:?}, keeping last position", pos);
            return;
        };
        let day_shift = (hit.day - context.anchor_day).num_days();
        context.hovered_minute = Some(snap_minute(minute, snap) + day_shift * MINUTES_PER_DAY);
    }

    pub fn preview(&self) -> Option<ResizePreview> {
        let context = self.active()?;
        let (start_at, end_at) = context.hovered_times(self.min_duration, self.tz);
        Some(ResizePreview {
            entry_id: context.entry.id.clone(),
            handle: context.handle,
            anchor_day: context.anchor_day,
            start_minute: minute_of_day(start_at, context.anchor_day, self.tz),
            end_minute: minute_of_day(end_at, context.anchor_day, self.tz),
            start_at,
            end_at,
        })
    }

    /// Finish the resize. The caller flushes the final position first.
    /// `None` when the edge ends up where it started.
    pub fn release(&mut self) -> Option<ResizeCommit> {
        let preview = self.preview()?;
        let ResizeState::Resizing(context) = std::mem::replace(&mut self.state, ResizeState::Idle)
        else {
            return None;
        };
        if preview.start_at == context.entry.start && preview.end_at == context.entry.end {
            log::debug!("resize: {} released unchanged", preview.entry_id);
            return None;
        }
        log::info!(
            "resize: {} now {}..{}",
            preview.entry_id,
            preview.start_at,
            preview.end_at
        );
        Some(ResizeCommit {
            entry_id: preview.entry_id,
            handle: preview.handle,
            anchor_day: preview.anchor_day,
            start_minute: preview.start_minute,
            end_minute: preview.end_minute,
            start_at: preview.start_at,
            end_at: preview.end_at,
        })
    }

    pub fn cancel(&mut self) {
        self.state = ResizeState::Idle;
    }
}
