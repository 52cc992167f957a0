// Drag-to-move controller
//
// A press on an entry becomes a move once the pointer travels past the drag
// threshold (mouse, pen) or is held for the long-press delay (touch). While
// moving, the entry keeps its duration and follows the pointer across day
// columns; releasing normalizes the position so the start lands inside a day.

use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use egui::{Pos2, Rect};

use crate::interaction::hit_test::DayHit;
use crate::models::entry::{Entry, EntryId};
use crate::models::settings::{GridConfig, InteractionConfig};
use crate::services::store::DayFragment;
use crate::utils::date::instant_at;
use crate::utils::time_math::{
    minutes_to_px, px_to_minutes, round_to_step, snap_minute, MINUTES_PER_DAY,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// State of a move that has passed its gate.
#[derive(Clone, Debug, PartialEq)]
pub struct DragContext {
    pub entry: Entry,
    pub source_day: NaiveDate,
    pub duration: Duration,
    /// Minutes from the entry's true start down to the pointer.
    pub pointer_offset: f64,
    pub pointer_pos: Option<Pos2>,
    pub hovered_day: Option<NaiveDate>,
    /// Candidate start, relative to `hovered_day`, before normalization.
    pub hovered_start: Option<i64>,
    pub hovered_rect: Option<Rect>,
}

impl DragContext {
    fn from_fragment(fragment: &DayFragment, pointer_offset: f64) -> Self {
        Self {
            entry: fragment.entry.clone(),
            source_day: fragment.day,
            duration: fragment.entry.duration(),
            pointer_offset,
            pointer_pos: None,
            hovered_day: None,
            hovered_start: None,
            hovered_rect: None,
        }
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration.num_milliseconds() as f64 / 60_000.0
    }

    /// Hovered position with the start moved into `[0, 1440)` of its day.
    pub fn normalized(&self) -> Option<(NaiveDate, i64)> {
        let day = self.hovered_day?;
        let start = self.hovered_start?;
        Some(normalize(day, start))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MoveState {
    Idle,
    /// Pressed on an entry, gate not yet crossed.
    Pending {
        fragment: DayFragment,
        kind: PointerKind,
        press_pos: Pos2,
        pressed_at: Instant,
        pointer_offset: f64,
    },
    Dragging(DragContext),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePreview {
    pub entry_id: EntryId,
    pub day: NaiveDate,
    pub start_minute: i64,
    pub end_minute: f64,
    pub top_px: f32,
    pub height_px: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveCommit {
    pub entry_id: EntryId,
    pub day: NaiveDate,
    pub start_minute: i64,
    /// May exceed 1440 when the entry spills into the next day.
    pub end_minute: f64,
    pub duration: Duration,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Released before the gate: the entry was clicked.
    Click { entry: Entry, anchor: Pos2 },
    Commit(MoveCommit),
}

#[derive(Debug, Clone)]
pub struct MoveController {
    state: MoveState,
    snap_minutes: i64,
    hour_height_px: f32,
    drag_threshold_px: f32,
    long_press: StdDuration,
    long_press_tolerance_px: f32,
    tz: Tz,
}

impl MoveController {
    pub fn new(grid: &GridConfig, interaction: &InteractionConfig, tz: Tz) -> Self {
        Self {
            state: MoveState::Idle,
            snap_minutes: grid.snap_minutes.max(1),
            hour_height_px: grid.hour_height_px,
            drag_threshold_px: interaction.drag_threshold_px,
            long_press: interaction.long_press(),
            long_press_tolerance_px: interaction.long_press_tolerance_px,
            tz,
        }
    }

    pub fn state(&self) -> &MoveState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, MoveState::Pending { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, MoveState::Dragging(_))
    }

    pub fn active(&self) -> Option<&DragContext> {
        match &self.state {
            MoveState::Dragging(context) => Some(context),
            _ => None,
        }
    }

    /// Press on an entry drawn at `rect`.
    pub fn press(
        &mut self,
        fragment: DayFragment,
        rect: Rect,
        pos: Pos2,
        kind: PointerKind,
        now: Instant,
    ) {
        let into_fragment = px_to_minutes(pos.y - rect.top(), self.hour_height_px).max(0.0);
        let pointer_offset = into_fragment + fragment.clipped_minutes();
        self.state = MoveState::Pending {
            fragment,
            kind,
            press_pos: pos,
            pressed_at: now,
            pointer_offset,
        };
    }

    /// Raw pointer travel. Returns true when this movement started the drag.
    pub fn pointer_move(&mut self, pos: Pos2) -> bool {
        let (kind, press_pos) = match &self.state {
            MoveState::Pending {
                kind, press_pos, ..
            } => (*kind, *press_pos),
            _ => return false,
        };
        let travel = (pos - press_pos).length();
        match kind {
            PointerKind::Touch => {
                if travel > self.long_press_tolerance_px {
                    log::debug!("move: long press cancelled after {:.1}px", travel);
                    self.state = MoveState::Idle;
                }
                false
            }
            PointerKind::Mouse | PointerKind::Pen => {
                if travel > self.drag_threshold_px {
                    self.start_drag();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Fire the long-press timer. Returns true when the hold started the drag.
    pub fn tick(&mut self, now: Instant) -> bool {
        let fire = matches!(
            &self.state,
            MoveState::Pending { kind: PointerKind::Touch, pressed_at, .. }
                if now.saturating_duration_since(*pressed_at) >= self.long_press
        );
        if fire {
            self.start_drag();
        }
        fire
    }

    /// Apply one coalesced pointer position. A frame without a usable column
    /// leaves the last position in place.
    pub fn frame(&mut self, pos: Pos2, hit: Option<DayHit>) {
        let snap = self.snap_minutes;
        let MoveState::Dragging(context) = &mut self.state else {
            return;
        };
        context.pointer_pos = Some(pos);
        let Some((hit, minute)) = hit.and_then(|hit| Some((hit, hit.minute_at(pos)?))) else {
            log::warn!("move: no day column under {:?}, keeping last position", pos);
            return;
        };

        let snapped = snap_minute(minute, snap) as f64;
        context.hovered_day = Some(hit.day);
        context.hovered_start = Some(round_to_step(snapped - context.pointer_offset, snap));
        context.hovered_rect = Some(hit.rect);
    }

    pub fn preview(&self) -> Option<MovePreview> {
        let context = self.active()?;
        let (day, start) = context.normalized()?;
        let duration = context.duration_minutes();
        Some(MovePreview {
            entry_id: context.entry.id.clone(),
            day,
            start_minute: start,
            end_minute: start as f64 + duration,
            top_px: minutes_to_px(start as f64, self.hour_height_px),
            height_px: minutes_to_px(duration, self.hour_height_px),
        })
    }

    /// Finish the gesture. The caller flushes the final position through
    /// [`Self::frame`] first.
    pub fn release(&mut self, pos: Pos2) -> Option<MoveOutcome> {
        match std::mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Idle => None,
            MoveState::Pending { fragment, .. } => Some(MoveOutcome::Click {
                entry: fragment.entry,
                anchor: pos,
            }),
            MoveState::Dragging(context) => {
                let Some((day, start)) = context.normalized() else {
                    log::debug!("move: released {} without a target", context.entry.id);
                    return None;
                };
                let start_at = instant_at(day, start, self.tz);
                if start_at == context.entry.start {
                    log::debug!("move: {} dropped where it started", context.entry.id);
                    return None;
                }
                let commit = MoveCommit {
                    entry_id: context.entry.id.clone(),
                    day,
                    start_minute: start,
                    end_minute: start as f64 + context.duration_minutes(),
                    duration: context.duration,
                    start_at,
                    end_at: start_at + context.duration,
                };
                log::info!(
                    "move: {} to {} minute {}",
                    commit.entry_id,
                    commit.day,
                    commit.start_minute
                );
                Some(MoveOutcome::Commit(commit))
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = MoveState::Idle;
    }

    fn start_drag(&mut self) {
        if let MoveState::Pending {
            fragment,
            pointer_offset,
            ..
        } = &self.state
        {
            log::debug!("move: drag started for {}", fragment.id());
            self.state = MoveState::Dragging(DragContext::from_fragment(fragment, *pointer_offset));
        }
    }
}

/// Roll whole days until the start lies in `[0, 1440)`.
fn normalize(day: NaiveDate, start: i64) -> (NaiveDate, i64) {
    let shift = start.div_euclid(MINUTES_PER_DAY);
    let day = day
        .checked_add_signed(Duration::days(shift))
        .unwrap_or(day);
    (day, start.rem_euclid(MINUTES_PER_DAY))
}
