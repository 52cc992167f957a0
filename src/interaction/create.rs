// Drag-to-create controller
//
// A press on empty day space starts a selection; releasing it asks the editor
// to open for the selected slot. Selections shorter than one snap interval
// count as a tap and get the zoom level's default duration.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use egui::{Pos2, Rect};

use crate::interaction::hit_test::DayHit;
use crate::models::settings::GridConfig;
use crate::utils::date::instant_at;
use crate::utils::time_math::{minutes_to_px, snap_minute, MINUTES_PER_DAY};

/// Live selection shown while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatePreview {
    pub day: NaiveDate,
    pub start_minute: i64,
    pub end_minute: i64,
    pub top_px: f32,
    pub height_px: f32,
}

/// Slot handed to the entry editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateRequest {
    pub day: NaiveDate,
    pub start_minute: i64,
    pub end_minute: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Release position, for placing the editor.
    pub anchor: Pos2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CreateState {
    Idle,
    Dragging {
        /// Column the selection started in; the selection never leaves it.
        column: DayHit,
        origin_minute: i64,
        current_minute: i64,
    },
}

#[derive(Debug, Clone)]
pub struct CreateController {
    state: CreateState,
    snap_minutes: i64,
    zoom_minutes: i64,
    hour_height_px: f32,
    tz: Tz,
}

impl CreateController {
    pub fn new(grid: &GridConfig, tz: Tz) -> Self {
        Self {
            state: CreateState::Idle,
            snap_minutes: grid.snap_minutes.max(1),
            zoom_minutes: grid.zoom_minutes.clamp(1, MINUTES_PER_DAY),
            hour_height_px: grid.hour_height_px,
            tz,
        }
    }

    pub fn state(&self) -> &CreateState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CreateState::Dragging { .. })
    }

    /// Start a selection. Returns false when the column can't be measured.
    pub fn begin(&mut self, column: DayHit, pos: Pos2) -> bool {
        let Some(minute) = column.minute_at(pos) else {
            log::warn!("create: ignoring press on unmeasurable column {}", column.day);
            return false;
        };
        let origin_minute = snap_minute(minute, self.snap_minutes);
        log::debug!("create: begin on {} at minute {}", column.day, origin_minute);
        self.state = CreateState::Dragging {
            column,
            origin_minute,
            current_minute: origin_minute,
        };
        true
    }

    pub fn update(&mut self, pos: Pos2) {
        if let CreateState::Dragging {
            column,
            current_minute,
            ..
        } = &mut self.state
        {
            if let Some(minute) = column.minute_at(pos) {
                *current_minute = snap_minute(minute, self.snap_minutes);
            }
        }
    }

    pub fn preview(&self) -> Option<CreatePreview> {
        let CreateState::Dragging {
            column,
            origin_minute,
            current_minute,
        } = self.state
        else {
            return None;
        };
        let (lo, hi) = ordered(origin_minute, current_minute);
        Some(CreatePreview {
            day: column.day,
            start_minute: lo,
            end_minute: hi,
            top_px: minutes_to_px(lo as f64, self.hour_height_px),
            height_px: minutes_to_px((hi - lo) as f64, self.hour_height_px),
        })
    }

    /// End the selection at `pos` and produce the slot to create.
    pub fn finish(&mut self, pos: Pos2) -> Option<CreateRequest> {
        self.update(pos);
        let CreateState::Dragging {
            column,
            origin_minute,
            current_minute,
        } = std::mem::replace(&mut self.state, CreateState::Idle)
        else {
            return None;
        };

        let (lo, hi) = ordered(origin_minute, current_minute);
        let (start, end) = if hi - lo < self.snap_minutes {
            self.tap_slot(lo)
        } else {
            (lo, hi)
        };
        Some(self.request(column.day, start, end, pos))
    }

    /// Touch tap on empty space: a default-length slot at the tapped minute.
    pub fn tap(&mut self, column: DayHit, pos: Pos2) -> Option<CreateRequest> {
        self.state = CreateState::Idle;
        let minute = snap_minute(column.minute_at(pos)?, self.snap_minutes);
        let (start, end) = self.tap_slot(minute);
        Some(self.request(column.day, start, end, pos))
    }

    pub fn cancel(&mut self) {
        self.state = CreateState::Idle;
    }

    /// Bounds of the column the selection is locked to.
    pub fn column_rect(&self) -> Option<Rect> {
        match self.state {
            CreateState::Dragging { column, .. } => Some(column.rect),
            CreateState::Idle => None,
        }
    }

    fn tap_slot(&self, minute: i64) -> (i64, i64) {
        let end = minute + self.zoom_minutes;
        if end > MINUTES_PER_DAY {
            (MINUTES_PER_DAY - self.zoom_minutes, MINUTES_PER_DAY)
        } else {
            (minute, end)
        }
    }

    fn request(&self, day: NaiveDate, start: i64, end: i64, anchor: Pos2) -> CreateRequest {
        log::debug!("create: slot {} {}..{}", day, start, end);
        CreateRequest {
            day,
            start_minute: start,
            end_minute: end,
            start_at: instant_at(day, start, self.tz),
            end_at: instant_at(day, end, self.tz),
            anchor,
        }
    }
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::UTC;
    use egui::vec2;

    // 1440px tall: one pixel per minute.
    fn column() -> DayHit {
        DayHit {
            day: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            rect: Rect::from_min_size(Pos2::ZERO, vec2(100.0, 1440.0)),
        }
    }

    fn controller() -> CreateController {
        CreateController::new(&GridConfig::default(), UTC)
    }

    #[test]
    fn test_drag_selects_snapped_range() {
        let mut create = controller();
        assert!(create.begin(column(), Pos2::new(10.0, 543.0)));
        create.update(Pos2::new(10.0, 628.0));
        let preview = create.preview().unwrap();
        assert_eq!((preview.start_minute, preview.end_minute), (540, 630));
        assert_eq!(preview.top_px, 432.0);

        let request = create.finish(Pos2::new(10.0, 628.0)).unwrap();
        assert_eq!((request.start_minute, request.end_minute), (540, 630));
        assert_eq!(request.start_at, Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap());
        assert!(!create.is_active());
    }

    #[test]
    fn test_upward_drag_is_ordered() {
        let mut create = controller();
        create.begin(column(), Pos2::new(10.0, 600.0));
        let request = create.finish(Pos2::new(10.0, 480.0)).unwrap();
        assert_eq!((request.start_minute, request.end_minute), (480, 600));
    }

    #[test]
    fn test_short_drag_becomes_default_slot() {
        let mut create = controller();
        create.begin(column(), Pos2::new(10.0, 600.0));
        let request = create.finish(Pos2::new(10.0, 605.0)).unwrap();
        assert_eq!((request.start_minute, request.end_minute), (600, 660));
    }

    #[test]
    fn test_tap_near_midnight_ends_at_midnight() {
        let mut create = controller();
        let request = create.tap(column(), Pos2::new(10.0, 1410.0)).unwrap();
        assert_eq!((request.start_minute, request.end_minute), (1380, 1440));
        assert_eq!(request.end_at, Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_finish_when_idle() {
        let mut create = controller();
        assert!(create.finish(Pos2::ZERO).is_none());
    }
}
