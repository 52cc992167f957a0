//! Overlap layout for one day column.
//!
//! Turns the fragments of a day into side-by-side boxes: greedy column
//! packing, a per-entry peak concurrency that sets each box's share of the
//! width, a tie-break that widens the second of two overlapping entries when
//! it starts low enough not to hide the first one's title, and a cosmetic
//! pass that insets everything from the day edges and lets neighbouring
//! columns overlap slightly.
//!
//! # Invariants
//! - Two entries in the same column never overlap in time.
//! - `offset_pct + width_pct <= 100` and `width_pct >= min_width_pct`.

mod columns;

pub use columns::{assign_columns, peak_concurrency};

use crate::models::settings::LayoutConfig;
use crate::services::store::DayFragment;
use crate::utils::time_math::minutes_to_px;

const BASE_Z_INDEX: i32 = 10;

/// A fragment with its derived visual attributes. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub fragment: DayFragment,
    pub column: usize,
    pub concurrency: usize,
    pub width_pct: f32,
    pub offset_pct: f32,
    pub z_index: i32,
    /// Set when the two-entry tie-break widened this box.
    pub widened: bool,
    pub start_minute: f64,
    pub duration_minutes: f64,
}

impl LayoutEntry {
    pub fn end_minute(&self) -> f64 {
        self.start_minute + self.duration_minutes
    }

    pub fn top_px(&self, hour_height_px: f32) -> f32 {
        minutes_to_px(self.start_minute, hour_height_px)
    }

    pub fn height_px(&self, hour_height_px: f32) -> f32 {
        minutes_to_px(self.duration_minutes, hour_height_px)
    }
}

/// Lay out one day's fragments. The result is ordered by `(start, end)`.
pub fn layout_day(fragments: &[DayFragment], config: &LayoutConfig) -> Vec<LayoutEntry> {
    if fragments.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<&DayFragment> = fragments.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_minute
            .total_cmp(&b.start_minute)
            .then(a.end_minute.total_cmp(&b.end_minute))
            .then_with(|| a.id().cmp(b.id()))
    });

    let intervals: Vec<(f64, f64)> = ordered
        .iter()
        .map(|fragment| (fragment.start_minute, fragment.end_minute.max(fragment.start_minute)))
        .collect();
    let columns = assign_columns(&intervals);
    let concurrency = peak_concurrency(&intervals);
    let reserve = config.title_reserve_minutes();

    ordered
        .iter()
        .enumerate()
        .map(|(index, fragment)| {
            let (start, end) = intervals[index];
            let column = columns[index];
            let peak = concurrency[index];
            let widened = peak == 2
                && column == 1
                && clears_partner_titles(index, &intervals, &columns, reserve);

            let (width_pct, offset_pct) = box_percentages(column, peak, widened, config);
            LayoutEntry {
                fragment: (*fragment).clone(),
                column,
                concurrency: peak,
                width_pct,
                offset_pct,
                z_index: BASE_Z_INDEX + column as i32 + i32::from(widened),
                widened,
                start_minute: start,
                duration_minutes: end - start,
            }
        })
        .collect()
}

/// True when every column-0 entry overlapping `index` started at least
/// `reserve` minutes before it.
fn clears_partner_titles(
    index: usize,
    intervals: &[(f64, f64)],
    columns: &[usize],
    reserve: f64,
) -> bool {
    let (start, end) = intervals[index];
    let mut partners = intervals
        .iter()
        .zip(columns)
        .filter(|(other, column)| **column == 0 && other.0 < end && other.1 > start)
        .map(|(other, _)| other.0)
        .peekable();

    partners.peek().is_some() && partners.all(|partner_start| start >= partner_start + reserve)
}

fn box_percentages(
    column: usize,
    concurrency: usize,
    widened: bool,
    config: &LayoutConfig,
) -> (f32, f32) {
    let min_width = config.min_width_pct;
    let share = 100.0 / concurrency as f32;

    let mut width = share.max(min_width);
    let mut offset = column as f32 * share;

    if widened {
        let grown = width * config.widen_factor;
        offset -= grown - width;
        width = grown;
    }

    // Inset into the band between the day edges.
    let margin = config.edge_margin_pct;
    let band = (100.0 - 2.0 * margin) / 100.0;
    offset = margin + offset.max(0.0) * band;
    width *= band;
    if concurrency > 1 && column + 1 < concurrency {
        width += config.column_overlap_pct;
    }

    clamp_box(width, offset, min_width)
}

/// Shrink the width first, then pull the offset left, so the box fits in
/// `[0, 100]` without going below `min_width`.
fn clamp_box(width: f32, offset: f32, min_width: f32) -> (f32, f32) {
    let mut width = width.max(min_width).min(100.0);
    let mut offset = offset.max(0.0);
    if offset + width > 100.0 {
        width = 100.0 - offset;
        if width < min_width {
            width = min_width;
            offset = 100.0 - min_width;
        }
    }
    (width, offset.max(0.0))
}
