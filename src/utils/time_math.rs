//! Minute-of-day arithmetic: clamping, snapping and `HH:MM` labels.

use crate::errors::{Error, Result};

pub const MINUTES_PER_DAY: i64 = 1440;
pub const SNAP_MINUTES: i64 = 15;

pub fn clamp_minute(minute: i64) -> i64 {
    minute.clamp(0, MINUTES_PER_DAY)
}

/// Round to the nearest multiple of `step` without clamping.
///
/// Halves round up (towards +inf) so a pointer exactly between two slots
/// lands on the later one regardless of sign.
pub fn round_to_step(minute: f64, step: i64) -> i64 {
    let step = step.max(1) as f64;
    ((minute / step + 0.5).floor() * step) as i64
}

/// Round to the nearest multiple of `step` within `[0, MINUTES_PER_DAY]`.
pub fn snap_minute(minute: f64, step: i64) -> i64 {
    let snapped = round_to_step(minute, step);
    let step = step.max(1);
    // The clamp bounds are multiples of any step that divides a day.
    let max = MINUTES_PER_DAY - MINUTES_PER_DAY % step;
    snapped.clamp(0, max)
}

/// Minute of day for a vertical fraction of a day column.
pub fn minute_from_fraction(fraction: f64) -> f64 {
    fraction.clamp(0.0, 1.0) * MINUTES_PER_DAY as f64
}

/// `570` -> `"09:30"`, `1440` -> `"24:00"`. Out-of-range values are clamped.
pub fn minute_to_label(minute: i64) -> String {
    let minute = clamp_minute(minute);
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Parse an `H:MM`/`HH:MM` label; `24:00` is accepted as the end of day.
pub fn label_to_minute(label: &str) -> Result<i64> {
    let invalid = || Error::InvalidTimeLabel(label.to_string());
    let (hours, minutes) = label.trim().split_once(':').ok_or_else(invalid)?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i64 = hours.parse().map_err(|_| invalid())?;
    let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    let total = hours * 60 + minutes;
    if !(0..=MINUTES_PER_DAY).contains(&total) {
        return Err(invalid());
    }
    Ok(total)
}

/// Pixel offset of a minute on a column with the given hour height.
pub fn minutes_to_px(minutes: f64, hour_height_px: f32) -> f32 {
    (minutes / 60.0) as f32 * hour_height_px
}

pub fn px_to_minutes(px: f32, hour_height_px: f32) -> f64 {
    if hour_height_px <= 0.0 {
        return 0.0;
    }
    f64::from(px) / f64::from(hour_height_px) * 60.0
}
