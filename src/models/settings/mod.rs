// Settings module
// Tunables for the grid, the layout engine, the pointer controllers and sync

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Root configuration, persisted as `timegrid.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GridSettings {
    pub grid: GridConfig,
    pub layout: LayoutConfig,
    pub interaction: InteractionConfig,
    pub sync: SyncConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Pointer positions snap to multiples of this many minutes.
    pub snap_minutes: i64,
    /// Shortest duration a resize may produce.
    pub min_duration_minutes: i64,
    /// Default duration of a tapped slot; follows the current zoom level.
    pub zoom_minutes: i64,
    pub hour_height_px: f32,
    /// IANA name used to cut entries into calendar days.
    pub timezone: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            snap_minutes: 15,
            min_duration_minutes: 15,
            zoom_minutes: 60,
            hour_height_px: 48.0,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub hour_height_px: f32,
    /// Vertical room kept free for the title of the first of two overlapping entries.
    pub title_reserve_px: f32,
    pub min_width_pct: f32,
    pub widen_factor: f32,
    pub edge_margin_pct: f32,
    pub column_overlap_pct: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hour_height_px: 48.0,
            title_reserve_px: 20.0,
            min_width_pct: 15.0,
            widen_factor: 1.5,
            edge_margin_pct: 1.0,
            column_overlap_pct: 2.0,
        }
    }
}

impl LayoutConfig {
    pub fn title_reserve_minutes(&self) -> f64 {
        if self.hour_height_px <= 0.0 {
            return 0.0;
        }
        f64::from(self.title_reserve_px) / f64::from(self.hour_height_px) * 60.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Desktop: travel needed before a press on an entry becomes a move.
    pub drag_threshold_px: f32,
    pub long_press_ms: u64,
    /// Touch: travel that cancels a pending long press.
    pub long_press_tolerance_px: f32,
    /// Clicks on an entry are ignored this long after a resize ends.
    pub click_suppress_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 4.0,
            long_press_ms: 450,
            long_press_tolerance_px: 8.0,
            click_suppress_ms: 250,
        }
    }
}

impl InteractionConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn click_suppress(&self) -> Duration {
        Duration::from_millis(self.click_suppress_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a settled mutation keeps swallowing its realtime echo.
    pub echo_window_ms: u64,
    /// A pending mark older than this no longer counts as pending.
    pub stale_after_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            echo_window_ms: 1_500,
            stale_after_ms: 5_000,
        }
    }
}

impl SyncConfig {
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the records API; `None` selects the local SQLite store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_url: Option<String>,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            rest_url: None,
            collection: "time_entries".to_string(),
            api_token: None,
            database_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GridSettings {
    pub fn timezone(&self) -> Result<Tz> {
        self.grid
            .timezone
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimeZone(self.grid.timezone.clone()))
    }

    /// Layout parameters with the grid's hour height applied.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            hour_height_px: self.grid.hour_height_px,
            ..self.layout.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.snap_minutes <= 0 || 1440 % grid.snap_minutes != 0 {
            return Err(Error::config(format!(
                "snap_minutes must divide a day evenly, got {}",
                grid.snap_minutes
            )));
        }
        if grid.min_duration_minutes <= 0 {
            return Err(Error::config("min_duration_minutes must be positive"));
        }
        if grid.zoom_minutes <= 0 || grid.zoom_minutes > 1440 {
            return Err(Error::config("zoom_minutes must be within one day"));
        }
        if grid.hour_height_px <= 0.0 {
            return Err(Error::config("hour_height_px must be positive"));
        }
        if !(self.layout.min_width_pct > 0.0 && self.layout.min_width_pct <= 100.0) {
            return Err(Error::config("min_width_pct must be within (0, 100]"));
        }
        if self.layout.widen_factor < 1.0 {
            return Err(Error::config("widen_factor must be at least 1.0"));
        }
        if !(0.0..50.0).contains(&self.layout.edge_margin_pct) {
            return Err(Error::config("edge_margin_pct must be within [0, 50)"));
        }
        self.timezone()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = GridSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.grid.snap_minutes, 15);
        assert_eq!(settings.sync.echo_window(), Duration::from_millis(1_500));
        assert_eq!(settings.sync.stale_after(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: GridSettings = toml::from_str(
            r#"
            [grid]
            snap_minutes = 30
            timezone = "Europe/Berlin"
            "#,
        )
        .unwrap();

        assert_eq!(settings.grid.snap_minutes, 30);
        assert_eq!(settings.grid.zoom_minutes, 60);
        assert_eq!(settings.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(settings.layout, LayoutConfig::default());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut settings = GridSettings::default();
        settings.grid.timezone = "Mars/Olympus".to_string();
        assert!(matches!(settings.validate(), Err(Error::UnknownTimeZone(_))));
    }

    #[test]
    fn test_snap_must_divide_day() {
        let mut settings = GridSettings::default();
        settings.grid.snap_minutes = 7;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_title_reserve_minutes() {
        let layout = LayoutConfig {
            hour_height_px: 60.0,
            title_reserve_px: 30.0,
            ..LayoutConfig::default()
        };
        assert!((layout.title_reserve_minutes() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_layout_config_uses_grid_hour_height() {
        let mut settings = GridSettings::default();
        settings.grid.hour_height_px = 80.0;
        assert_eq!(settings.layout_config().hour_height_px, 80.0);
    }
}
