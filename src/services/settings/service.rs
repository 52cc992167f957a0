use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::errors::{Error, Result};
use crate::models::settings::GridSettings;

pub const CONFIG_FILE: &str = "timegrid.toml";
/// Overrides the config file location when set.
pub const CONFIG_ENV: &str = "TIMEGRID_CONFIG";

pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$TIMEGRID_CONFIG` if set, else `timegrid.toml` in the platform
    /// config directory.
    pub fn from_default_location() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(Self::new(path));
        }
        let dirs = ProjectDirs::from("com", "timegrid", "timegrid")
            .ok_or_else(|| Error::config("Could not determine a config directory"))?;
        Ok(Self::new(dirs.config_dir().join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings. A missing file gives the defaults; so does a file
    /// whose values fail validation, with a warning.
    pub fn load(&self) -> Result<GridSettings> {
        if !self.path.exists() {
            log::info!("No config at {}, using defaults", self.path.display());
            return Ok(GridSettings::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        let settings: GridSettings = toml::from_str(&contents)?;
        if let Err(err) = settings.validate() {
            log::warn!(
                "Ignoring invalid config at {}: {}",
                self.path.display(),
                err
            );
            return Ok(GridSettings::default());
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &GridSettings) -> Result<()> {
        settings.validate()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(settings)?)?;
        log::debug!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Reset settings to defaults
    pub fn reset(&self) -> Result<GridSettings> {
        let defaults = GridSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn service_in(dir: &tempfile::TempDir) -> SettingsService {
        SettingsService::new(dir.path().join("config").join(CONFIG_FILE))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        assert_eq!(service.load().unwrap(), GridSettings::default());
    }

    #[test]
    fn test_save_and_load_settings() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let mut settings = GridSettings::default();
        settings.grid.snap_minutes = 30;
        settings.grid.timezone = "America/New_York".to_string();
        settings.sync.echo_window_ms = 2_000;
        service.save(&settings).unwrap();

        assert_eq!(service.load().unwrap(), settings);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        fs::create_dir_all(service.path().parent().unwrap()).unwrap();
        fs::write(service.path(), "[grid]\nsnap_minutes = 0\n").unwrap();

        assert_eq!(service.load().unwrap(), GridSettings::default());
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        fs::create_dir_all(service.path().parent().unwrap()).unwrap();
        fs::write(service.path(), "[grid\nsnap_minutes = ").unwrap();

        assert!(matches!(service.load(), Err(Error::TomlDecode(_))));
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        let mut settings = GridSettings::default();
        settings.layout.min_width_pct = 0.0;
        assert!(service.save(&settings).is_err());
        assert!(!service.path().exists());
    }

    #[test]
    fn test_reset_settings() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        let mut settings = GridSettings::default();
        settings.grid.zoom_minutes = 30;
        service.save(&settings).unwrap();

        assert_eq!(service.reset().unwrap(), GridSettings::default());
        assert_eq!(service.load().unwrap(), GridSettings::default());
    }

    #[test]
    #[serial]
    fn test_env_override_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::env::set_var(CONFIG_ENV, &path);
        let service = SettingsService::from_default_location().unwrap();
        std::env::remove_var(CONFIG_ENV);

        assert_eq!(service.path(), path.as_path());
    }
}
