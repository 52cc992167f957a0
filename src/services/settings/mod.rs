// Settings service module
// Loads and persists `timegrid.toml`

mod service;

pub use service::{SettingsService, CONFIG_ENV, CONFIG_FILE};
