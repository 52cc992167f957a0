//! `env_logger` bootstrap driven by the configured level.

use log::LevelFilter;

use crate::models::settings::LoggingConfig;

/// Install the global logger. `RUST_LOG`, when set, wins over the config.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let level = parse_level(&config.level).unwrap_or_else(|| {
        eprintln!("unknown log level `{}`, using info", config.level);
        LevelFilter::Info
    });

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    if builder.try_init().is_ok() {
        log::debug!("Logging initialised at {}", level);
    }
}

/// Case-insensitive level name; `warning` is accepted for `warn`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    let level = level.trim();
    if level.eq_ignore_ascii_case("warning") {
        return Some(LevelFilter::Warn);
    }
    level.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" warning "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
