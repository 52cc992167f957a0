use thiserror::Error;

/// Crate-level result alias for validation and configuration work.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating entries or loading configuration.
#[derive(Error, Debug)]
pub enum Error {
    // ---- Entries ------------------------------------------------------------
    /// The entry would end at or before its start.
    #[error("Entry end time must be after start time")]
    EmptyInterval,

    /// A partial update referenced fields that cannot be applied.
    #[error("Invalid entry patch: {0}")]
    InvalidPatch(String),

    // ---- Time math ----------------------------------------------------------
    /// A time label did not match `HH:MM` within one day.
    #[error("Invalid time label: {0}")]
    InvalidTimeLabel(String),

    // ---- Config -------------------------------------------------------------
    /// A configuration value is out of range or unparsable.
    #[error("Config error: {0}")]
    Config(String),

    /// The configured display time zone is not a known IANA name.
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    // ---- Plumbing -----------------------------------------------------------
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
