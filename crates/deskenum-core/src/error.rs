//! Core error types for deskenum.
//!
//! Validation and configuration failures shared by the workspace crates.
//! The client and scanner crates keep their own error enums.

use thiserror::Error;

/// Failure to build a run from user input.
#[derive(Error, Debug)]
pub enum DeskEnumError {
    /// The configuration file or environment could not be used
    #[error("bad configuration: {0}")]
    Config(#[from] ConfigError),

    /// A value such as a desk id or alphabet was rejected
    #[error("invalid input: {0}")]
    Validation(String),
}

/// Why the configuration could not be loaded or accepted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No home or config directory on this platform
    #[error("no config directory available on this platform")]
    NoConfigDir,

    /// An explicitly requested file is missing
    #[error("no config file at {path}")]
    NotFound {
        /// Requested location
        path: String,
    },

    /// The file is not valid TOML for [`AppConfig`](crate::AppConfig)
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file exists but could not be read
    #[error("reading config: {0}")]
    Read(#[from] std::io::Error),

    /// A setting is outside its allowed range
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted setting name, e.g. `enumeration.workers`
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using `DeskEnumError`.
pub type Result<T> = std::result::Result<T, DeskEnumError>;

/// Result of loading or validating configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
