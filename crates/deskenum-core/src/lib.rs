//! Deskenum Core - Foundation crate for the deskenum workspace.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the client, scanner and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`DeskId`, `CloudId`, `Alphabet`, `SessionCookie`, `RunId`)
//!
//! # Example
//!
//! ```rust
//! use deskenum_core::{AlphabetPair, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let alphabets = AlphabetPair::new(
//!     &config.enumeration.alphabet,
//!     &config.enumeration.alphabet2,
//! )?;
//! assert_eq!(alphabets.for_depth(0).len(), 36);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, ClientConfig, EnumerationConfig, TargetConfig};
pub use error::{ConfigError, ConfigResult, DeskEnumError, Result};
pub use types::{Alphabet, AlphabetPair, CloudId, DeskId, RunId, SessionCookie};
