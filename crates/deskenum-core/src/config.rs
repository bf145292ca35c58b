//! Configuration management for deskenum.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Command-line flags are applied on top by
//! the binary.

use crate::error::{ConfigError, ConfigResult};
use crate::types::SessionCookie;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/deskenum/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target instance and credential settings
    pub target: TargetConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Enumeration engine settings
    pub enumeration: EnumerationConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration (explicit path or default location) with environment
    /// variable overrides applied.
    ///
    /// Supports the following environment variables:
    /// - `DESKENUM_URL`: Target base URL
    /// - `DESKENUM_COOKIE`: Session cookie value
    /// - `DESKENUM_TENANT_SESSION`: Use the tenant session cookie name (true/false)
    /// - `DESKENUM_WORKERS`: Number of concurrent workers
    /// - `DESKENUM_TIMEOUT_SECS`: Per-request timeout
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Unparseable values are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DESKENUM_URL") {
            tracing::debug!("Override target.base_url from env");
            self.target.base_url = Some(url);
        }

        if let Some(cookie) = lookup("DESKENUM_COOKIE") {
            tracing::debug!("Override session cookie from env");
            self.target.cookie = Some(cookie);
        }

        if let Some(val) = lookup("DESKENUM_TENANT_SESSION") {
            match val.parse() {
                Ok(tenant) => {
                    self.target.session_cookie = SessionCookie::from_tenant_flag(tenant);
                    tracing::debug!("Override target.session_cookie from env: {}", tenant);
                }
                Err(_) => tracing::warn!("Ignoring DESKENUM_TENANT_SESSION={val:?}"),
            }
        }

        if let Some(val) = lookup("DESKENUM_WORKERS") {
            match val.parse() {
                Ok(workers) => {
                    self.enumeration.workers = workers;
                    tracing::debug!("Override enumeration.workers from env: {}", workers);
                }
                Err(_) => tracing::warn!("Ignoring DESKENUM_WORKERS={val:?}"),
            }
        }

        if let Some(val) = lookup("DESKENUM_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => {
                    self.client.timeout_secs = secs;
                    tracing::debug!("Override client.timeout_secs from env: {}", secs);
                }
                Err(_) => tracing::warn!("Ignoring DESKENUM_TIMEOUT_SECS={val:?}"),
            }
        }
    }

    /// Check value constraints the engine relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enumeration.workers == 0 {
            return Err(ConfigError::invalid(
                "enumeration.workers",
                "must be greater than zero",
            ));
        }
        if self.enumeration.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "enumeration.queue_capacity",
                "must be greater than zero",
            ));
        }
        if self.enumeration.user_page_size == 0 || self.enumeration.docs_page_size == 0 {
            return Err(ConfigError::invalid(
                "enumeration.page_size",
                "page sizes must be greater than zero",
            ));
        }
        if self.enumeration.alphabet.is_empty() {
            return Err(ConfigError::invalid("enumeration.alphabet", "must not be empty"));
        }
        if self.enumeration.alphabet2.is_empty() {
            return Err(ConfigError::invalid("enumeration.alphabet2", "must not be empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "client.timeout_secs",
                "must be greater than zero",
            ));
        }
        if let Some(url) = &self.target.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "target.base_url",
                    format!("must start with http:// or https://, got '{url}'"),
                ));
            }
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/deskenum/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "deskenum", "deskenum").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Target instance settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base origin, e.g. `https://example.atlassian.net`
    pub base_url: Option<String>,
    /// Which cookie name carries the credential
    pub session_cookie: SessionCookie,
    /// Session cookie value (env or CLI only, never persisted)
    #[serde(skip)]
    pub cookie: Option<String>,
}

impl TargetConfig {
    /// Base URL without a trailing slash.
    #[must_use]
    pub fn normalized_base_url(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries beyond the first attempt for transport and 5xx failures
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each subsequent retry
    pub backoff_base_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// Enumeration engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Number of concurrent search workers
    pub workers: usize,
    /// Alphabet used to branch the root query
    pub alphabet: String,
    /// Alphabet used to branch every deeper query
    pub alphabet2: String,
    /// Maximum users collected per service desk (0 = unlimited)
    pub max_users: usize,
    /// Capacity of the pending task queue
    pub queue_capacity: usize,
    /// Page ceiling of the user search endpoint
    pub user_page_size: usize,
    /// Result limit requested from the document search endpoint
    pub docs_page_size: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            alphabet: "abcdefghijklmnopqrstuvwxyz0123456789".to_string(),
            alphabet2: "abcdefghijklmnopqrstuvwxyz".to_string(),
            max_users: 50,
            queue_capacity: 5000,
            user_page_size: 50,
            docs_page_size: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.target.base_url.is_none());
        assert_eq!(config.target.session_cookie, SessionCookie::Customer);
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.client.max_retries, 3);
        assert_eq!(config.enumeration.workers, 10);
        assert_eq!(config.enumeration.alphabet.len(), 36);
        assert_eq!(config.enumeration.alphabet2.len(), 26);
        assert_eq!(config.enumeration.max_users, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_skips_cookie() {
        let mut config = AppConfig::default();
        config.target.cookie = Some("secret-token".to_string());

        let toml_str = toml::to_string_pretty(&config).expect("serialize config");
        assert!(toml_str.contains("[target]"));
        assert!(toml_str.contains("[client]"));
        assert!(toml_str.contains("[enumeration]"));
        assert!(!toml_str.contains("secret-token"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert!(parsed.target.cookie.is_none());
        assert_eq!(parsed.enumeration.workers, config.enumeration.workers);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let toml_str = r#"
[target]
base_url = "https://example.atlassian.net"
session_cookie = "tenant"

[enumeration]
workers = 25
"#;
        fs::write(&config_path, toml_str).expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(
            loaded.target.base_url.as_deref(),
            Some("https://example.atlassian.net")
        );
        assert_eq!(loaded.target.session_cookie, SessionCookie::Tenant);
        assert_eq!(loaded.enumeration.workers, 25);
        // Defaults fill the rest
        assert_eq!(loaded.enumeration.queue_capacity, 5000);
        assert_eq!(loaded.client.max_retries, 3);
    }

    #[test]
    fn test_load_from_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = AppConfig::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DESKENUM_URL", "https://acme.atlassian.net/"),
            ("DESKENUM_COOKIE", "eyJ.token"),
            ("DESKENUM_TENANT_SESSION", "true"),
            ("DESKENUM_WORKERS", "4"),
            ("DESKENUM_TIMEOUT_SECS", "not-a-number"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(
            config.target.normalized_base_url().as_deref(),
            Some("https://acme.atlassian.net")
        );
        assert_eq!(config.target.cookie.as_deref(), Some("eyJ.token"));
        assert_eq!(config.target.session_cookie, SessionCookie::Tenant);
        assert_eq!(config.enumeration.workers, 4);
        // Unparseable value leaves the default in place
        assert_eq!(config.client.timeout_secs, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.enumeration.workers = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.enumeration.alphabet2 = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.target.base_url = Some("example.atlassian.net".to_string());
        assert!(config.validate().is_err());
    }
}
