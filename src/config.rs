//! Application configuration
//!
//! Loaded from a TOML file, `~/.config/hotel-booking/config.toml` by default.
//! Every section and key is optional; a missing file yields the defaults.
//!
//! ```toml
//! [server]
//! api_host = "0.0.0.0"
//! api_port = 8080
//!
//! [database]
//! memory = false
//! url = "sqlite://./bookings.db?mode=rwc"
//!
//! [refunds]
//! currency = "USD"
//! currency_scale = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::{
    DEFAULT_AUDIT_HISTORY_LIMIT, DEFAULT_MAX_TRANSITION_RETRIES, DEFAULT_SCAN_HISTORY_LIMIT,
};
use crate::application::RefundGatewayConfig;
use crate::domain::refund::DEFAULT_CURRENCY_SCALE;
use crate::infrastructure::database::DEFAULT_DATABASE_URL;

const APP_DIR: &str = "hotel-booking";
const CONFIG_FILE: &str = "config.toml";

/// Minor units beyond this are not a real currency.
const MAX_CURRENCY_SCALE: u32 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// `~/.config/hotel-booking/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
    pub checkin: CheckInConfig,
    pub refunds: RefundConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    /// Keep bookings in process memory instead of SQLite
    pub memory: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            memory: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    /// `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Retries after a version conflict before the caller sees `Conflict`
    pub max_transition_retries: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_transition_retries: DEFAULT_MAX_TRANSITION_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInConfig {
    pub scan_history_limit: usize,
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            scan_history_limit: DEFAULT_SCAN_HISTORY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundConfig {
    pub audit_history_limit: usize,
    /// ISO 4217 code reported on receipts
    pub currency: String,
    /// Decimal places refund amounts are rounded to
    pub currency_scale: u32,
}

impl Default for RefundConfig {
    fn default() -> Self {
        Self {
            audit_history_limit: DEFAULT_AUDIT_HISTORY_LIMIT,
            currency: "USD".to_string(),
            currency_scale: DEFAULT_CURRENCY_SCALE,
        }
    }
}

impl From<&RefundConfig> for RefundGatewayConfig {
    fn from(c: &RefundConfig) -> Self {
        RefundGatewayConfig {
            currency: c.currency.clone(),
            currency_scale: c.currency_scale,
            audit_history_limit: c.audit_history_limit,
        }
    }
}

impl AppConfig {
    /// Load and validate `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_port == 0 {
            return Err(ConfigError::Invalid("server.api_port must be non-zero".into()));
        }
        if !self.database.memory && self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.url is required unless database.memory is set".into(),
            ));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "plain" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be 'plain' or 'json', got '{}'",
                self.logging.format
            )));
        }
        if self.checkin.scan_history_limit == 0 || self.refunds.audit_history_limit == 0 {
            return Err(ConfigError::Invalid("history limits must be at least 1".into()));
        }
        let currency = &self.refunds.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "refunds.currency must be a three-letter ISO code, got '{}'",
                currency
            )));
        }
        if self.refunds.currency_scale > MAX_CURRENCY_SCALE {
            return Err(ConfigError::Invalid(format!(
                "refunds.currency_scale must be at most {}",
                MAX_CURRENCY_SCALE
            )));
        }
        Ok(())
    }

    /// Storage backend label reported by `/health`.
    pub fn storage_backend(&self) -> &'static str {
        if self.database.memory {
            "memory"
        } else {
            "sqlite"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.refunds.currency, "USD");
        assert_eq!(config.refunds.currency_scale, 2);
        assert_eq!(config.booking.max_transition_retries, DEFAULT_MAX_TRANSITION_RETRIES);
        assert_eq!(config.storage_backend(), "sqlite");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9100

            [database]
            memory = true

            [refunds]
            currency = "JPY"
            currency_scale = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_port, 9100);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.storage_backend(), "memory");
        let gateway = RefundGatewayConfig::from(&config.refunds);
        assert_eq!(gateway.currency, "JPY");
        assert_eq!(gateway.currency_scale, 0);
        assert_eq!(gateway.audit_history_limit, DEFAULT_AUDIT_HISTORY_LIMIT);
    }

    #[test]
    fn rejects_bad_values() {
        for toml in [
            "[server]\napi_port = 0",
            "[logging]\nformat = \"xml\"",
            "[refunds]\ncurrency = \"dollars\"",
            "[refunds]\ncurrency_scale = 12",
            "[checkin]\nscan_history_limit = 0",
            "[database]\nurl = \"\"",
        ] {
            assert!(
                matches!(AppConfig::from_toml(toml), Err(ConfigError::Invalid(_))),
                "accepted: {toml}"
            );
        }
        assert!(matches!(
            AppConfig::from_toml("[server\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("hotel-booking-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.server.api_port = 9200;
        config.logging.format = "json".into();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.server.api_port, 9200);
        assert_eq!(loaded.logging.format, "json");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join(format!("absent-{}.toml", uuid::Uuid::new_v4()));
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.server.api_port, 8080);
    }

    #[test]
    fn default_path_ends_in_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with(CONFIG_FILE));
    }
}
