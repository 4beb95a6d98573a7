//! Configuration management for finledger
//!
//! This module handles loading, validation, and management of
//! finledger configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Remote transaction store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote store
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pre-issued bearer token (optional)
    #[serde(default)]
    pub token: Option<String>,
    /// Credentials used to obtain a token (optional)
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
            auth: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Transactions per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    15
}

/// Ledger view behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    /// Move the view to the edited transaction's month after an update,
    /// the same way a create does
    #[serde(default = "default_false")]
    pub follow_updates: bool,
    /// Month shown on start (1-12), defaults to the current month
    #[serde(default)]
    pub default_month: Option<u32>,
    /// Year shown on start, defaults to the current year
    #[serde(default)]
    pub default_year: Option<i32>,
}

fn default_false() -> bool {
    false
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Currency symbol position ("before" or "after")
    #[serde(default)]
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            decimal_places: default_decimal_places(),
            symbol_position: SymbolPosition::After,
        }
    }
}

fn default_symbol() -> String {
    "€".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

/// Currency symbol position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

impl Default for SymbolPosition {
    fn default() -> Self {
        SymbolPosition::After
    }
}

impl CurrencyConfig {
    /// Render an already-rounded amount with the configured symbol
    pub fn format(&self, amount: &str) -> String {
        match self.symbol_position {
            SymbolPosition::Before => format!("{}{}", self.symbol, amount),
            SymbolPosition::After => format!("{} {}", amount, self.symbol),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote store settings
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Ledger view settings
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path.to_path_buf())
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "remote.base_url".to_string(),
            });
        }

        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "remote.timeout_secs".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                reason: "Page size must be greater than 0".to_string(),
            });
        }

        if let Some(month) = self.ledger.default_month {
            if !(1..=12).contains(&month) {
                return Err(ConfigError::InvalidValue {
                    field: "ledger.default_month".to_string(),
                    reason: "Month must be between 1 and 12".to_string(),
                });
            }
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

// ==================== Tests ====================
