//! Layered configuration using Figment.
//!
//! Configuration is loaded from:
//! 1. `config/siggen.toml` (or a file given on the command line)
//! 2. Environment variables prefixed with `RS_SIGGEN_`, nested with `__`
//!
//! Environment variables win over the file:
//!
//! ```text
//! RS_SIGGEN_DRIVER__MODEL=SMW200A
//! RS_SIGGEN_DRIVER__RESOURCE="TCPIP0::192.168.1.20::inst0::INSTR"
//! RS_SIGGEN_LOGGING__LEVEL=debug
//! ```
//!
//! Every field has a default, so a missing file yields a usable simulated
//! setup once `simulate` is switched on.

use crate::driver::DriverOptions;
use crate::model::InstrumentModel;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/siggen.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "RS_SIGGEN_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration sources could not be read or merged
    #[error("Configuration load error: {0}")]
    LoadError(#[from] figment::Error),
    /// A loaded value is out of range
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiggenConfig {
    /// Instrument connection and driver options
    #[serde(default)]
    pub driver: DriverConfig,
    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Instrument connection and driver options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Model name, e.g. "SMBV100A"
    #[serde(default = "default_model")]
    pub model: String,
    /// VISA resource string (e.g., "TCPIP0::192.168.1.100::inst0::INSTR")
    #[serde(default)]
    pub resource: String,
    /// Use the simulated session instead of `resource`
    #[serde(default)]
    pub simulate: bool,
    /// Check the `*IDN?` model on initialization
    #[serde(default = "default_id_query")]
    pub id_query: bool,
    /// Send `*RST` on initialization
    #[serde(default)]
    pub reset: bool,
    /// Serve reads from valid cache entries
    #[serde(default)]
    pub cache: bool,
    /// Override of the expected `*IDN?` model prefix
    #[serde(default)]
    pub instrument_id: Option<String>,
    /// Transport timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Logging output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable text
    #[serde(default)]
    pub json: bool,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_model() -> String {
    InstrumentModel::Smbv100a.name().to_string()
}

fn default_id_query() -> bool {
    true
}

fn default_timeout() -> u64 {
    5000
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            resource: String::new(),
            simulate: false,
            id_query: default_id_query(),
            reset: false,
            cache: false,
            instrument_id: None,
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

// ============================================================================
// Configuration Loading and Validation
// ============================================================================

impl SiggenConfig {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file and the environment, then validate.
    ///
    /// A missing file is not an error; defaults and environment overrides
    /// still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::extract_from(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge file and environment without validating, so callers can apply
    /// command-line overrides first.
    pub fn extract_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::LoadError)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Model is a supported model
    /// - Resource is set unless simulating
    /// - Timeout is non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        self.driver.instrument_model()?;

        if !self.driver.simulate && self.driver.resource.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "'driver.resource' cannot be empty unless 'driver.simulate' is set".to_string(),
            ));
        }

        if self.driver.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "'driver.timeout_ms' must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl DriverConfig {
    /// The configured model.
    pub fn instrument_model(&self) -> Result<InstrumentModel, ConfigError> {
        self.model.parse().map_err(|_| {
            let supported: Vec<&str> = InstrumentModel::SUPPORTED.iter().map(|m| m.name()).collect();
            ConfigError::ValidationError(format!(
                "Unsupported model '{}'. Must be one of: {}",
                self.model,
                supported.join(", ")
            ))
        })
    }

    /// Options passed to `SmDriver::initialize`.
    pub fn options(&self) -> DriverOptions {
        DriverOptions {
            simulate: self.simulate,
            id_query: self.id_query,
            reset: self.reset,
            cache: self.cache,
            instrument_id: self.instrument_id.clone(),
        }
    }

    /// I/O timeout for the transport.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
