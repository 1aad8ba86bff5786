//! Configuration management for vfsbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use vfsbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Asset schemes: {:?}", config.asset.schemes);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `VFSBOX__<section>__<key>`
//!
//! Examples:
//! - `VFSBOX__ASSET__ROOT=/opt/app/rawfile`
//! - `VFSBOX__ASSET__SCHEMES=asset,res`
//! - `VFSBOX__NETWORK__REQUEST_TIMEOUT_MS=5000`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/vfsbox.toml`.
//! This can be overridden using the `VFSBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    AssetConfig, Config, FileConfig, NetworkConfig, TelemetryConfig, WorkerConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails (empty runner names, scheme conflicts, zero timeouts).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Validate an already constructed configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
