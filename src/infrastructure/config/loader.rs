use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local config file
pub const CONFIG_FILE: &str = ".edugen/config.yaml";
/// Optional project-local overrides
pub const LOCAL_CONFIG_FILE: &str = ".edugen/local.yaml";
/// Prefix of environment overrides; nesting uses `__`
pub const ENV_PREFIX: &str = "EDUGEN_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid expected_option_count: {0}. Must be at least 2")]
    InvalidOptionCount(usize),

    #[error("Invalid question_limit: {0}. Must be at least 1")]
    InvalidQuestionLimit(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Substrate base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Substrate model cannot be empty")]
    EmptyModel,

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid temperature: {0}. Must be between 0 and 2")]
    InvalidTemperature(f32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(Config::default()))
    }

    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .edugen/config.yaml
    /// 3. .edugen/local.yaml
    /// 4. Environment variables (EDUGEN_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Self::base()
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Self::base()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let engine = &config.engine;
        if engine.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(engine.max_attempts));
        }
        if engine.expected_option_count < 2 {
            return Err(ConfigError::InvalidOptionCount(engine.expected_option_count));
        }
        if engine.question_limit == 0 {
            return Err(ConfigError::InvalidQuestionLimit(engine.question_limit));
        }

        let logging = &config.logging;
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(logging.level.clone()));
        }
        if !["json", "pretty"].contains(&logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(logging.format.clone()));
        }
        if !["daily", "hourly", "never"].contains(&logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(logging.rotation.clone()));
        }

        let substrate = &config.substrate;
        if substrate.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if substrate.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if substrate.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(substrate.timeout_secs));
        }
        if let Some(temperature) = substrate.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        Ok(())
    }
}
