//! Hierarchical configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::domain::models::{MAX_PRIORITY, MIN_PRIORITY};

/// Directory holding project configuration, relative to the working directory
pub const CONFIG_DIR: &str = ".castellan";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "CASTELLAN_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// `min_batch` exceeds `max_batch`
    #[error("Invalid batch bounds: min_batch ({0}) must not exceed max_batch ({1})")]
    InvalidBatchBounds(u32, u32),

    /// `max_batch` is zero
    #[error("Invalid max_batch: 0. Must be at least 1")]
    ZeroMaxBatch,

    /// `cost_free_bias` is not a probability
    #[error("Invalid cost_free_bias: {0}. Must be between 0.0 and 1.0")]
    InvalidCostFreeBias(f64),

    /// `rejection_cap` is zero
    #[error("Invalid rejection_cap: 0. Must be at least 1")]
    ZeroRejectionCap,

    /// Preemption ceiling outside 1..=10
    #[error("Invalid preemption_priority_ceiling: {0}. Must be between 1 and 10")]
    InvalidPreemptionCeiling(u8),

    /// Unknown log level name
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .castellan/config.yaml (project config)
    /// 3. .castellan/local.yaml (local overrides, optional)
    /// 4. Environment variables (CASTELLAN_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`load`](Self::load), resolving `.castellan/` under `root`
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Only programmatic defaults sit beneath it; `.castellan/` and the
    /// environment are not consulted.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let generator = &config.generator;
        if generator.max_batch == 0 {
            return Err(ConfigError::ZeroMaxBatch);
        }

        if generator.min_batch > generator.max_batch {
            return Err(ConfigError::InvalidBatchBounds(
                generator.min_batch,
                generator.max_batch,
            ));
        }

        if !(0.0..=1.0).contains(&generator.cost_free_bias) {
            return Err(ConfigError::InvalidCostFreeBias(generator.cost_free_bias));
        }

        let scheduler = &config.scheduler;
        if scheduler.rejection_cap == 0 {
            return Err(ConfigError::ZeroRejectionCap);
        }

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&scheduler.preemption_priority_ceiling) {
            return Err(ConfigError::InvalidPreemptionCeiling(
                scheduler.preemption_priority_ceiling,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}
