//! Typed configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Castellan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Seed for the task generator's random source
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Task generation limits and biases
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Assignment loop and preemption limits
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_seed() -> u64 {
    0x00C4_57E1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            generator: GeneratorConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Task generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    /// Smallest batch drawn when a snapshot reports idle workers
    #[serde(default = "default_min_batch")]
    pub min_batch: u32,

    /// Largest batch drawn when a snapshot reports idle workers
    #[serde(default = "default_max_batch")]
    pub max_batch: u32,

    /// Generation stops once this many tasks are pending
    #[serde(default = "default_max_pending_tasks")]
    pub max_pending_tasks: usize,

    /// Most tasks one assignment pass may generate
    #[serde(default = "default_forced_batch_limit")]
    pub forced_batch_limit: usize,

    /// Wood or food below this makes a faction "low on resources"
    #[serde(default = "default_low_resource_threshold")]
    pub low_resource_threshold: u64,

    /// Chance of drawing a cost-free producer while low on resources
    #[serde(default = "default_cost_free_bias")]
    pub cost_free_bias: f64,

    /// Experience granted by generated tasks
    #[serde(default = "default_generated_experience")]
    pub generated_experience: u64,
}

const fn default_min_batch() -> u32 {
    2
}

const fn default_max_batch() -> u32 {
    5
}

const fn default_max_pending_tasks() -> usize {
    100
}

const fn default_forced_batch_limit() -> usize {
    50
}

const fn default_low_resource_threshold() -> u64 {
    100
}

const fn default_cost_free_bias() -> f64 {
    0.7
}

const fn default_generated_experience() -> u64 {
    10
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_batch: default_min_batch(),
            max_batch: default_max_batch(),
            max_pending_tasks: default_max_pending_tasks(),
            forced_batch_limit: default_forced_batch_limit(),
            low_resource_threshold: default_low_resource_threshold(),
            cost_free_bias: default_cost_free_bias(),
            generated_experience: default_generated_experience(),
        }
    }
}

/// Assignment loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Global bound on consecutive rejections in one pass
    #[serde(default = "default_rejection_cap")]
    pub rejection_cap: usize,

    /// Most bound tasks one preemption may cancel
    #[serde(default = "default_preemption_limit")]
    pub preemption_limit: usize,

    /// Only tasks with priority strictly below this may be preempted
    #[serde(default = "default_preemption_priority_ceiling")]
    pub preemption_priority_ceiling: u8,

    /// Experience granted by replacement tasks issued on preemption
    #[serde(default = "default_preemption_experience")]
    pub preemption_experience: u64,
}

const fn default_rejection_cap() -> usize {
    100
}

const fn default_preemption_limit() -> usize {
    2
}

const fn default_preemption_priority_ceiling() -> u8 {
    7
}

const fn default_preemption_experience() -> u64 {
    15
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            rejection_cap: default_rejection_cap(),
            preemption_limit: default_preemption_limit(),
            preemption_priority_ceiling: default_preemption_priority_ceiling(),
            preemption_experience: default_preemption_experience(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for log files (logs only to stderr when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

/// Console log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Compact human-readable lines
    #[default]
    Pretty,
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day
    #[default]
    Daily,
    /// New file every hour
    Hourly,
    /// Single file
    Never,
}
