//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - panda.toml (default configuration)
//! - panda.local.toml (git-ignored local overrides)
//! - Environment variables (PANDA_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # panda.toml
//! [limits]
//! max_steps = 1048576
//! max_reset_depth = 0
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! PANDA_LIMITS__MAX_STEPS=500000
//! PANDA_LOGGING__LEVEL=debug
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Safety-ceiling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum driver steps per run (0 = unlimited)
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Maximum reset-lemma recursion depth (0 = derived from the
    /// subproblem's proof size per invocation)
    #[serde(default)]
    pub max_reset_depth: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_max_steps() -> u64 {
    1 << 20
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_steps: default_max_steps(),
            max_reset_depth: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. panda.toml (base configuration)
    /// 2. panda.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (PANDA_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("panda.toml"))
            .merge(Toml::file("panda.local.toml"))
            .merge(Env::prefixed("PANDA_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PANDA_").split("__"))
            .extract()
    }
}
