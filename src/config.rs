//! # Configuration Module
//!
//! Environment-driven defaults for the measurement harness.
//!
//! ## Environment Variables
//!
//! ### `ROUTERBENCH_ITERATIONS`
//!
//! Measured passes per (engine, scenario). Decimal or `0x` hexadecimal.
//! Default: `100000`.
//!
//! ### `ROUTERBENCH_WARMUP_ITERATIONS`
//!
//! Unmeasured passes run first. Default: `1000`.
//!
//! ### `ROUTERBENCH_DURATION_MS`
//!
//! When set, the measured phase runs for this long instead of a fixed pass
//! count. Unset by default.
//!
//! Command-line flags override all three.
//!
//! ```bash
//! export ROUTERBENCH_ITERATIONS=0x10000
//! export ROUTERBENCH_DURATION_MS=500
//! routerbench run --table gplus
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

/// Env var for [`BenchConfig::iterations`]
pub const ITERATIONS_ENV: &str = "ROUTERBENCH_ITERATIONS";
/// Env var for [`BenchConfig::warmup_iterations`]
pub const WARMUP_ENV: &str = "ROUTERBENCH_WARMUP_ITERATIONS";
/// Env var for [`BenchConfig::duration`]
pub const DURATION_ENV: &str = "ROUTERBENCH_DURATION_MS";

/// Default measured passes
pub const DEFAULT_ITERATIONS: u64 = 100_000;
/// Default warm-up passes
pub const DEFAULT_WARMUP_ITERATIONS: u64 = 1_000;

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value did not parse as a non-negative integer
    InvalidNumber {
        /// Variable or flag name
        key: &'static str,
        /// Raw value
        value: String,
    },
    /// A measured phase must dispatch at least once
    ZeroIterations,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key}: '{value}' is not a valid non-negative integer")
            }
            ConfigError::ZeroIterations => {
                f.write_str("iterations must be at least 1 when no duration is set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Harness settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Measured passes (ignored when `duration` is set)
    pub iterations: u64,
    /// Unmeasured passes before measuring
    pub warmup_iterations: u64,
    /// Time-boxed measured phase
    pub duration: Option<Duration>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            duration: None,
        }
    }
}

impl BenchConfig {
    /// Load from the environment, falling back to defaults for unset vars.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if a variable is set to something unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load through an arbitrary lookup; `from_env` with `std::env::var`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let iterations = match lookup(ITERATIONS_ENV) {
            Some(v) => parse_count(ITERATIONS_ENV, &v)?,
            None => defaults.iterations,
        };
        let warmup_iterations = match lookup(WARMUP_ENV) {
            Some(v) => parse_count(WARMUP_ENV, &v)?,
            None => defaults.warmup_iterations,
        };
        let duration = match lookup(DURATION_ENV) {
            Some(v) => Some(Duration::from_millis(parse_count(DURATION_ENV, &v)?)),
            None => None,
        };
        let config = Self {
            iterations,
            warmup_iterations,
            duration,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would measure nothing
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroIterations`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_none() && self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        Ok(())
    }
}

/// Parse a count in decimal or `0x` hex
pub fn parse_count(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let trimmed = value.trim();
    let parsed = if let Some(hex) = trimmed.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else {
        trimmed.replace('_', "").parse()
    };
    parsed.map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}
