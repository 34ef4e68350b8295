//! Structured logging setup.
//!
//! Logs go to stderr so a report written to stdout can be piped untouched.
//! Nothing logs from inside dispatch or handler bodies.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Env var holding the log level
pub const LEVEL_ENV: &str = "ROUTERBENCH_LOG_LEVEL";
/// Env var holding the log format
pub const FORMAT_ENV: &str = "ROUTERBENCH_LOG_FORMAT";
/// Env var holding extra `target=level` directives
pub const FILTER_ENV: &str = "ROUTERBENCH_LOG_FILTER";

/// Log format: JSON for machines, pretty for people
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    /// json/pretty
    pub format: LogFormat,
    /// Extra `target=level` directives, comma-separated
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
        }
    }
}

impl LogConfig {
    /// Read `ROUTERBENCH_LOG_LEVEL`, `ROUTERBENCH_LOG_FORMAT` and
    /// `ROUTERBENCH_LOG_FILTER`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `var`
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: var(LEVEL_ENV).unwrap_or(defaults.log_level),
            format: var(FORMAT_ENV)
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.format),
            target_filter: var(FILTER_ENV).filter(|f| !f.trim().is_empty()),
        }
    }

    /// Level after `-v` flags: each one steps one level more verbose
    #[must_use]
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        if verbose > 0 {
            let base = LEVELS
                .iter()
                .position(|l| *l == parse_level(&self.log_level))
                .unwrap_or(1);
            let stepped = (base + usize::from(verbose)).min(LEVELS.len() - 1);
            self.log_level = LEVELS[stepped].as_str().to_lowercase();
        }
        self
    }
}

const LEVELS: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Install the global subscriber
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
///
/// # Errors
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let level = parse_level(&config.log_level);
    let mut env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}
