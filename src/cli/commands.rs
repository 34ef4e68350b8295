use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::adapter::AdapterRegistry;
use crate::config::BenchConfig;
use crate::harness::Harness;
use crate::report::{JsonReport, ReportSink, TextReport};
use crate::scenario::{ApiExample, ScenarioKind};

/// Command-line interface for routerbench
///
/// Compares HTTP routers on identical route tables and identical requests.
#[derive(Parser, Debug)]
#[command(name = "routerbench", version)]
#[command(about = "Comparative benchmark harness for HTTP routers", long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Which engines and tables to use
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Engine to include (repeatable; default: all)
    #[arg(short, long = "engine", value_name = "NAME")]
    pub engines: Vec<String>,

    /// Built-in table to use (default: all built-in tables)
    #[arg(short, long, value_name = "NAME")]
    pub table: Option<String>,

    /// Route table file (YAML, JSON or TOML) instead of a built-in table
    #[arg(long, value_name = "FILE", conflicts_with = "table")]
    pub routes: Option<PathBuf>,
}

/// Report format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table, like `go test -bench`
    Text,
    /// One JSON object per line
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure construction memory and dispatch throughput
    Run {
        #[command(flatten)]
        selection: Selection,

        /// Measured passes per scenario [env: ROUTERBENCH_ITERATIONS]
        #[arg(long)]
        iterations: Option<u64>,

        /// Unmeasured passes before measuring [env: ROUTERBENCH_WARMUP_ITERATIONS]
        #[arg(long)]
        warmup_iterations: Option<u64>,

        /// Time-box the measured phase instead of counting passes [env: ROUTERBENCH_DURATION_MS]
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "ROUTERBENCH_FORMAT")]
        format: OutputFormat,
    },
    /// Run conformance checks only
    Check {
        #[command(flatten)]
        selection: Selection,
    },
    /// List engines, tables and scenarios
    List,
}

impl Selection {
    fn registry(&self) -> anyhow::Result<AdapterRegistry> {
        Ok(AdapterRegistry::builtin().select(self.engines.as_slice())?)
    }

    fn examples(&self) -> anyhow::Result<Vec<ApiExample>> {
        if let Some(path) = &self.routes {
            return Ok(vec![ApiExample::load(path)?]);
        }
        match &self.table {
            Some(name) => match ApiExample::find_builtin(name) {
                Some(example) => Ok(vec![example]),
                None => {
                    let known: Vec<String> = ApiExample::builtin()
                        .iter()
                        .map(|e| e.name().to_string())
                        .collect();
                    bail!("unknown table '{name}' (available: {})", known.join(", "))
                }
            },
            None => Ok(ApiExample::builtin()),
        }
    }
}

/// Execute `cli`, writing the report to `out`.
///
/// Returns `Ok(false)` when the run completed but something failed (an
/// excluded engine, a failed scenario, a conformance failure).
///
/// # Errors
///
/// Bad configuration, an unknown engine or table, an unreadable route file,
/// or a write error on `out`.
pub fn run_cli(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Run {
            selection,
            iterations,
            warmup_iterations,
            duration_ms,
            format,
        } => {
            let mut config = BenchConfig::from_env().context("reading benchmark configuration")?;
            if let Some(n) = iterations {
                config.iterations = *n;
            }
            if let Some(n) = warmup_iterations {
                config.warmup_iterations = *n;
            }
            if let Some(ms) = duration_ms {
                config.duration = Some(Duration::from_millis(*ms));
            }
            config.validate()?;

            let registry = selection.registry()?;
            let examples = selection.examples()?;
            info!(
                engines = registry.len(),
                tables = examples.len(),
                iterations = config.iterations,
                "starting run"
            );

            let harness = Harness::new(config);
            let mut sink: Box<dyn ReportSink + '_> = match format {
                OutputFormat::Text => Box::new(TextReport::new(&mut *out)),
                OutputFormat::Json => Box::new(JsonReport::new(&mut *out)),
            };
            let report = harness
                .run(&registry, &examples, sink.as_mut())
                .context("writing report")?;
            Ok(report.is_success())
        }
        Commands::Check { selection } => {
            let registry = selection.registry()?;
            let examples = selection.examples()?;
            let harness = Harness::new(BenchConfig::default());
            let failures = harness.check_all(&registry, &examples);
            for failure in &failures {
                writeln!(out, "FAIL {failure}")?;
            }
            if failures.is_empty() {
                writeln!(
                    out,
                    "ok: {} engine(s) conform on {} table(s)",
                    registry.len(),
                    examples.len()
                )?;
            }
            Ok(failures.is_empty())
        }
        Commands::List => {
            writeln!(out, "engines:")?;
            for name in AdapterRegistry::builtin().names() {
                writeln!(out, "  {name}")?;
            }
            writeln!(out, "tables:")?;
            for example in ApiExample::builtin() {
                writeln!(out, "  {} ({} routes)", example.name(), example.table.len())?;
                for scenario in example.scenarios() {
                    writeln!(out, "    {} ({} dispatches/pass)", scenario.name(), scenario.len())?;
                }
                let echo = example.scenario(ScenarioKind::ParamWrite);
                writeln!(out, "    {} (single echo route)", echo.name())?;
            }
            Ok(true)
        }
    }
}
