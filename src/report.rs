//! # Report Module
//!
//! Results, footprints, and the sinks that stream them out.
//!
//! The harness never prints. It is handed a [`ReportSink`] and calls
//! `begin`, then `record_footprint` / `record_result` as figures come in,
//! then `finish` with the aggregated [`Report`].
//!
//! [`TextReport`] mirrors `go test -bench` output:
//!
//! ```text
//! #GPlus Routes: 13
//!    matchit: 7856 Bytes (counting)
//!
//! matchit_GPlusStatic          100000        18.41 ns/op
//! regex_GPlusStatic            100000       212.07 ns/op
//! ```
//!
//! [`JsonReport`] writes one JSON object per line, tagged by `type`.

use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

use crate::memory::MemorySource;

/// How an (engine, scenario) pair ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultStatus {
    /// Throughput figures
    Measured {
        /// Handled dispatches in the measured phase
        dispatches: u64,
        /// Wall time of the measured phase
        #[serde(rename = "elapsed_ns", serialize_with = "as_nanos")]
        elapsed: Duration,
        /// Dispatches per second
        ops_per_sec: f64,
        /// Nanoseconds per dispatch
        ns_per_op: f64,
    },
    /// A dispatch panicked or missed; figures would not be comparable
    Failed {
        /// What went wrong, including the request
        reason: String,
    },
    /// The engine could not build this table
    Excluded {
        /// The build error
        reason: String,
    },
}

fn as_nanos<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

impl ResultStatus {
    /// Derive rates from a count and elapsed time
    #[must_use]
    pub fn measured(dispatches: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let ops_per_sec = if secs > 0.0 {
            dispatches as f64 / secs
        } else {
            0.0
        };
        let ns_per_op = if dispatches > 0 {
            elapsed.as_nanos() as f64 / dispatches as f64
        } else {
            0.0
        };
        ResultStatus::Measured {
            dispatches,
            elapsed,
            ops_per_sec,
            ns_per_op,
        }
    }

    /// True for [`ResultStatus::Measured`]
    #[must_use]
    pub fn is_measured(&self) -> bool {
        matches!(self, ResultStatus::Measured { .. })
    }
}

/// One (engine, scenario) outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    /// Engine name
    pub engine: String,
    /// Route table name
    pub table: String,
    /// Scenario name, e.g. `GPlusParam`
    pub scenario: String,
    /// Figures or failure
    #[serde(flatten)]
    pub status: ResultStatus,
}

impl BenchmarkResult {
    /// `<engine>_<scenario>`, the name benchmarks are listed under
    #[must_use]
    pub fn bench_name(&self) -> String {
        format!("{}_{}", self.engine, self.scenario)
    }
}

/// Retained heap after building one engine for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryFootprint {
    /// Engine name
    pub engine: String,
    /// Route table name
    pub table: String,
    /// Routes registered
    pub routes: usize,
    /// Retained bytes; `None` when no figure could be taken
    pub bytes: Option<u64>,
    /// Where `bytes` came from
    pub source: Option<MemorySource>,
}

/// What a run is about to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    /// Engines, in registry order
    pub engines: Vec<String>,
    /// Route tables, in run order
    pub tables: Vec<String>,
    /// Measured passes (unless time-boxed)
    pub iterations: u64,
    /// Warm-up passes
    pub warmup_iterations: u64,
    /// Time box for the measured phase
    pub duration_ms: Option<u64>,
    /// Memory source, if any
    pub memory_source: Option<MemorySource>,
}

/// Everything a run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// Construction footprints for engines that built
    pub footprints: Vec<MemoryFootprint>,
    /// One entry per (engine, scenario)
    pub results: Vec<BenchmarkResult>,
    /// Build errors, one per excluded (engine, table)
    pub build_failures: Vec<String>,
}

impl Report {
    /// Results that ended in [`ResultStatus::Failed`]
    pub fn failed(&self) -> impl Iterator<Item = &BenchmarkResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, ResultStatus::Failed { .. }))
    }

    /// No engine was excluded and no dispatch failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.build_failures.is_empty() && self.failed().next().is_none()
    }

    /// Result by engine and scenario name
    #[must_use]
    pub fn result(&self, engine: &str, scenario: &str) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .find(|r| r.engine == engine && r.scenario == scenario)
    }
}

/// Destination for streamed results
pub trait ReportSink {
    /// Called once before anything is measured
    fn begin(&mut self, info: &RunInfo) -> io::Result<()>;

    /// Called once per engine that built a table
    fn record_footprint(&mut self, footprint: &MemoryFootprint) -> io::Result<()>;

    /// Called once per (engine, scenario), excluded engines included
    fn record_result(&mut self, result: &BenchmarkResult) -> io::Result<()>;

    /// Called once at the end
    fn finish(&mut self, report: &Report) -> io::Result<()>;
}

/// Sink that keeps nothing; the returned [`Report`] is all a caller gets
#[derive(Debug, Default)]
pub struct NullReport;

impl ReportSink for NullReport {
    fn begin(&mut self, _info: &RunInfo) -> io::Result<()> {
        Ok(())
    }

    fn record_footprint(&mut self, _footprint: &MemoryFootprint) -> io::Result<()> {
        Ok(())
    }

    fn record_result(&mut self, _result: &BenchmarkResult) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self, _report: &Report) -> io::Result<()> {
        Ok(())
    }
}

/// Aligned plain-text output
pub struct TextReport<W: Write> {
    out: W,
    current_table: Option<String>,
    wrote_results: bool,
}

impl<W: Write> TextReport<W> {
    /// Report into `out`. Nothing is written until the run begins.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            current_table: None,
            wrote_results: false,
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn begin(&mut self, info: &RunInfo) -> io::Result<()> {
        let budget = match info.duration_ms {
            Some(ms) => format!("{ms} ms"),
            None => format!("{} passes", info.iterations),
        };
        writeln!(
            self.out,
            "engines: {}; warm-up {} passes, measured {}",
            info.engines.join(", "),
            info.warmup_iterations,
            budget
        )
    }

    fn record_footprint(&mut self, footprint: &MemoryFootprint) -> io::Result<()> {
        if self.current_table.as_deref() != Some(footprint.table.as_str()) {
            writeln!(self.out)?;
            writeln!(self.out, "#{} Routes: {}", footprint.table, footprint.routes)?;
            self.current_table = Some(footprint.table.clone());
            self.wrote_results = false;
        }
        match (footprint.bytes, footprint.source) {
            (Some(bytes), Some(source)) => writeln!(
                self.out,
                "   {}: {} Bytes ({})",
                footprint.engine, bytes, source
            ),
            _ => writeln!(self.out, "   {}: n/a", footprint.engine),
        }
    }

    fn record_result(&mut self, result: &BenchmarkResult) -> io::Result<()> {
        if !self.wrote_results {
            writeln!(self.out)?;
            self.wrote_results = true;
        }
        let name = result.bench_name();
        match &result.status {
            ResultStatus::Measured {
                dispatches,
                ns_per_op,
                ..
            } => writeln!(self.out, "{name:<40} {dispatches:>12} {ns_per_op:>12.2} ns/op"),
            ResultStatus::Failed { reason } => writeln!(self.out, "{name:<40} FAIL  {reason}"),
            ResultStatus::Excluded { reason } => writeln!(self.out, "{name:<40} SKIP  {reason}"),
        }
    }

    fn finish(&mut self, report: &Report) -> io::Result<()> {
        writeln!(self.out)?;
        if report.is_success() {
            writeln!(self.out, "ok")?;
        } else {
            writeln!(
                self.out,
                "FAIL: {} engine(s) excluded, {} result(s) failed",
                report.build_failures.len(),
                report.failed().count()
            )?;
        }
        self.out.flush()
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonLine<'a> {
    Begin(&'a RunInfo),
    Footprint(&'a MemoryFootprint),
    Result(&'a BenchmarkResult),
    Summary {
        success: bool,
        results: usize,
        failed: usize,
        build_failures: &'a [String],
    },
}

/// One JSON object per line
pub struct JsonReport<W: Write> {
    out: W,
}

impl<W: Write> JsonReport<W> {
    /// Stream lines into `out`, one per event
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &JsonLine<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, line)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn begin(&mut self, info: &RunInfo) -> io::Result<()> {
        self.line(&JsonLine::Begin(info))
    }

    fn record_footprint(&mut self, footprint: &MemoryFootprint) -> io::Result<()> {
        self.line(&JsonLine::Footprint(footprint))
    }

    fn record_result(&mut self, result: &BenchmarkResult) -> io::Result<()> {
        self.line(&JsonLine::Result(result))
    }

    fn finish(&mut self, report: &Report) -> io::Result<()> {
        self.line(&JsonLine::Summary {
            success: report.is_success(),
            results: report.results.len(),
            failed: report.failed().count(),
            build_failures: &report.build_failures,
        })?;
        self.out.flush()
    }
}
