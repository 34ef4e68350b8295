//! # Harness Module
//!
//! Drives every registered engine through the same tables and scenarios and
//! collects comparable figures.
//!
//! ## Phases
//!
//! For each [`ApiExample`]:
//!
//! 1. **Construction**: every adapter builds the table in turn
//!    ([`Harness::measure_construction`]). The allocator is settled before
//!    and after, and the retained delta is the footprint. A build error or
//!    panic excludes that engine from every scenario of the table.
//! 2. **Throughput**: for each scenario, each built engine runs
//!    `warmup_iterations` unmeasured passes then a measured phase
//!    ([`Harness::measure_throughput`]). A pass is one walk of the scenario's
//!    request sequence.
//! 3. **Echo throughput**: every engine builds the param pattern alone,
//!    bound to an echo handler ([`Harness::build_echo`]), and the
//!    `<Table>ParamWrite` scenario is measured against it. A failed single
//!    build excludes only that result.
//!
//! Everything is sequential. One engine's failure never stops the others.
//!
//! ## Failures
//!
//! During a scenario every request must be handled. A panic inside dispatch
//! or a `NotFound` marks that (engine, scenario) result as failed with the
//! offending request; the rest of the run carries on.

mod conformance;

pub use self::conformance::{ConformanceFailure, UNKNOWN_PATH};

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::hint::black_box;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::adapter::{AdapterRegistry, BuildError, Dispatcher, Handler, RouterAdapter};
use crate::config::BenchConfig;
use crate::memory::{MeasurementError, MemoryProbe};
use crate::report::{
    BenchmarkResult, MemoryFootprint, Report, ReportSink, ResultStatus, RunInfo,
};
use crate::request::{OwnedRequest, Outcome, ResponseSink};
use crate::routes::RouteTable;
use crate::scenario::{ApiExample, Scenario, ScenarioKind};

/// What went wrong on one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// The engine or handler panicked
    Panicked(String),
    /// No route matched a request the scenario expects to be routed
    NotFound,
}

/// A failed dispatch during a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    /// Engine name
    pub engine: String,
    /// Scenario name
    pub scenario: String,
    /// Request that failed
    pub request: OwnedRequest,
    /// Panic or miss
    pub kind: DispatchErrorKind,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DispatchErrorKind::Panicked(msg) => write!(
                f,
                "{} {}: {} panicked: {msg}",
                self.engine, self.scenario, self.request
            ),
            DispatchErrorKind::NotFound => write!(
                f,
                "{} {}: {} matched no route",
                self.engine, self.scenario, self.request
            ),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Build through `adapter`, turning a panic into [`BuildError::Panicked`]
pub(crate) fn guarded_build(
    adapter: &dyn RouterAdapter,
    build: impl FnOnce() -> Result<Box<dyn Dispatcher>, BuildError>,
) -> Result<Box<dyn Dispatcher>, BuildError> {
    panic::catch_unwind(AssertUnwindSafe(build)).unwrap_or_else(|payload| {
        Err(BuildError::Panicked {
            engine: adapter.name(),
            message: panic_message(payload.as_ref()),
        })
    })
}

/// Sequential measurement driver
pub struct Harness {
    config: BenchConfig,
    probe: Option<MemoryProbe>,
}

impl Harness {
    /// Harness using the first available memory source
    #[must_use]
    pub fn new(config: BenchConfig) -> Self {
        let probe = match MemoryProbe::detect() {
            Ok(probe) => {
                debug!(source = %probe.source(), "memory source selected");
                Some(probe)
            }
            Err(e) => {
                warn!(error = %e, "construction footprints will be omitted");
                None
            }
        };
        Self { config, probe }
    }

    /// Harness with an explicit memory probe (or none)
    #[must_use]
    pub fn with_probe(config: BenchConfig, probe: Option<MemoryProbe>) -> Self {
        Self { config, probe }
    }

    /// Active settings
    #[must_use]
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Active memory probe
    #[must_use]
    pub fn probe(&self) -> Option<&MemoryProbe> {
        self.probe.as_ref()
    }

    /// Build `table` with `adapter` and measure what the result retains.
    ///
    /// The dispatcher is returned alive; dropping it releases the footprint.
    ///
    /// # Errors
    ///
    /// The adapter's [`BuildError`], or [`BuildError::Panicked`] if it panicked.
    pub fn measure_construction(
        &self,
        adapter: &dyn RouterAdapter,
        table: &RouteTable,
    ) -> Result<(Box<dyn Dispatcher>, MemoryFootprint), BuildError> {
        let before = self.snapshot();
        let dispatcher = guarded_build(adapter, || adapter.build_bulk(table))?;
        let after = self.snapshot();

        let (bytes, source) = match (before, after) {
            (Ok(b), Ok(a)) => (Some(a.saturating_sub(b)), self.probe.map(|p| p.source())),
            (Err(e), _) | (_, Err(e)) => {
                debug!(engine = adapter.name(), error = %e, "no footprint figure");
                (None, None)
            }
        };
        info!(
            engine = adapter.name(),
            table = table.name(),
            routes = table.len(),
            bytes = ?bytes,
            "built"
        );
        Ok((
            dispatcher,
            MemoryFootprint {
                engine: adapter.name().to_string(),
                table: table.name().to_string(),
                routes: table.len(),
                bytes,
                source,
            },
        ))
    }

    /// Build the single echo route `example`'s param request is meant for,
    /// as the `ParamWrite` scenario and the echo check use it.
    ///
    /// # Errors
    ///
    /// The adapter's [`BuildError`], or [`BuildError::Panicked`].
    pub fn build_echo(
        &self,
        adapter: &dyn RouterAdapter,
        example: &ApiExample,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let p = &example.param_request;
        guarded_build(adapter, || {
            adapter.build_single(&p.request.method, &p.pattern, Handler::echo(&p.name))
        })
    }

    fn snapshot(&self) -> Result<u64, MeasurementError> {
        match &self.probe {
            Some(probe) => probe.settled_snapshot(),
            None => Err(MeasurementError::Unavailable("no memory source")),
        }
    }

    /// Warm up then measure `scenario` against a built dispatcher.
    ///
    /// # Errors
    ///
    /// [`DispatchError`] on the first panic or unrouted request.
    pub fn measure_throughput(
        &self,
        engine: &str,
        dispatcher: &dyn Dispatcher,
        scenario: &Scenario,
    ) -> Result<(u64, Duration), DispatchError> {
        let position = Cell::new(0usize);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(u64, Duration), ()> {
            let mut sink = ResponseSink::new();
            for _ in 0..self.config.warmup_iterations {
                run_pass(dispatcher, scenario, &mut sink, &position)?;
            }

            let mut dispatches = 0u64;
            let start = Instant::now();
            match self.config.duration {
                Some(limit) => {
                    while start.elapsed() < limit {
                        dispatches += run_pass(dispatcher, scenario, &mut sink, &position)?;
                    }
                }
                None => {
                    for _ in 0..self.config.iterations {
                        dispatches += run_pass(dispatcher, scenario, &mut sink, &position)?;
                    }
                }
            }
            let elapsed = start.elapsed();
            black_box(sink.written());
            Ok((dispatches, elapsed))
        }));

        let failed_request = || {
            scenario
                .requests()
                .nth(position.get())
                .map(|r| OwnedRequest::from(&r))
                .unwrap_or_else(|| OwnedRequest {
                    method: http::Method::GET,
                    path: String::new(),
                })
        };
        let error = |kind| DispatchError {
            engine: engine.to_string(),
            scenario: scenario.name().to_string(),
            request: failed_request(),
            kind,
        };
        match outcome {
            Ok(Ok(figures)) => Ok(figures),
            Ok(Err(())) => Err(error(DispatchErrorKind::NotFound)),
            Err(payload) => Err(error(DispatchErrorKind::Panicked(panic_message(
                payload.as_ref(),
            )))),
        }
    }

    /// Construction and throughput for every engine, table and scenario.
    ///
    /// # Errors
    ///
    /// Only I/O errors from `sink`. Engine failures are recorded, not returned.
    pub fn run(
        &self,
        registry: &AdapterRegistry,
        examples: &[ApiExample],
        sink: &mut dyn ReportSink,
    ) -> io::Result<Report> {
        let mut report = Report::default();
        sink.begin(&RunInfo {
            engines: registry.names().iter().map(|n| n.to_string()).collect(),
            tables: examples.iter().map(|e| e.name().to_string()).collect(),
            iterations: self.config.iterations,
            warmup_iterations: self.config.warmup_iterations,
            duration_ms: self
                .config
                .duration
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            memory_source: self.probe.map(|p| p.source()),
        })?;

        for example in examples {
            for issue in example.table.validate() {
                warn!(table = example.name(), %issue, "route table issue");
            }

            let mut built: Vec<(&'static str, Box<dyn Dispatcher>)> = Vec::new();
            let mut excluded: Vec<(&'static str, String)> = Vec::new();
            for adapter in registry.iter() {
                match self.measure_construction(adapter, &example.table) {
                    Ok((dispatcher, footprint)) => {
                        sink.record_footprint(&footprint)?;
                        report.footprints.push(footprint);
                        built.push((adapter.name(), dispatcher));
                    }
                    Err(e) => {
                        warn!(engine = adapter.name(), table = example.name(), error = %e, "engine excluded");
                        report.build_failures.push(e.to_string());
                        excluded.push((adapter.name(), e.to_string()));
                    }
                }
            }

            for scenario in example.scenarios() {
                info!(scenario = scenario.name(), dispatches_per_pass = scenario.len(), "scenario");
                for adapter in registry.iter() {
                    let name = adapter.name();
                    let status = if let Some((_, dispatcher)) = built.iter().find(|(n, _)| *n == name) {
                        match self.measure_throughput(name, dispatcher.as_ref(), &scenario) {
                            Ok((dispatches, elapsed)) => ResultStatus::measured(dispatches, elapsed),
                            Err(e) => {
                                warn!(error = %e, "scenario failed");
                                ResultStatus::Failed {
                                    reason: e.to_string(),
                                }
                            }
                        }
                    } else {
                        let reason = excluded
                            .iter()
                            .find(|(n, _)| *n == name)
                            .map(|(_, r)| r.clone())
                            .unwrap_or_default();
                        ResultStatus::Excluded { reason }
                    };
                    let result = BenchmarkResult {
                        engine: name.to_string(),
                        table: example.name().to_string(),
                        scenario: scenario.name().to_string(),
                        status,
                    };
                    sink.record_result(&result)?;
                    report.results.push(result);
                }
            }

            let scenario = example.scenario(ScenarioKind::ParamWrite);
            info!(scenario = scenario.name(), "scenario");
            for adapter in registry.iter() {
                let name = adapter.name();
                let status = match self.build_echo(adapter, example) {
                    Ok(dispatcher) => {
                        match self.measure_throughput(name, dispatcher.as_ref(), &scenario) {
                            Ok((dispatches, elapsed)) => ResultStatus::measured(dispatches, elapsed),
                            Err(e) => {
                                warn!(error = %e, "scenario failed");
                                ResultStatus::Failed {
                                    reason: e.to_string(),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(engine = name, scenario = scenario.name(), error = %e, "engine excluded");
                        report.build_failures.push(e.to_string());
                        ResultStatus::Excluded {
                            reason: e.to_string(),
                        }
                    }
                };
                let result = BenchmarkResult {
                    engine: name.to_string(),
                    table: example.name().to_string(),
                    scenario: scenario.name().to_string(),
                    status,
                };
                sink.record_result(&result)?;
                report.results.push(result);
            }
        }

        sink.finish(&report)?;
        Ok(report)
    }
}

/// One walk of the scenario. `Err(())` on the first unrouted request,
/// whose index is left in `position`.
#[inline]
fn run_pass(
    dispatcher: &dyn Dispatcher,
    scenario: &Scenario,
    sink: &mut ResponseSink,
    position: &Cell<usize>,
) -> Result<u64, ()> {
    let mut n = 0u64;
    for (i, req) in scenario.requests().enumerate() {
        position.set(i);
        match dispatcher.dispatch(black_box(&req), sink) {
            Outcome::Handled => n += 1,
            Outcome::NotFound => return Err(()),
        }
    }
    Ok(n)
}
