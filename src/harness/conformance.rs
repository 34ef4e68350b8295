//! Behavioural checks every engine must pass before its numbers mean anything.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::{guarded_build, panic_message, Harness};
use crate::adapter::{AdapterRegistry, Dispatcher, Handler, RouterAdapter};
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::RouteTable;
use crate::scenario::{ApiExample, ScenarioKind};

/// Path no example table routes
pub const UNKNOWN_PATH: &str = "/unknown";

/// One failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceFailure {
    /// Engine name
    pub engine: &'static str,
    /// Route table name
    pub table: String,
    /// Check name: `build`, `static`, `param`, `two-params`, `unknown`,
    /// `overlong`, `sweep` or `echo`
    pub check: &'static str,
    /// What was observed
    pub detail: String,
}

impl fmt::Display for ConformanceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.engine, self.table, self.check, self.detail
        )
    }
}

/// Suffix appended to the static path for the over-long request
const OVERLONG_SUFFIX: &str = "/x/y/z/nonexistent";

/// What one dispatch did
struct Observed {
    outcome: Outcome,
    written: usize,
    matched: Option<usize>,
}

/// Dispatch once, catching a panic
fn try_dispatch(dispatcher: &dyn Dispatcher, req: &RequestDescriptor<'_>) -> Result<Observed, String> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let mut sink = ResponseSink::new();
        let outcome = dispatcher.dispatch(req, &mut sink);
        Observed {
            outcome,
            written: sink.written(),
            matched: sink.matched(),
        }
    }))
    .map_err(|payload| format!("{req} panicked: {}", panic_message(payload.as_ref())))
}

/// Compare a dispatch through a marked table with the entry `table.lookup`
/// selects. `None` from the lookup means the request must not be routed.
fn route_mismatch(table: &RouteTable, req: &RequestDescriptor<'_>, observed: &Observed) -> Option<String> {
    let describe = |index: usize| match table.get(index) {
        Some(route) => format!("#{index} ({route})"),
        None => format!("#{index}"),
    };
    match (table.lookup(req.method, req.path), observed.outcome, observed.matched) {
        (Some(expected), Outcome::Handled, Some(got)) if got == expected => None,
        (Some(expected), Outcome::Handled, Some(got)) => Some(format!(
            "{req} routed to {}, expected {}",
            describe(got),
            describe(expected)
        )),
        (Some(_), Outcome::Handled, None) => Some(format!("{req} handled without running a route handler")),
        (Some(expected), Outcome::NotFound, _) => {
            Some(format!("{req} not found, expected {}", describe(expected)))
        }
        (None, Outcome::NotFound, _) => None,
        (None, Outcome::Handled, got) => Some(format!(
            "{req} was routed (to {}), expected not found",
            got.map_or_else(|| "?".to_string(), describe)
        )),
    }
}

impl Harness {
    /// Run every check for `adapter` against `example`.
    ///
    /// The table is built with [`Handler::Mark`] on every route, so each
    /// check sees which entry the engine selected and compares it with
    /// [`RouteTable::lookup`]:
    ///
    /// - `build`: the table builds
    /// - `static`: the static request hits its entry and writes zero bytes
    /// - `param`: the one-parameter request hits its entry
    /// - `two-params`: the nested request hits its entry
    /// - `unknown`: `GET /unknown` is not found
    /// - `overlong`: the static path with extra segments appended is routed
    ///   only where the table really matches it (usually nowhere)
    /// - `sweep`: every route pattern, requested literally, hits its entry
    /// - `echo`: a single echo route writes exactly the parameter's value
    ///
    /// An empty result means the engine conforms.
    #[must_use]
    pub fn check_adapter(&self, adapter: &dyn RouterAdapter, example: &ApiExample) -> Vec<ConformanceFailure> {
        let mut failures = Vec::new();
        let mut fail = |check: &'static str, detail: String| {
            failures.push(ConformanceFailure {
                engine: adapter.name(),
                table: example.name().to_string(),
                check,
                detail,
            });
        };
        let table = &example.table;

        let marked = guarded_build(adapter, || {
            adapter.build_table(table, &|index| Handler::Mark { index })
        });
        match marked {
            Ok(dispatcher) => {
                let dispatcher = dispatcher.as_ref();
                let mut routed = |check: &'static str, req: RequestDescriptor<'_>| {
                    match try_dispatch(dispatcher, &req) {
                        Ok(observed) => {
                            if let Some(detail) = route_mismatch(table, &req, &observed) {
                                fail(check, detail);
                            } else if check == "static" && observed.written != 0 {
                                fail(check, format!("{req} wrote {} bytes, expected 0", observed.written));
                            }
                        }
                        Err(e) => fail(check, e),
                    }
                };

                let s = &example.static_request;
                routed("static", RequestDescriptor::new(&s.method, &s.path));

                let p = &example.param_request.request;
                routed("param", RequestDescriptor::new(&p.method, &p.path));

                let t = &example.two_params_request;
                routed("two-params", RequestDescriptor::new(&t.method, &t.path));

                let get = http::Method::GET;
                routed("unknown", RequestDescriptor::new(&get, UNKNOWN_PATH));

                let overlong = format!("{}{OVERLONG_SUFFIX}", s.path.trim_end_matches('/'));
                routed("overlong", RequestDescriptor::new(&s.method, &overlong));

                let sweep = example.scenario(ScenarioKind::All);
                for req in sweep.requests() {
                    routed("sweep", req);
                }
            }
            Err(e) => fail("build", e.to_string()),
        }

        let p = &example.param_request;
        match self.build_echo(adapter, example) {
            Ok(dispatcher) => {
                let req = RequestDescriptor::with_param(&p.request.method, &p.request.path, &p.name);
                match try_dispatch(dispatcher.as_ref(), &req) {
                    Ok(Observed {
                        outcome: Outcome::Handled,
                        written,
                        ..
                    }) if written == p.value.len() => {}
                    Ok(Observed {
                        outcome: Outcome::Handled,
                        written,
                        ..
                    }) => fail(
                        "echo",
                        format!("{req} wrote {written} bytes, expected {} ('{}')", p.value.len(), p.value),
                    ),
                    Ok(Observed {
                        outcome: Outcome::NotFound,
                        ..
                    }) => fail("echo", format!("{req} not found")),
                    Err(e) => fail("echo", e),
                }
            }
            Err(e) => fail("echo", e.to_string()),
        }

        if failures.is_empty() {
            debug!(engine = adapter.name(), table = example.name(), "conforms");
        } else {
            for f in &failures {
                warn!(engine = f.engine, table = %f.table, check = f.check, detail = %f.detail, "conformance failure");
            }
        }
        failures
    }

    /// [`check_adapter`](Self::check_adapter) for every engine and example
    #[must_use]
    pub fn check_all(&self, registry: &AdapterRegistry, examples: &[ApiExample]) -> Vec<ConformanceFailure> {
        examples
            .iter()
            .flat_map(|example| {
                registry
                    .iter()
                    .flat_map(move |adapter| self.check_adapter(adapter, example))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::RegexAdapter;
    use crate::config::BenchConfig;

    #[test]
    fn regex_engine_conforms_on_gplus() {
        let harness = Harness::with_probe(BenchConfig::default(), None);
        let failures = harness.check_adapter(&RegexAdapter, &ApiExample::gplus());
        assert!(failures.is_empty(), "{failures:?}");
    }

    #[test]
    fn failure_display() {
        let f = ConformanceFailure {
            engine: "radix",
            table: "GPlus".to_string(),
            check: "echo",
            detail: "not found".to_string(),
        };
        assert_eq!(f.to_string(), "radix [GPlus] echo: not found");
    }
}
