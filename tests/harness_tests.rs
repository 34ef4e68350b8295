//! Harness isolation: one misbehaving engine never spoils the others.

use http::Method;
use routerbench::adapter::{
    handler, AdapterRegistry, BuildError, Dispatcher, Handler, RadixAdapter, RouterAdapter,
    UnsupportedReason,
};
use routerbench::config::BenchConfig;
use routerbench::harness::{DispatchErrorKind, Harness};
use routerbench::report::{JsonReport, NullReport, ResultStatus};
use routerbench::request::{Outcome, RequestDescriptor, ResponseSink};
use routerbench::routes::{Route, RouteTable};
use routerbench::scenario::{ApiExample, ScenarioKind};

fn quick() -> BenchConfig {
    BenchConfig {
        iterations: 20,
        warmup_iterations: 2,
        duration: None,
    }
}

/// Refuses every table
struct RejectingAdapter;

impl RouterAdapter for RejectingAdapter {
    fn name(&self) -> &'static str {
        "rejecting"
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        _: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let route = routes.get(0).cloned().unwrap_or_else(|| Route::new(Method::GET, "/"));
        Err(BuildError::unsupported(
            self.name(),
            route,
            UnsupportedReason::Rejected("nope".to_string()),
        ))
    }

    fn build_single(&self, method: &Method, path: &str, _: Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Err(BuildError::unsupported(
            self.name(),
            Route::new(method.clone(), path),
            UnsupportedReason::Rejected("nope".to_string()),
        ))
    }
}

/// Panics while building
struct PanickingBuilder;

impl RouterAdapter for PanickingBuilder {
    fn name(&self) -> &'static str {
        "panicking-builder"
    }

    fn build_table(&self, _: &RouteTable, _: &dyn Fn(usize) -> Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        panic!("tree exploded");
    }

    fn build_single(&self, _: &Method, _: &str, _: Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        panic!("tree exploded");
    }
}

/// Builds, then panics on any path with a parameter-looking segment
struct PanickyDispatch;

struct PanickyDispatcher;

impl Dispatcher for PanickyDispatcher {
    fn dispatch(&self, req: &RequestDescriptor<'_>, _: &mut ResponseSink) -> Outcome {
        if req.path.contains("118051310819094153327") {
            panic!("bad segment");
        }
        Outcome::Handled
    }
}

impl RouterAdapter for PanickyDispatch {
    fn name(&self) -> &'static str {
        "panicky-dispatch"
    }

    fn build_table(&self, _: &RouteTable, _: &dyn Fn(usize) -> Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Ok(Box::new(PanickyDispatcher))
    }

    fn build_single(&self, _: &Method, _: &str, _: Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Ok(Box::new(PanickyDispatcher))
    }
}

/// Routes nothing
struct BlindAdapter;

struct BlindDispatcher;

impl Dispatcher for BlindDispatcher {
    fn dispatch(&self, _: &RequestDescriptor<'_>, _: &mut ResponseSink) -> Outcome {
        Outcome::NotFound
    }
}

impl RouterAdapter for BlindAdapter {
    fn name(&self) -> &'static str {
        "blind"
    }

    fn build_table(&self, _: &RouteTable, _: &dyn Fn(usize) -> Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Ok(Box::new(BlindDispatcher))
    }

    fn build_single(&self, _: &Method, _: &str, _: Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Ok(Box::new(BlindDispatcher))
    }
}

/// Matches on method and first segment only, taking the first such route
struct FirstSegmentAdapter;

struct FirstSegmentDispatcher {
    routes: Vec<(Method, String, Handler)>,
}

fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or("")
}

impl Dispatcher for FirstSegmentDispatcher {
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        let wanted = first_segment(req.path);
        match self
            .routes
            .iter()
            .find(|(method, head, _)| method == req.method && head == wanted)
        {
            Some((_, _, handler)) => {
                handler::invoke(handler, sink, |_| req.path.rsplit('/').next());
                Outcome::Handled
            }
            None => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for FirstSegmentAdapter {
    fn name(&self) -> &'static str {
        "first-segment"
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let routes = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.method.clone(), first_segment(&r.path).to_string(), handler_for(i)))
            .collect();
        Ok(Box::new(FirstSegmentDispatcher { routes }))
    }

    fn build_single(&self, method: &Method, path: &str, handler: Handler) -> Result<Box<dyn Dispatcher>, BuildError> {
        Ok(Box::new(FirstSegmentDispatcher {
            routes: vec![(method.clone(), first_segment(path).to_string(), handler)],
        }))
    }
}

fn registry_with(extra: Vec<Box<dyn RouterAdapter>>) -> AdapterRegistry {
    let mut registry = AdapterRegistry::builtin();
    for adapter in extra {
        registry.register(adapter).unwrap();
    }
    registry
}

#[test]
fn test_build_failure_excludes_only_that_engine() {
    let harness = Harness::with_probe(quick(), None);
    let registry = registry_with(vec![Box::new(RejectingAdapter), Box::new(PanickingBuilder)]);
    let report = harness
        .run(&registry, &[ApiExample::gplus()], &mut NullReport)
        .unwrap();

    assert!(!report.is_success());
    // each fails the table build and the single echo build
    assert_eq!(report.build_failures.len(), 4);
    assert!(report.build_failures[1].contains("tree exploded"));
    assert!(report.build_failures[3].contains("tree exploded"));
    assert_eq!(report.footprints.len(), 5);

    // 7 engines x (4 table scenarios + ParamWrite)
    assert_eq!(report.results.len(), 35);
    for result in &report.results {
        match result.engine.as_str() {
            "rejecting" | "panicking-builder" => {
                assert!(matches!(result.status, ResultStatus::Excluded { .. }), "{result:?}");
            }
            _ => assert!(result.status.is_measured(), "{result:?}"),
        }
    }
}

#[test]
fn test_dispatch_panic_fails_one_scenario() {
    let harness = Harness::with_probe(quick(), None);
    let registry = registry_with(vec![Box::new(PanickyDispatch)]);
    let report = harness
        .run(&registry, &[ApiExample::gplus()], &mut NullReport)
        .unwrap();

    assert!(report.build_failures.is_empty());
    let failed: Vec<_> = report.failed().map(|r| r.scenario.as_str()).collect();
    assert_eq!(failed, vec!["GPlusParam", "GPlus2Params", "GPlusParamWrite"]);
    let param = report.result("panicky-dispatch", "GPlusParam").unwrap();
    match &param.status {
        ResultStatus::Failed { reason } => {
            assert!(reason.contains("GET /people/118051310819094153327"), "{reason}");
            assert!(reason.contains("bad segment"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(report
        .result("panicky-dispatch", "GPlusStatic")
        .unwrap()
        .status
        .is_measured());
    assert!(report.result("radix", "GPlusParam").unwrap().status.is_measured());
}

#[test]
fn test_not_found_is_a_failure_with_the_request() {
    let harness = Harness::with_probe(quick(), None);
    let example = ApiExample::gplus();
    let sweep = example.scenario(ScenarioKind::All);
    let err = harness
        .measure_throughput("blind", &BlindDispatcher, &sweep)
        .unwrap_err();
    assert_eq!(err.kind, DispatchErrorKind::NotFound);
    assert_eq!(err.request.method, Method::GET);
    assert_eq!(err.request.path, "/people/:userId");
    assert_eq!(err.scenario, "GPlusAll");
}

#[test]
fn test_isolation_results_do_not_depend_on_neighbours() {
    let harness = Harness::with_probe(quick(), None);
    let example = ApiExample::gplus();

    let alone = harness
        .run(
            &AdapterRegistry::builtin().select(&["radix"]).unwrap(),
            std::slice::from_ref(&example),
            &mut NullReport,
        )
        .unwrap();
    let crowded = harness
        .run(
            &registry_with(vec![Box::new(BlindAdapter), Box::new(RejectingAdapter)]),
            std::slice::from_ref(&example),
            &mut NullReport,
        )
        .unwrap();

    for scenario in example.scenarios() {
        let a = alone.result("radix", scenario.name()).unwrap();
        let b = crowded.result("radix", scenario.name()).unwrap();
        match (&a.status, &b.status) {
            (
                ResultStatus::Measured { dispatches: x, .. },
                ResultStatus::Measured { dispatches: y, .. },
            ) => assert_eq!(x, y),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert!(alone.is_success());
    assert!(!crowded.is_success());
}

#[test]
fn test_conformance_catches_a_blind_engine() {
    let harness = Harness::with_probe(quick(), None);
    let failures = harness.check_adapter(&BlindAdapter, &ApiExample::gplus());
    let checks: Vec<_> = failures.iter().map(|f| f.check).collect();
    assert!(checks.contains(&"static"));
    assert!(checks.contains(&"sweep"));
    assert!(checks.contains(&"echo"));
    assert!(!checks.contains(&"unknown"));

    let failures = harness.check_adapter(&PanickingBuilder, &ApiExample::gplus());
    let checks: Vec<_> = failures.iter().map(|f| f.check).collect();
    assert_eq!(checks, vec!["build", "echo"]);
}

#[test]
fn test_conformance_catches_misrouting() {
    let harness = Harness::with_probe(quick(), None);
    let failures = harness.check_adapter(&FirstSegmentAdapter, &ApiExample::gplus());
    let checks: Vec<_> = failures.iter().map(|f| f.check).collect();
    // `/people` lands on `/people/:userId`, the first GET under `people`
    assert!(checks.contains(&"static"), "{failures:#?}");
    assert!(checks.contains(&"two-params"), "{failures:#?}");
    assert!(checks.contains(&"overlong"), "{failures:#?}");
    assert!(checks.contains(&"sweep"), "{failures:#?}");
    assert!(!checks.contains(&"param"), "{failures:#?}");
    assert!(!checks.contains(&"unknown"), "{failures:#?}");

    let stat = failures.iter().find(|f| f.check == "static").unwrap();
    assert!(stat.detail.contains("routed to #0 (GET /people/:userId)"), "{}", stat.detail);
    assert!(stat.detail.contains("expected #1 (GET /people)"), "{}", stat.detail);

    // Its misrouting still runs at full speed.
    let report = harness
        .run(
            &registry_with(vec![Box::new(FirstSegmentAdapter)]),
            &[ApiExample::gplus()],
            &mut NullReport,
        )
        .unwrap();
    assert!(report.result("first-segment", "GPlusStatic").unwrap().status.is_measured());
}

#[test]
fn test_json_report_streams_every_result() {
    let harness = Harness::with_probe(quick(), None);
    let mut sink = JsonReport::new(Vec::<u8>::new());
    let registry = AdapterRegistry::builtin().select(&["radix", "regex"]).unwrap();
    let report = harness
        .run(&registry, &[ApiExample::static_files()], &mut sink)
        .unwrap();
    assert!(report.is_success());

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // begin + 2 footprints + 10 results + summary
    assert_eq!(lines.len(), 14);
    assert_eq!(lines[0]["type"], "begin");
    assert_eq!(lines[0]["iterations"], 20);
    assert_eq!(lines[1]["type"], "footprint");
    assert_eq!(lines[1]["routes"], 6);
    let results: Vec<_> = lines.iter().filter(|l| l["type"] == "result").collect();
    assert_eq!(results.len(), 10);
    assert_eq!(results[0]["scenario"], "StaticFilesStatic");
    assert_eq!(results[0]["dispatches"], 20);
    assert_eq!(results[8]["scenario"], "StaticFilesParamWrite");
    assert_eq!(results[8]["engine"], "radix");
    assert_eq!(lines[13]["type"], "summary");
}

#[test]
fn test_measured_dispatch_counts() {
    let harness = Harness::with_probe(quick(), None);
    let example = ApiExample::gplus();
    let (dispatcher, _) = harness
        .measure_construction(&RadixAdapter, &example.table)
        .unwrap();
    for scenario in example.scenarios() {
        let (dispatches, _) = harness
            .measure_throughput("radix", dispatcher.as_ref(), &scenario)
            .unwrap();
        assert_eq!(dispatches, 20 * scenario.len() as u64, "{}", scenario.name());
    }
}
