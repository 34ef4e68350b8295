//! Every built-in engine must route identically and run identical handlers.

use http::Method;
use routerbench::adapter::{AdapterRegistry, BuildError, Handler, RouterAdapter, UnsupportedReason};
use routerbench::config::BenchConfig;
use routerbench::harness::Harness;
use routerbench::request::{Outcome, RequestDescriptor, ResponseSink};
use routerbench::routes::{Route, RouteTable};
use routerbench::scenario::{ApiExample, ScenarioKind};

fn dispatch(
    dispatcher: &dyn routerbench::adapter::Dispatcher,
    method: &Method,
    path: &str,
) -> (Outcome, usize) {
    let mut sink = ResponseSink::new();
    let outcome = dispatcher.dispatch(&RequestDescriptor::new(method, path), &mut sink);
    (outcome, sink.written())
}

/// Dispatch through a table built with `Handler::Mark`, returning the index hit
fn matched(
    dispatcher: &dyn routerbench::adapter::Dispatcher,
    method: &Method,
    path: &str,
) -> (Outcome, Option<usize>) {
    let mut sink = ResponseSink::new();
    let outcome = dispatcher.dispatch(&RequestDescriptor::new(method, path), &mut sink);
    (outcome, sink.matched())
}

fn people_and_activities() -> RouteTable {
    RouteTable::new(
        "People",
        vec![
            Route::new(Method::GET, "/people"),
            Route::new(Method::GET, "/people/:userId"),
            Route::new(Method::GET, "/activities/:activityId/people/:collection"),
        ],
    )
}

#[test]
fn test_every_engine_selects_the_right_route() {
    let table = people_and_activities();
    let cases = [
        ("/people", Some(0)),
        ("/people/118051310819094153327", Some(1)),
        ("/activities/1/people/public", Some(2)),
        ("/people/x/y/z", None),
        ("/activities/1/people", None),
        ("/unknown", None),
    ];
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter
            .build_table(&table, &|index| Handler::Mark { index })
            .unwrap();
        for (path, expected) in cases {
            assert_eq!(table.lookup(&Method::GET, path), expected, "{path}");
            let (outcome, index) = matched(dispatcher.as_ref(), &Method::GET, path);
            match expected {
                Some(_) => assert_eq!(
                    (outcome, index),
                    (Outcome::Handled, expected),
                    "{} GET {path}",
                    adapter.name()
                ),
                None => assert_eq!(outcome, Outcome::NotFound, "{} GET {path}", adapter.name()),
            }
        }
    }
}

#[test]
fn test_gplus_requests_hit_their_entries() {
    let example = ApiExample::gplus();
    let cases = [
        (&example.static_request, 1),
        (&example.param_request.request, 0),
        (&example.two_params_request, 5),
    ];
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter
            .build_table(&example.table, &|index| Handler::Mark { index })
            .unwrap();
        for (probe, expected) in cases {
            assert_eq!(
                matched(dispatcher.as_ref(), &probe.method, &probe.path),
                (Outcome::Handled, Some(expected)),
                "{} {} {}",
                adapter.name(),
                probe.method,
                probe.path
            );
        }
        assert_eq!(
            matched(dispatcher.as_ref(), &Method::GET, "/people/x/y/z/nonexistent").0,
            Outcome::NotFound,
            "{}",
            adapter.name()
        );
    }
}

#[test]
fn test_every_engine_passes_conformance() {
    let harness = Harness::with_probe(BenchConfig::default(), None);
    let failures = harness.check_all(&AdapterRegistry::builtin(), &ApiExample::builtin());
    assert!(failures.is_empty(), "conformance failures: {failures:#?}");
}

#[test]
fn test_static_path_writes_nothing() {
    let example = ApiExample::gplus();
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter.build_bulk(&example.table).unwrap();
        let (outcome, written) = dispatch(dispatcher.as_ref(), &Method::GET, "/people");
        assert_eq!(outcome, Outcome::Handled, "{}", adapter.name());
        assert_eq!(written, 0, "{}", adapter.name());
    }
}

#[test]
fn test_echo_writes_exactly_the_value() {
    let value = "118051310819094153327";
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter
            .build_single(&Method::GET, "/people/:userId", Handler::echo("userId"))
            .unwrap();
        let path = format!("/people/{value}");
        let mut sink = ResponseSink::new();
        let req = RequestDescriptor::with_param(&Method::GET, &path, "userId");
        assert_eq!(dispatcher.dispatch(&req, &mut sink), Outcome::Handled);
        assert_eq!(sink.written(), value.len(), "{}", adapter.name());
    }
}

#[test]
fn test_echo_in_the_middle_of_a_nested_route() {
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter
            .build_single(
                &Method::GET,
                "/people/:userId/activities/:collection",
                Handler::echo("collection"),
            )
            .unwrap();
        let (outcome, written) = dispatch(
            dispatcher.as_ref(),
            &Method::GET,
            "/people/118051310819094153327/activities/public",
        );
        assert_eq!(outcome, Outcome::Handled, "{}", adapter.name());
        assert_eq!(written, "public".len(), "{}", adapter.name());
    }
}

#[test]
fn test_echo_wildcard_tail() {
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter
            .build_single(&Method::GET, "/static/*filepath", Handler::echo("filepath"))
            .unwrap();
        let (outcome, written) =
            dispatch(dispatcher.as_ref(), &Method::GET, "/static/css/site.css");
        assert_eq!(outcome, Outcome::Handled, "{}", adapter.name());
        assert_eq!(written, "css/site.css".len(), "{}", adapter.name());
    }
}

#[test]
fn test_unknown_path_is_not_found() {
    let example = ApiExample::gplus();
    for adapter in AdapterRegistry::builtin().iter() {
        let dispatcher = adapter.build_bulk(&example.table).unwrap();
        assert_eq!(
            dispatch(dispatcher.as_ref(), &Method::GET, "/unknown").0,
            Outcome::NotFound,
            "{}",
            adapter.name()
        );
        // Method mismatch on a known path
        assert_eq!(
            dispatch(dispatcher.as_ref(), &Method::PUT, "/people").0,
            Outcome::NotFound,
            "{}",
            adapter.name()
        );
    }
}

#[test]
fn test_full_sweep_routes_every_pattern_in_order() {
    for example in ApiExample::builtin() {
        let sweep = example.scenario(ScenarioKind::All);
        assert_eq!(sweep.len(), example.table.len());
        for adapter in AdapterRegistry::builtin().iter() {
            let dispatcher = adapter.build_bulk(&example.table).unwrap();
            let mut sink = ResponseSink::new();
            let mut seen = 0;
            for (req, route) in sweep.requests().zip(example.table.iter()) {
                assert_eq!(req.path, route.path);
                assert_eq!(
                    dispatcher.dispatch(&req, &mut sink),
                    Outcome::Handled,
                    "{} {}",
                    adapter.name(),
                    req
                );
                seen += 1;
            }
            assert_eq!(seen, example.table.len());
            assert_eq!(sink.written(), 0);
        }
    }
}

#[test]
fn test_extension_methods_split_the_engines() {
    let purge = Method::from_bytes(b"PURGE").unwrap();
    let table = RouteTable::new(
        "Purge",
        vec![
            Route::new(Method::GET, "/cache/:key"),
            Route::new(purge.clone(), "/cache/:key"),
        ],
    );
    for adapter in AdapterRegistry::builtin().iter() {
        match adapter.name() {
            "radix" | "regex" => {
                let dispatcher = adapter.build_bulk(&table).unwrap();
                assert_eq!(
                    dispatch(dispatcher.as_ref(), &purge, "/cache/k1").0,
                    Outcome::Handled
                );
            }
            _ => match adapter.build_bulk(&table) {
                Err(BuildError::UnsupportedRoute { route, reason, .. }) => {
                    assert_eq!(route.method, purge);
                    assert_eq!(reason, UnsupportedReason::Method);
                }
                Err(other) => panic!("{}: unexpected {other}", adapter.name()),
                Ok(_) => panic!("{} accepted PURGE", adapter.name()),
            },
        }
    }
}

#[test]
fn test_malformed_pattern_is_a_build_error() {
    let table = RouteTable::new(
        "Broken",
        vec![Route::new(Method::GET, "/files/*path/meta")],
    );
    for adapter in AdapterRegistry::builtin().iter() {
        let err = adapter.build_bulk(&table).err().unwrap();
        assert_eq!(err.engine(), adapter.name());
        assert!(matches!(
            err,
            BuildError::UnsupportedRoute {
                reason: UnsupportedReason::Pattern(_),
                ..
            }
        ));
    }
}

#[test]
fn test_duplicate_route_rejected_by_strict_engines() {
    let table = RouteTable::new(
        "Dup",
        vec![
            Route::new(Method::GET, "/a/:id"),
            Route::new(Method::GET, "/a/:id"),
        ],
    );
    assert_eq!(table.validate().len(), 1);
    for name in ["matchit", "radix", "regex"] {
        let registry = AdapterRegistry::builtin();
        let adapter: &dyn RouterAdapter = registry.get(name).unwrap();
        assert!(adapter.build_bulk(&table).is_err(), "{name} accepted a duplicate");
    }
}
