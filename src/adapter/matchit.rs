//! Adapter for `matchit`.
//!
//! `matchit` has no notion of methods and uses `{name}` / `{*name}`
//! syntax, so the adapter keeps one router per method slot and rewrites
//! patterns into bracket form.

use http::Method;

use super::handler::{self, Handler};
use super::{parse_route, BuildError, Dispatcher, MethodTable, RouterAdapter, UnsupportedReason};
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{Route, RouteTable};

const NAME: &str = "matchit";

/// Compressed radix tree from the `matchit` crate
pub struct MatchitAdapter;

struct MatchitDispatcher {
    routers: MethodTable<matchit::Router<Handler>>,
}

impl MatchitDispatcher {
    fn new() -> Self {
        Self {
            routers: MethodTable::new(),
        }
    }

    fn register(&mut self, route: &Route, handler: Handler) -> Result<(), BuildError> {
        let pattern = parse_route(NAME, route)?;
        let router = self
            .routers
            .entry(&route.method, matchit::Router::new)
            .ok_or_else(|| BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Method))?;
        router.insert(pattern.to_brackets(), handler).map_err(|e| {
            BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Rejected(e.to_string()))
        })
    }
}

impl Dispatcher for MatchitDispatcher {
    #[inline]
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        let Some(router) = self.routers.get(req.method) else {
            return Outcome::NotFound;
        };
        match router.at(req.path) {
            Ok(m) => {
                handler::invoke(m.value, sink, |name| m.params.get(name));
                Outcome::Handled
            }
            Err(_) => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for MatchitAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = MatchitDispatcher::new();
        for (index, route) in routes.iter().enumerate() {
            dispatcher.register(route, handler_for(index))?;
        }
        Ok(Box::new(dispatcher))
    }

    fn build_single(
        &self,
        method: &Method,
        path: &str,
        handler: Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = MatchitDispatcher::new();
        dispatcher.register(&Route::new(method.clone(), path), handler)?;
        Ok(Box::new(dispatcher))
    }
}
