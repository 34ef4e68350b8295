//! Adapter for `route-recognizer`.
//!
//! `route-recognizer` is method-agnostic and returns parameters as an owned
//! map, so every matched dispatch pays for building it.

use http::Method;

use super::handler::{self, Handler};
use super::{parse_route, BuildError, Dispatcher, MethodTable, RouterAdapter, UnsupportedReason};
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{Route, RouteTable};

const NAME: &str = "route-recognizer";

/// NFA-based recognizer from the `route-recognizer` crate
pub struct RecognizerAdapter;

struct RecognizerDispatcher {
    routers: MethodTable<route_recognizer::Router<Handler>>,
}

impl RecognizerDispatcher {
    fn new() -> Self {
        Self {
            routers: MethodTable::new(),
        }
    }

    fn register(&mut self, route: &Route, handler: Handler) -> Result<(), BuildError> {
        let pattern = parse_route(NAME, route)?;
        let router = self
            .routers
            .entry(&route.method, route_recognizer::Router::new)
            .ok_or_else(|| BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Method))?;
        router.add(&pattern.to_colon(), handler);
        Ok(())
    }
}

impl Dispatcher for RecognizerDispatcher {
    #[inline]
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        let Some(router) = self.routers.get(req.method) else {
            return Outcome::NotFound;
        };
        match router.recognize(req.path) {
            Ok(m) => {
                let params = m.params();
                handler::invoke(m.handler(), sink, |name| params.find(name));
                Outcome::Handled
            }
            Err(_) => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for RecognizerAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = RecognizerDispatcher::new();
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
        let mut dispatcher = RecognizerDispatcher::new();
        dispatcher.register(&Route::new(method.clone(), path), handler)?;
        Ok(Box::new(dispatcher))
    }
}
