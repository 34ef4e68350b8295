//! Adapter for the in-crate regex linear-scan router.

use http::Method;

use super::handler::{self, Handler};
use super::{parse_route, BuildError, Dispatcher, RouterAdapter, UnsupportedReason};
use crate::engine::RegexRouter;
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{Route, RouteTable};

const NAME: &str = "regex";

/// One anchored regex per route, tried in order
pub struct RegexAdapter;

struct RegexDispatcher {
    router: RegexRouter<Handler>,
}

impl RegexDispatcher {
    fn register(&mut self, route: &Route, handler: Handler) -> Result<(), BuildError> {
        let pattern = parse_route(NAME, route)?;
        self.router
            .insert(&route.method, &pattern, handler)
            .map_err(|e| {
                BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Rejected(e.to_string()))
            })
    }
}

impl Dispatcher for RegexDispatcher {
    #[inline]
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        match self.router.route(req.method, req.path) {
            Some(m) => {
                handler::invoke(m.value, sink, |name| m.get(name));
                Outcome::Handled
            }
            None => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for RegexAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = RegexDispatcher {
            router: RegexRouter::new(),
        };
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
        let mut dispatcher = RegexDispatcher {
            router: RegexRouter::new(),
        };
        dispatcher.register(&Route::new(method.clone(), path), handler)?;
        Ok(Box::new(dispatcher))
    }
}
