//! Adapter for the in-crate radix tree.

use http::Method;

use super::handler::{self, Handler};
use super::{parse_route, BuildError, Dispatcher, RouterAdapter, UnsupportedReason};
use crate::engine::{ParamVec, RadixRouter};
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{Route, RouteTable};

const NAME: &str = "radix";

/// Segment radix tree keyed by method at each terminal node
pub struct RadixAdapter;

struct RadixDispatcher {
    router: RadixRouter<Handler>,
}

impl RadixDispatcher {
    fn register(&mut self, route: &Route, handler: Handler) -> Result<(), BuildError> {
        let pattern = parse_route(NAME, route)?;
        self.router
            .insert(&route.method, &pattern, handler)
            .map_err(|e| {
                BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Rejected(e.to_string()))
            })
    }
}

impl Dispatcher for RadixDispatcher {
    #[inline]
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        let mut params = ParamVec::new();
        match self.router.route(req.method, req.path, &mut params) {
            Some(h) => {
                // Positional storage: last binding with the name wins.
                handler::invoke(h, sink, |name| {
                    params.iter().rev().find(|(k, _)| *k == name).map(|(_, v)| *v)
                });
                Outcome::Handled
            }
            None => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for RadixAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = RadixDispatcher {
            router: RadixRouter::new(),
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
        let mut dispatcher = RadixDispatcher {
            router: RadixRouter::new(),
        };
        dispatcher.register(&Route::new(method.clone(), path), handler)?;
        Ok(Box::new(dispatcher))
    }
}
