//! Adapter for `path-tree`.
//!
//! `path-tree` is method-agnostic, writes catch-alls as `:name*`, and
//! returns parameters as positional `(name, value)` pairs.

use http::Method;
use path_tree::PathTree;

use super::handler::{self, Handler};
use super::{parse_route, BuildError, Dispatcher, MethodTable, RouterAdapter, UnsupportedReason};
use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{Route, RouteTable};

const NAME: &str = "path-tree";

/// Radix tree from the `path-tree` crate
pub struct PathTreeAdapter;

struct PathTreeDispatcher {
    trees: MethodTable<PathTree<Handler>>,
}

impl PathTreeDispatcher {
    fn new() -> Self {
        Self {
            trees: MethodTable::new(),
        }
    }

    fn register(&mut self, route: &Route, handler: Handler) -> Result<(), BuildError> {
        let pattern = parse_route(NAME, route)?;
        let tree = self
            .trees
            .entry(&route.method, PathTree::new)
            .ok_or_else(|| BuildError::unsupported(NAME, route.clone(), UnsupportedReason::Method))?;
        // path-tree reports nothing on insert; conflicts simply shadow.
        let _id = tree.insert(&pattern.to_path_tree(), handler);
        Ok(())
    }
}

impl Dispatcher for PathTreeDispatcher {
    #[inline]
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome {
        let Some(tree) = self.trees.get(req.method) else {
            return Outcome::NotFound;
        };
        match tree.find(req.path) {
            Some((h, path)) => {
                handler::invoke(h, sink, |name| {
                    path.params()
                        .into_iter()
                        .rev()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| v)
                });
                Outcome::Handled
            }
            None => Outcome::NotFound,
        }
    }
}

impl RouterAdapter for PathTreeAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError> {
        let mut dispatcher = PathTreeDispatcher::new();
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
        let mut dispatcher = PathTreeDispatcher::new();
        dispatcher.register(&Route::new(method.clone(), path), handler)?;
        Ok(Box::new(dispatcher))
    }
}
