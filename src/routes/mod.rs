//! # Routes Module
//!
//! The route table model shared by every engine under comparison.
//!
//! A [`RouteTable`] is a named, ordered, immutable sequence of [`Route`]s.
//! Every adapter receives the same table in the same order, so any
//! difference in results is attributable to the engine, not the harness.
//!
//! Patterns are written in colon syntax:
//!
//! - `/people` - static
//! - `/people/:userId` - one named parameter
//! - `/static/*filepath` - wildcard tail capturing the remainder
//!
//! The model does not reject anything an engine might still accept.
//! [`RouteTable::validate`] is advisory; hard failures come from the
//! adapters at build time.

mod pattern;
mod tables;

pub use pattern::{PathPattern, PatternError, Segment};
pub use tables::{gplus_api, static_files_api};

use http::Method;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// One (method, path pattern) pair an engine must be able to match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Path pattern in colon syntax
    pub path: String,
}

impl Route {
    /// Create a route from a method and a colon-syntax pattern
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Parse this route's pattern
    pub fn pattern(&self) -> Result<PathPattern, PatternError> {
        PathPattern::parse(&self.path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Advisory finding from [`RouteTable::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    /// Same (method, path) registered more than once
    Duplicate {
        /// Position of the repeated entry
        index: usize,
        /// The repeated route
        route: Route,
    },
    /// Pattern that does not parse
    Malformed {
        /// Position of the entry
        index: usize,
        /// Why it does not parse
        error: PatternError,
    },
}

impl fmt::Display for TableIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableIssue::Duplicate { index, route } => {
                write!(f, "route #{index} ({route}) is a duplicate")
            }
            TableIssue::Malformed { index, error } => write!(f, "route #{index}: {error}"),
        }
    }
}

/// Named, ordered, read-only sequence of routes
///
/// Cloning is cheap (`Arc`) and never reorders.
#[derive(Debug, Clone)]
pub struct RouteTable {
    name: Arc<str>,
    routes: Arc<[Route]>,
}

impl RouteTable {
    /// Create a table; order is preserved exactly as given.
    pub fn new(name: &str, routes: Vec<Route>) -> Self {
        Self {
            name: Arc::from(name),
            routes: Arc::from(routes),
        }
    }

    /// Build a table from `(method, path)` string pairs.
    ///
    /// Only the method token is checked here; patterns are left for the
    /// adapters to accept or reject.
    pub fn from_pairs(
        name: &str,
        pairs: &[(&str, &str)],
    ) -> Result<Self, http::method::InvalidMethod> {
        let routes = pairs
            .iter()
            .map(|(method, path)| Ok(Route::new(Method::from_bytes(method.as_bytes())?, *path)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, routes))
    }

    /// Table name, used as the scenario prefix (`GPlus` -> `GPlusStatic`)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when the table has no routes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route at `index` in table order
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Routes in table order
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Routes as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[Route] {
        &self.routes
    }

    /// Index of the route a correct router selects for `method` and `path`.
    ///
    /// Reference lookup by linear scan: among routes whose method matches
    /// and whose pattern matches the path, the most specific one wins
    /// ([`PathPattern::match_rank`]); on a tie, the earliest. Routes with
    /// malformed patterns are skipped. Not meant for measurement.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<usize> {
        let mut best: Option<(usize, Vec<u8>)> = None;
        for (index, route) in self.routes.iter().enumerate() {
            if route.method != *method {
                continue;
            }
            let Some(rank) = route.pattern().ok().and_then(|p| p.match_rank(path)) else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, b)| rank > *b) {
                best = Some((index, rank));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Advisory checks: duplicates and unparsable patterns.
    ///
    /// An empty result does not promise every engine will accept the table.
    #[must_use]
    pub fn validate(&self) -> Vec<TableIssue> {
        let mut seen = HashSet::with_capacity(self.routes.len());
        let mut issues = Vec::new();
        for (index, route) in self.routes.iter().enumerate() {
            if let Err(error) = route.pattern() {
                issues.push(TableIssue::Malformed { index, error });
            }
            if !seen.insert((&route.method, route.path.as_str())) {
                issues.push(TableIssue::Duplicate {
                    index,
                    route: route.clone(),
                });
            }
        }
        issues
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
