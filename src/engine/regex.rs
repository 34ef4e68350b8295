//! Regex-based router with a linear scan.
//!
//! Each route pattern is compiled into an anchored regex such as
//! `^/users/([^/]+)$` and routes are tried one by one until a method and
//! regex both match. Matching is O(n) in the number of routes.
//!
//! Routes are kept sorted longest pattern first (stable for equal lengths),
//! so overlapping patterns such as `/pets` and `/pets/:id` resolve to the
//! more specific entry. This makes construction order-sensitive in a way
//! the radix tree is not.

use http::Method;
use regex::{Captures, Regex};

use super::InsertError;
use crate::routes::PathPattern;

struct RegexRoute<T> {
    method: Method,
    source: Box<str>,
    pattern_len: usize,
    regex: Regex,
    param_names: Box<[Box<str>]>,
    value: T,
}

/// Successful match: the stored value and positional captures
pub struct RegexMatch<'r, 'p, T> {
    /// The value registered for the matched route
    pub value: &'r T,
    names: &'r [Box<str>],
    captures: Captures<'p>,
}

impl<'r, 'p, T> RegexMatch<'r, 'p, T> {
    /// Captured value by parameter name (last occurrence wins)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'p str> {
        let index = self.names.iter().rposition(|n| &**n == name)?;
        self.get_index(index)
    }

    /// Captured value by position
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&'p str> {
        self.captures.get(index + 1).map(|m| m.as_str())
    }

    /// Number of parameters of the matched route
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the matched route has no parameters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Router matching requests against per-route regexes
pub struct RegexRouter<T> {
    routes: Vec<RegexRoute<T>>,
}

impl<T> Default for RegexRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RegexRouter<T> {
    /// Empty router
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compile and register `pattern` for `method`
    ///
    /// # Errors
    ///
    /// [`InsertError::Duplicate`] for a repeated method and pattern;
    /// [`InsertError::Pattern`] if the regex does not compile.
    pub fn insert(&mut self, method: &Method, pattern: &PathPattern, value: T) -> Result<(), InsertError> {
        let source = pattern.to_regex();
        if self
            .routes
            .iter()
            .any(|r| r.method == *method && *r.source == *source)
        {
            return Err(InsertError::Duplicate {
                pattern: pattern.to_string(),
            });
        }

        let regex = Regex::new(&source).map_err(|e| InsertError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let param_names = pattern
            .param_names()
            .into_iter()
            .map(Box::<str>::from)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let pattern_len = pattern.to_colon().len();
        // Keep longest-first ordering; equal lengths stay in insertion order.
        let at = self
            .routes
            .iter()
            .position(|r| r.pattern_len < pattern_len)
            .unwrap_or(self.routes.len());
        self.routes.insert(
            at,
            RegexRoute {
                method: method.clone(),
                source: source.into_boxed_str(),
                pattern_len,
                regex,
                param_names,
                value,
            },
        );
        Ok(())
    }

    /// Try every route in order; first method + regex match wins.
    pub fn route<'r, 'p>(&'r self, method: &Method, path: &'p str) -> Option<RegexMatch<'r, 'p, T>> {
        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            if let Some(captures) = route.regex.captures(path) {
                return Some(RegexMatch {
                    value: &route.value,
                    names: &route.param_names,
                    captures,
                });
            }
        }
        None
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(Method, &str, u32)]) -> RegexRouter<u32> {
        let mut router = RegexRouter::new();
        for (method, path, id) in routes {
            router
                .insert(method, &PathPattern::parse(path).unwrap(), *id)
                .unwrap();
        }
        router
    }

    #[test]
    fn test_root_path() {
        let router = router(&[(Method::GET, "/", 1)]);
        let m = router.route(&Method::GET, "/").unwrap();
        assert_eq!(*m.value, 1);
        assert!(m.is_empty());
        assert!(router.route(&Method::GET, "/x").is_none());
    }

    #[test]
    fn test_parameterized_path() {
        let router = router(&[(Method::GET, "/items/:id", 7)]);
        let m = router.route(&Method::GET, "/items/123").unwrap();
        assert_eq!(*m.value, 7);
        assert_eq!(m.get("id"), Some("123"));
        assert_eq!(m.get_index(0), Some("123"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_nested_path() {
        let router = router(&[(Method::GET, "/a/:b/c", 1)]);
        let m = router.route(&Method::GET, "/a/1/c").unwrap();
        assert_eq!(m.get("b"), Some("1"));
        assert!(router.route(&Method::GET, "/a/1/d").is_none());
    }

    #[test]
    fn test_longest_pattern_first() {
        let router = router(&[
            (Method::GET, "/pets", 1),
            (Method::GET, "/pets/:id", 2),
            (Method::GET, "/pets/:id/toys", 3),
        ]);
        assert_eq!(*router.route(&Method::GET, "/pets").unwrap().value, 1);
        assert_eq!(*router.route(&Method::GET, "/pets/9").unwrap().value, 2);
        assert_eq!(*router.route(&Method::GET, "/pets/9/toys").unwrap().value, 3);
        assert!(router.route(&Method::POST, "/pets").is_none());
    }

    #[test]
    fn test_wildcard_capture() {
        let router = router(&[(Method::GET, "/static/*filepath", 1)]);
        let m = router.route(&Method::GET, "/static/css/site.css").unwrap();
        assert_eq!(m.get("filepath"), Some("css/site.css"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut router = RegexRouter::new();
        let pattern = PathPattern::parse("/a/:x").unwrap();
        router.insert(&Method::GET, &pattern, ()).unwrap();
        // Same shape with a different name compiles to the same regex.
        let renamed = PathPattern::parse("/a/:y").unwrap();
        assert!(matches!(
            router.insert(&Method::GET, &renamed, ()),
            Err(InsertError::Duplicate { .. })
        ));
    }
}
