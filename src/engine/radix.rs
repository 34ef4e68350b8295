//! Radix tree implementation for HTTP route matching
//!
//! Paths are split into segments and stored in a tree where:
//! - Each node represents a path segment
//! - Static segments (e.g., `users`) match exactly
//! - Parameter segments (e.g., `:id`) match any single segment
//! - A wildcard segment (e.g., `*filepath`) matches the rest of the path
//! - Values are stored at terminal nodes, keyed by HTTP method
//!
//! Lookup tries static children first, then parameter children, then the
//! wildcard, backtracking on failure. Matching is O(k) in the path length
//! for tables without ambiguous parameter positions.
//!
//! Empty segments (`//`, a trailing `/`) never match anything.
//!
//! Lookups do not allocate: parameter names borrow from the tree, values
//! borrow from the request path, and both live in a [`SmallVec`] that stays
//! on the stack for up to [`MAX_INLINE_PARAMS`] bindings.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;

use super::InsertError;
use crate::routes::{PathPattern, Segment};

/// Maximum path parameters kept inline before spilling to the heap
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted parameters: `(name, value)` in path order
pub type ParamVec<'r, 'p> = SmallVec<[(&'r str, &'p str); MAX_INLINE_PARAMS]>;

/// Node in the radix tree
#[derive(Clone)]
struct RadixNode<T> {
    /// The path segment this node represents (without the slash)
    segment: Box<str>,
    /// Parameter name if this node is a `:param` or `*wildcard` node
    param_name: Option<Box<str>>,
    /// Values for routes ending at this node, per HTTP method
    routes: HashMap<Method, T>,
    /// Static children
    children: Vec<RadixNode<T>>,
    /// Parameter children; several are allowed so `/users/:id/posts` and
    /// `/users/:user_id/comments` each keep their own name
    param_children: Vec<RadixNode<T>>,
    /// Catch-all child, always terminal
    wildcard: Option<Box<RadixNode<T>>>,
}

impl<T> RadixNode<T> {
    fn new(segment: &str) -> Self {
        Self {
            segment: Box::from(segment),
            param_name: None,
            routes: HashMap::new(),
            children: Vec::new(),
            param_children: Vec::new(),
            wildcard: None,
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            param_name: Some(Box::from(param_name)),
            ..Self::new("")
        }
    }

    fn store(&mut self, method: &Method, value: T, pattern: &PathPattern) -> Result<(), InsertError> {
        if self.routes.contains_key(method) {
            return Err(InsertError::Duplicate {
                pattern: pattern.to_string(),
            });
        }
        self.routes.insert(method.clone(), value);
        Ok(())
    }

    fn insert(
        &mut self,
        segments: &[Segment],
        method: &Method,
        value: T,
        pattern: &PathPattern,
    ) -> Result<(), InsertError> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.store(method, value, pattern);
        };

        match segment {
            Segment::Static(text) => {
                if let Some(child) = self.children.iter_mut().find(|c| *c.segment == **text) {
                    return child.insert(remaining, method, value, pattern);
                }
                let mut child = RadixNode::new(text);
                child.insert(remaining, method, value, pattern)?;
                self.children.push(child);
                Ok(())
            }
            Segment::Param(name) => {
                if let Some(child) = self
                    .param_children
                    .iter_mut()
                    .find(|c| c.param_name.as_deref() == Some(name.as_str()))
                {
                    return child.insert(remaining, method, value, pattern);
                }
                let mut child = RadixNode::new_param(name);
                child.insert(remaining, method, value, pattern)?;
                self.param_children.push(child);
                Ok(())
            }
            Segment::Wildcard(name) => {
                // Pattern parsing guarantees the wildcard is the last segment.
                if let Some(existing) = self.wildcard.as_mut() {
                    if existing.param_name.as_deref() != Some(name.as_str()) {
                        return Err(InsertError::Pattern {
                            pattern: pattern.to_string(),
                            message: "a wildcard with a different name already exists here".into(),
                        });
                    }
                    return existing.store(method, value, pattern);
                }
                let mut node = RadixNode::new_param(name);
                node.store(method, value, pattern)?;
                self.wildcard = Some(Box::new(node));
                Ok(())
            }
        }
    }

    /// `rest` is the unmatched remainder of the path: empty, or starting
    /// with exactly the `/` that precedes the next segment. An empty segment
    /// (`//`, or a trailing `/`) matches nothing.
    fn search<'r, 'p>(
        &'r self,
        rest: &'p str,
        method: &Method,
        params: &mut ParamVec<'r, 'p>,
    ) -> Option<&'r T> {
        if rest.is_empty() {
            return self.routes.get(method);
        }
        let rest = rest.strip_prefix('/')?;

        let (segment, tail) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        if segment.is_empty() {
            return None;
        }

        for child in &self.children {
            if *child.segment == *segment {
                if let Some(value) = child.search(tail, method, params) {
                    return Some(value);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = child.param_name.as_deref() {
                params.push((name, segment));
                if let Some(value) = child.search(tail, method, params) {
                    return Some(value);
                }
                // Backtrack
                params.pop();
            }
        }

        if let Some(wildcard) = &self.wildcard {
            if let (Some(name), Some(value)) =
                (wildcard.param_name.as_deref(), wildcard.routes.get(method))
            {
                params.push((name, rest));
                return Some(value);
            }
        }

        None
    }
}

/// Radix tree router, generic over the stored value
#[derive(Clone)]
pub struct RadixRouter<T> {
    root: RadixNode<T>,
    len: usize,
}

impl<T> Default for RadixRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RadixRouter<T> {
    /// Empty router
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(""),
            len: 0,
        }
    }

    /// Register `value` for `method` and `pattern`
    ///
    /// # Errors
    ///
    /// [`InsertError::Duplicate`] if the same method and pattern are already
    /// registered; [`InsertError::Pattern`] for a conflicting wildcard name.
    pub fn insert(&mut self, method: &Method, pattern: &PathPattern, value: T) -> Result<(), InsertError> {
        self.root
            .insert(pattern.segments(), method, value, pattern)?;
        self.len += 1;
        Ok(())
    }

    /// Match `method` and `path`, pushing extracted parameters into `params`
    ///
    /// `params` is cleared first so callers can reuse one buffer.
    pub fn route<'r, 'p>(
        &'r self,
        method: &Method,
        path: &'p str,
        params: &mut ParamVec<'r, 'p>,
    ) -> Option<&'r T> {
        params.clear();
        if !path.starts_with('/') {
            return None;
        }
        // The root pattern is the only one whose path ends in a bare slash.
        let path = if path == "/" { "" } else { path };
        self.root.search(path, method, params)
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(Method, &str, &'static str)]) -> RadixRouter<&'static str> {
        let mut router = RadixRouter::new();
        for (method, path, handler) in routes {
            let pattern = PathPattern::parse(path).unwrap();
            router.insert(method, &pattern, *handler).unwrap();
        }
        router
    }

    fn lookup<'r>(
        router: &'r RadixRouter<&'static str>,
        method: Method,
        path: &'r str,
    ) -> Option<(&'static str, Vec<(String, String)>)> {
        let mut params = ParamVec::new();
        let value = *router.route(&method, path, &mut params)?;
        Some((
            value,
            params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ))
    }

    #[test]
    fn test_radix_router_simple_route() {
        let router = router(&[(Method::GET, "/health", "health_check")]);
        let (handler, params) = lookup(&router, Method::GET, "/health").unwrap();
        assert_eq!(handler, "health_check");
        assert!(params.is_empty());
    }

    #[test]
    fn test_radix_router_with_parameter() {
        let router = router(&[(Method::GET, "/users/:id", "get_user")]);
        let (handler, params) = lookup(&router, Method::GET, "/users/123").unwrap();
        assert_eq!(handler, "get_user");
        assert_eq!(params, vec![("id".to_string(), "123".to_string())]);
    }

    #[test]
    fn test_radix_router_multiple_parameters() {
        let router = router(&[(Method::GET, "/users/:user_id/posts/:post_id", "get_post")]);
        let (handler, params) = lookup(&router, Method::GET, "/users/123/posts/456").unwrap();
        assert_eq!(handler, "get_post");
        assert_eq!(params[0], ("user_id".to_string(), "123".to_string()));
        assert_eq!(params[1], ("post_id".to_string(), "456".to_string()));
    }

    #[test]
    fn test_radix_router_method_filtering() {
        let router = router(&[
            (Method::GET, "/items", "get_items"),
            (Method::POST, "/items", "create_item"),
        ]);
        assert_eq!(lookup(&router, Method::GET, "/items").unwrap().0, "get_items");
        assert_eq!(lookup(&router, Method::POST, "/items").unwrap().0, "create_item");
        assert!(lookup(&router, Method::PUT, "/items").is_none());
    }

    #[test]
    fn test_radix_router_no_match() {
        let router = router(&[(Method::GET, "/users/:id", "get_user")]);
        assert!(lookup(&router, Method::GET, "/posts/123").is_none());
        assert!(lookup(&router, Method::POST, "/users/123").is_none());
    }

    #[test]
    fn test_radix_router_static_beats_param() {
        let router = router(&[
            (Method::GET, "/users/:id", "get_user"),
            (Method::GET, "/users/me", "get_me"),
        ]);
        assert_eq!(lookup(&router, Method::GET, "/users/me").unwrap().0, "get_me");
        assert_eq!(lookup(&router, Method::GET, "/users/42").unwrap().0, "get_user");
    }

    #[test]
    fn test_radix_router_different_param_names_same_position() {
        let router = router(&[
            (Method::GET, "/users/:user_id/posts", "get_user_posts"),
            (Method::GET, "/users/:id/comments", "get_user_comments"),
        ]);

        let (handler, params) = lookup(&router, Method::GET, "/users/123/posts").unwrap();
        assert_eq!(handler, "get_user_posts");
        assert_eq!(params, vec![("user_id".to_string(), "123".to_string())]);

        let (handler, params) = lookup(&router, Method::GET, "/users/456/comments").unwrap();
        assert_eq!(handler, "get_user_comments");
        assert_eq!(params, vec![("id".to_string(), "456".to_string())]);
    }

    #[test]
    fn test_radix_router_wildcard_tail() {
        let router = router(&[
            (Method::GET, "/static/*filepath", "serve"),
            (Method::GET, "/static/index", "index"),
        ]);
        let (handler, params) = lookup(&router, Method::GET, "/static/css/site.css").unwrap();
        assert_eq!(handler, "serve");
        assert_eq!(params, vec![("filepath".to_string(), "css/site.css".to_string())]);
        assert_eq!(lookup(&router, Method::GET, "/static/index").unwrap().0, "index");
    }

    #[test]
    fn test_radix_router_rejects_duplicates() {
        let mut router = RadixRouter::new();
        let pattern = PathPattern::parse("/a/:b").unwrap();
        router.insert(&Method::GET, &pattern, 1).unwrap();
        assert!(matches!(
            router.insert(&Method::GET, &pattern, 2),
            Err(InsertError::Duplicate { .. })
        ));
        router.insert(&Method::POST, &pattern, 3).unwrap();
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_radix_router_empty_segments_do_not_match() {
        let router = router(&[
            (Method::GET, "/people", "list"),
            (Method::GET, "/people/:userId", "get"),
            (Method::GET, "/static/*filepath", "serve"),
        ]);
        for path in ["/people/", "//people", "/people//118", "people", "/static/", ""] {
            assert!(lookup(&router, Method::GET, path).is_none(), "{path} matched");
        }
        let (handler, params) = lookup(&router, Method::GET, "/people/118").unwrap();
        assert_eq!(handler, "get");
        assert_eq!(params, vec![("userId".to_string(), "118".to_string())]);
    }

    #[test]
    fn test_radix_router_root() {
        let router = router(&[(Method::GET, "/", "root")]);
        assert_eq!(lookup(&router, Method::GET, "/").unwrap().0, "root");
        assert!(lookup(&router, Method::GET, "/x").is_none());
    }
}
