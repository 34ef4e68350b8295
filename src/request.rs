//! # Request Module
//!
//! Synthetic requests and the response sink handlers write into.
//!
//! A [`RequestDescriptor`] borrows its method and path from the scenario
//! that produced it, so building a fresh descriptor for every dispatch costs
//! nothing and no engine can benefit from a cached request object.
//!
//! [`ResponseSink`] throws away every byte it is given and only keeps the
//! count. The count exists for the parameter-echo check: a handler that
//! echoes `userId` for `/people/118051310819094153327` must report exactly
//! 21 bytes written.

use http::Method;
use std::fmt;
use std::io;

/// One request to drive through a built dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor<'a> {
    /// HTTP method
    pub method: &'a Method,
    /// Concrete request path
    pub path: &'a str,
    /// Parameter an echo handler should write back (single-route checks only)
    pub param_name: Option<&'a str>,
}

impl<'a> RequestDescriptor<'a> {
    /// Descriptor without an echo parameter
    #[inline]
    #[must_use]
    pub fn new(method: &'a Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            param_name: None,
        }
    }

    /// Descriptor naming the parameter to echo
    #[inline]
    #[must_use]
    pub fn with_param(method: &'a Method, path: &'a str, param_name: &'a str) -> Self {
        Self {
            method,
            path,
            param_name: Some(param_name),
        }
    }
}

impl fmt::Display for RequestDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Owned copy of a descriptor, kept in error reports after the scenario is gone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRequest {
    /// HTTP method
    pub method: Method,
    /// Request path
    pub path: String,
}

impl From<&RequestDescriptor<'_>> for OwnedRequest {
    fn from(req: &RequestDescriptor<'_>) -> Self {
        Self {
            method: req.method.clone(),
            path: req.path.to_string(),
        }
    }
}

impl fmt::Display for OwnedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// What happened to a dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A registered handler ran
    Handled,
    /// No route matched (a real server would answer 404)
    NotFound,
}

/// Response writer that discards everything and counts bytes
///
/// It also remembers the last route index reported through
/// [`mark`](Self::mark), which is how conformance checks see which table
/// entry an engine selected.
#[derive(Debug, Default)]
pub struct ResponseSink {
    written: usize,
    matched: Option<usize>,
}

impl ResponseSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard `s`, counting its length
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.written += s.len();
    }

    /// Bytes written since creation or the last [`reset`](Self::reset)
    #[inline]
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Record that the route at `index` handled the request
    #[inline]
    pub fn mark(&mut self, index: usize) {
        self.matched = Some(index);
    }

    /// Index recorded by the last [`mark`](Self::mark), if any
    #[inline]
    #[must_use]
    pub fn matched(&self) -> Option<usize> {
        self.matched
    }

    /// Zero the counter and forget the marked route
    #[inline]
    pub fn reset(&mut self) {
        self.written = 0;
        self.matched = None;
    }
}

impl io::Write for ResponseSink {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len();
        Ok(buf.len())
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for ResponseSink {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        ResponseSink::write_str(self, s);
        Ok(())
    }
}
