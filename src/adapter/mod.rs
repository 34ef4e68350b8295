//! # Adapter Module
//!
//! The uniform contract every routing engine satisfies to be benchmarked.
//!
//! ## Overview
//!
//! Engines have naturally different APIs: some key routes by method, some
//! know nothing about methods; some hand back parameters as a map, some as
//! positional pairs, some as regex captures. An adapter hides all of that
//! behind two traits:
//!
//! - [`RouterAdapter`] builds an immutable [`Dispatcher`] from a whole
//!   [`RouteTable`] (`build_bulk`, or `build_table` with a handler per
//!   route) or from a single route bound to a chosen [`Handler`]
//!   (`build_single`)
//! - [`Dispatcher`] takes a [`RequestDescriptor`] and a [`ResponseSink`]
//!   and does exactly what a server would do with an inbound request
//!
//! All one-time cost (pattern translation, tree building, regex
//! compilation) happens in `build_*`. `dispatch` never sets anything up.
//!
//! ## Handler equivalence
//!
//! Every adapter runs its handler bodies through [`handler::invoke`], so the
//! no-op handler performs zero sink writes and the echo handler performs
//! exactly one write of the extracted value, whatever the engine. Measured
//! differences are routing cost, not handler cost.
//!
//! ## Methods
//!
//! Engines without native method support keep one router per
//! [`MethodSlot`]. The slot table is the only place methods are mapped;
//! anything outside it is rejected at build time with
//! [`UnsupportedReason::Method`].
//!
//! ## Adding an engine
//!
//! Implement [`RouterAdapter`] and [`Dispatcher`] and register the adapter
//! in [`AdapterRegistry::builtin`]. No other integration point exists.

pub mod handler;
mod matchit;
mod path_tree;
mod radix;
mod recognizer;
mod regex;

pub use self::handler::Handler;
pub use self::matchit::MatchitAdapter;
pub use self::path_tree::PathTreeAdapter;
pub use self::radix::RadixAdapter;
pub use self::recognizer::RecognizerAdapter;
pub use self::regex::RegexAdapter;

use http::Method;
use std::fmt;

use crate::request::{Outcome, RequestDescriptor, ResponseSink};
use crate::routes::{PathPattern, Route, RouteTable};

/// Immutable, ready-to-use matching structure built by an adapter
pub trait Dispatcher {
    /// Route `req` and run the bound handler, writing into `sink`.
    fn dispatch(&self, req: &RequestDescriptor<'_>, sink: &mut ResponseSink) -> Outcome;
}

/// Construction side of an engine
pub trait RouterAdapter {
    /// Engine name used in reports and on the command line
    fn name(&self) -> &'static str;

    /// Register every route of `routes`, in table order, with the no-op handler.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsupportedRoute`] naming the first route the engine
    /// cannot represent.
    fn build_bulk(&self, routes: &RouteTable) -> Result<Box<dyn Dispatcher>, BuildError> {
        self.build_table(routes, &|_| Handler::Noop)
    }

    /// Register every route of `routes`, in table order, binding route `i`
    /// to `handler_for(i)`.
    ///
    /// Conformance checks pass [`Handler::Mark`] here to see which entry a
    /// request selected.
    ///
    /// # Errors
    ///
    /// As [`build_bulk`](Self::build_bulk).
    fn build_table(
        &self,
        routes: &RouteTable,
        handler_for: &dyn Fn(usize) -> Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError>;

    /// Register exactly one route bound to `handler`.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsupportedRoute`] if the engine cannot represent it.
    fn build_single(
        &self,
        method: &Method,
        path: &str,
        handler: Handler,
    ) -> Result<Box<dyn Dispatcher>, BuildError>;
}

/// Why an engine refused a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedReason {
    /// Method outside the engine's method table
    Method,
    /// Pattern the harness could not parse
    Pattern(String),
    /// The engine itself rejected the route (conflict, syntax, duplicate)
    Rejected(String),
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedReason::Method => f.write_str("unsupported HTTP method"),
            UnsupportedReason::Pattern(msg) => write!(f, "malformed pattern: {msg}"),
            UnsupportedReason::Rejected(msg) => write!(f, "rejected by engine: {msg}"),
        }
    }
}

/// Construction failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The engine cannot represent `route`
    UnsupportedRoute {
        /// Engine name
        engine: &'static str,
        /// Offending route
        route: Route,
        /// Why
        reason: UnsupportedReason,
    },
    /// The engine panicked while building
    Panicked {
        /// Engine name
        engine: &'static str,
        /// Panic payload, if it was a string
        message: String,
    },
}

impl BuildError {
    /// Shorthand for [`BuildError::UnsupportedRoute`]
    #[must_use]
    pub fn unsupported(engine: &'static str, route: Route, reason: UnsupportedReason) -> Self {
        BuildError::UnsupportedRoute {
            engine,
            route,
            reason,
        }
    }

    /// Engine that failed
    #[must_use]
    pub fn engine(&self) -> &'static str {
        match self {
            BuildError::UnsupportedRoute { engine, .. } | BuildError::Panicked { engine, .. } => {
                engine
            }
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnsupportedRoute {
                engine,
                route,
                reason,
            } => write!(f, "{engine}: cannot register '{route}': {reason}"),
            BuildError::Panicked { engine, message } => {
                write!(f, "{engine}: panicked while building: {message}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Fixed mapping from HTTP method to a per-method router slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodSlot {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

const SLOT_TABLE: [(Method, MethodSlot); MethodSlot::COUNT] = [
    (Method::GET, MethodSlot::Get),
    (Method::POST, MethodSlot::Post),
    (Method::PUT, MethodSlot::Put),
    (Method::PATCH, MethodSlot::Patch),
    (Method::DELETE, MethodSlot::Delete),
    (Method::HEAD, MethodSlot::Head),
    (Method::OPTIONS, MethodSlot::Options),
];

impl MethodSlot {
    /// Number of slots
    pub const COUNT: usize = 7;

    /// Slot for `method`, or `None` if the table has no entry for it
    #[inline]
    #[must_use]
    pub fn of(method: &Method) -> Option<Self> {
        SLOT_TABLE
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, slot)| *slot)
    }

    /// Array index of this slot
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The method this slot stands for
    #[must_use]
    pub fn method(self) -> Method {
        SLOT_TABLE[self.index()].0.clone()
    }
}

/// One engine router per [`MethodSlot`], created lazily
pub(crate) struct MethodTable<R> {
    slots: [Option<R>; MethodSlot::COUNT],
}

impl<R> MethodTable<R> {
    pub(crate) fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Router for `method`, creating it with `init` on first use.
    /// `None` when the method has no slot.
    pub(crate) fn entry(&mut self, method: &Method, init: impl FnOnce() -> R) -> Option<&mut R> {
        let slot = MethodSlot::of(method)?;
        Some(self.slots[slot.index()].get_or_insert_with(init))
    }

    #[inline]
    pub(crate) fn get(&self, method: &Method) -> Option<&R> {
        self.slots[MethodSlot::of(method)?.index()].as_ref()
    }
}

/// Parse `route`'s pattern, mapping failure to [`BuildError`]
pub(crate) fn parse_route(engine: &'static str, route: &Route) -> Result<PathPattern, BuildError> {
    route.pattern().map_err(|e| {
        BuildError::unsupported(engine, route.clone(), UnsupportedReason::Pattern(e.to_string()))
    })
}

/// Duplicate engine name, or a requested engine that is not registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two adapters share a name
    DuplicateName(&'static str),
    /// No adapter with this name
    UnknownEngine {
        /// Requested name
        name: String,
        /// Names that do exist
        available: Vec<&'static str>,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateName(name) => {
                write!(f, "an engine named '{name}' is already registered")
            }
            RegistryError::UnknownEngine { name, available } => write!(
                f,
                "unknown engine '{name}' (available: {})",
                available.join(", ")
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Ordered set of adapters, keyed by engine name
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn RouterAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in engines, in report order
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            adapters: vec![
                Box::new(MatchitAdapter),
                Box::new(PathTreeAdapter),
                Box::new(RadixAdapter),
                Box::new(RecognizerAdapter),
                Box::new(RegexAdapter),
            ],
        }
    }

    /// Add an adapter at the end
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&mut self, adapter: Box<dyn RouterAdapter>) -> Result<(), RegistryError> {
        if self.get(adapter.name()).is_some() {
            return Err(RegistryError::DuplicateName(adapter.name()));
        }
        self.adapters.push(adapter);
        Ok(())
    }

    /// Adapter by engine name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn RouterAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    /// Keep only the named engines, preserving registry order.
    /// An empty list keeps everything.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UnknownEngine`] for the first name not registered.
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, RegistryError> {
        if names.is_empty() {
            return Ok(self);
        }
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(RegistryError::UnknownEngine {
                    name: name.as_ref().to_string(),
                    available: self.names(),
                });
            }
        }
        self.adapters
            .retain(|a| names.iter().any(|n| n.as_ref() == a.name()));
        Ok(self)
    }

    /// Engine names in registry order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Adapters in registry order
    pub fn iter(&self) -> impl Iterator<Item = &dyn RouterAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    /// Number of adapters
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// True when no adapter is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
