//! # Scenario Module
//!
//! Named request patterns applied identically to every engine.
//!
//! An [`ApiExample`] bundles a route table with the concrete requests used
//! to exercise it. From it the catalog derives four whole-table scenarios
//! and one single-route echo scenario:
//!
//! | kind        | name           | requests                                   |
//! |-------------|----------------|--------------------------------------------|
//! | `Static`    | `GPlusStatic`  | `GET /people`                              |
//! | `Param`     | `GPlusParam`   | `GET /people/118051310819094153327`        |
//! | `TwoParams` | `GPlus2Params` | `GET /people/1180.../activities/123456789` |
//! | `All`       | `GPlusAll`     | every route, in table order                |
//!
//! `ParamWrite` (`GPlusParamWrite`) sends the `Param` request to a dispatcher
//! holding only the param pattern, bound to a handler that echoes `userId`.
//!
//! The full sweep requests each route's pattern literally, so
//! `/people/:userId` is dispatched as the path `/people/:userId`, which
//! every engine matches with `userId = ":userId"`.
//!
//! Examples can also be loaded from YAML, JSON or TOML:
//!
//! ```yaml
//! name: GPlus
//! static: { path: /people }
//! param: { pattern: /people/:userId, path: /people/118051310819094153327, name: userId }
//! two_params: { path: /people/118051310819094153327/activities/123456789 }
//! routes:
//!   - { method: GET, path: /people/:userId }
//!   - { method: GET, path: /people }
//! ```

use anyhow::{anyhow, bail, Context};
use http::Method;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::request::RequestDescriptor;
use crate::routes::{self, PathPattern, Route, RouteTable, Segment};

/// Shape of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    /// Zero parameters
    Static,
    /// One bound segment
    Param,
    /// Two bound segments (nested resources)
    TwoParams,
    /// One dispatch per route, in table order
    All,
    /// The one-parameter request against a single echo route
    /// (built with `build_single`, so the handler writes the value)
    ParamWrite,
}

impl ScenarioKind {
    /// Kinds measured against the whole table, in report order
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Static,
        ScenarioKind::Param,
        ScenarioKind::TwoParams,
        ScenarioKind::All,
    ];

    /// Suffix appended to the table name
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            ScenarioKind::Static => "Static",
            ScenarioKind::Param => "Param",
            ScenarioKind::TwoParams => "2Params",
            ScenarioKind::All => "All",
            ScenarioKind::ParamWrite => "ParamWrite",
        }
    }

    /// True when the scenario runs against a single echo route instead of
    /// the whole table
    #[must_use]
    pub fn is_single_route(self) -> bool {
        matches!(self, ScenarioKind::ParamWrite)
    }
}

/// A single concrete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// HTTP method
    pub method: Method,
    /// Concrete path
    pub path: String,
}

impl Probe {
    /// Probe from a method and a path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// The one-parameter request plus what the echo check needs to know about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamProbe {
    /// The request
    pub request: Probe,
    /// Pattern the request matches, registered alone for the echo check
    pub pattern: String,
    /// Parameter to echo
    pub name: String,
    /// Value the engine must extract
    pub value: String,
}

impl ParamProbe {
    /// Build a probe, deriving the expected value from `pattern` and `path`.
    ///
    /// # Errors
    ///
    /// Fails if the pattern is malformed, does not match `path` segment for
    /// segment, or has no parameter `name`.
    pub fn new(method: Method, pattern: &str, path: &str, name: &str) -> anyhow::Result<Self> {
        let parsed = PathPattern::parse(pattern)?;
        if parsed.match_rank(path).is_none() {
            bail!("'{path}' does not match pattern '{pattern}'");
        }
        let value = extract_param(&parsed, path, name)
            .ok_or_else(|| anyhow!("'{path}' does not bind '{name}' under pattern '{pattern}'"))?;
        Ok(Self {
            request: Probe::new(method, path),
            pattern: pattern.to_string(),
            name: name.to_string(),
            value,
        })
    }
}

/// Value bound to `name` when `path` is laid over `pattern`.
/// Callers check that the two match first.
fn extract_param(pattern: &PathPattern, path: &str, name: &str) -> Option<String> {
    let pieces: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in pattern.segments().iter().enumerate() {
        match segment {
            Segment::Param(n) if n == name => return pieces.get(i).map(|s| (*s).to_string()),
            Segment::Wildcard(n) if n == name => return Some(pieces.get(i..)?.join("/")),
            Segment::Static(t) if pieces.get(i) != Some(&t.as_str()) => return None,
            _ => {}
        }
    }
    None
}

/// A route table and the requests used to exercise it
#[derive(Debug, Clone)]
pub struct ApiExample {
    /// Routes, in the order every engine receives them
    pub table: RouteTable,
    /// Static scenario request
    pub static_request: Probe,
    /// One-parameter scenario request
    pub param_request: ParamProbe,
    /// Two-parameter scenario request
    pub two_params_request: Probe,
}

impl ApiExample {
    /// Google+ API subset
    #[must_use]
    pub fn gplus() -> Self {
        Self {
            table: routes::gplus_api(),
            static_request: Probe::new(Method::GET, "/people"),
            param_request: ParamProbe {
                request: Probe::new(Method::GET, "/people/118051310819094153327"),
                pattern: "/people/:userId".to_string(),
                name: "userId".to_string(),
                value: "118051310819094153327".to_string(),
            },
            two_params_request: Probe::new(
                Method::GET,
                "/people/118051310819094153327/activities/123456789",
            ),
        }
    }

    /// File-server table with a wildcard tail
    #[must_use]
    pub fn static_files() -> Self {
        Self {
            table: routes::static_files_api(),
            static_request: Probe::new(Method::GET, "/assets"),
            param_request: ParamProbe {
                request: Probe::new(Method::GET, "/assets/app-3f2a91/manifest"),
                pattern: "/assets/:bundle/manifest".to_string(),
                name: "bundle".to_string(),
                value: "app-3f2a91".to_string(),
            },
            two_params_request: Probe::new(Method::GET, "/users/gordon/files/notes.txt"),
        }
    }

    /// Built-in examples
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![Self::gplus(), Self::static_files()]
    }

    /// Built-in example by table name (case-insensitive)
    #[must_use]
    pub fn find_builtin(name: &str) -> Option<Self> {
        Self::builtin()
            .into_iter()
            .find(|e| e.table.name().eq_ignore_ascii_case(name))
    }

    /// Table name
    #[must_use]
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// Scenario of the given kind
    #[must_use]
    pub fn scenario(&self, kind: ScenarioKind) -> Scenario {
        let mut echo_param = None;
        let requests = match kind {
            ScenarioKind::Static => vec![self.static_request.clone()],
            ScenarioKind::Param => vec![self.param_request.request.clone()],
            ScenarioKind::ParamWrite => {
                echo_param = Some(self.param_request.name.clone());
                vec![self.param_request.request.clone()]
            }
            ScenarioKind::TwoParams => vec![self.two_params_request.clone()],
            ScenarioKind::All => self
                .table
                .iter()
                .map(|r| Probe::new(r.method.clone(), r.path.clone()))
                .collect(),
        };
        Scenario {
            name: format!("{}{}", self.table.name(), kind.suffix()),
            kind,
            requests,
            echo_param,
        }
    }

    /// The four whole-table scenarios, in report order
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        ScenarioKind::ALL.iter().map(|k| self.scenario(*k)).collect()
    }

    /// Load an example from a `.yaml`/`.yml`, `.json` or `.toml` file.
    ///
    /// # Errors
    ///
    /// Unreadable file, unknown extension, parse failure, bad method token,
    /// or a param probe that does not line up with its pattern.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading route table {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let file: ExampleFile = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .with_context(|| format!("parsing YAML route table {}", path.display()))?,
            "json" => serde_json::from_str(&text)
                .with_context(|| format!("parsing JSON route table {}", path.display()))?,
            "toml" => toml::from_str(&text)
                .with_context(|| format!("parsing TOML route table {}", path.display()))?,
            other => bail!(
                "unsupported route table format '{other}' for {} (expected yaml, json or toml)",
                path.display()
            ),
        };
        file.into_example()
            .with_context(|| format!("invalid route table {}", path.display()))
    }
}

#[derive(Debug, Deserialize)]
struct ExampleFile {
    name: String,
    #[serde(rename = "static")]
    static_request: ProbeEntry,
    param: ParamEntry,
    two_params: ProbeEntry,
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct ProbeEntry {
    #[serde(default = "default_method")]
    method: String,
    path: String,
}

#[derive(Debug, Deserialize)]
struct ParamEntry {
    #[serde(default = "default_method")]
    method: String,
    pattern: String,
    path: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    #[serde(default = "default_method")]
    method: String,
    path: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn parse_method(token: &str) -> anyhow::Result<Method> {
    Method::from_bytes(token.as_bytes()).with_context(|| format!("invalid HTTP method '{token}'"))
}

impl ExampleFile {
    fn into_example(self) -> anyhow::Result<ApiExample> {
        let routes = self
            .routes
            .into_iter()
            .map(|r| Ok(Route::new(parse_method(&r.method)?, r.path)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if routes.is_empty() {
            bail!("route table '{}' has no routes", self.name);
        }
        Ok(ApiExample {
            table: RouteTable::new(&self.name, routes),
            static_request: Probe::new(
                parse_method(&self.static_request.method)?,
                self.static_request.path,
            ),
            param_request: ParamProbe::new(
                parse_method(&self.param.method)?,
                &self.param.pattern,
                &self.param.path,
                &self.param.name,
            )?,
            two_params_request: Probe::new(
                parse_method(&self.two_params.method)?,
                self.two_params.path,
            ),
        })
    }
}

/// A named, fixed request sequence
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    kind: ScenarioKind,
    requests: Vec<Probe>,
    echo_param: Option<String>,
}

impl Scenario {
    /// Reported name, e.g. `GPlusParam`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shape of this scenario
    #[must_use]
    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    /// Dispatches per pass
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True when a pass would dispatch nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Parameter every request asks the handler to echo, if any
    #[must_use]
    pub fn echo_param(&self) -> Option<&str> {
        self.echo_param.as_deref()
    }

    /// One pass over the scenario. Call again to restart.
    #[must_use]
    pub fn requests(&self) -> Requests<'_> {
        Requests {
            inner: self.requests.iter(),
            param: self.echo_param.as_deref(),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lazy, finite iterator of fresh request descriptors
pub struct Requests<'a> {
    inner: std::slice::Iter<'a, Probe>,
    param: Option<&'a str>,
}

impl<'a> Iterator for Requests<'a> {
    type Item = RequestDescriptor<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let param = self.param;
        self.inner.next().map(|p| RequestDescriptor {
            method: &p.method,
            path: &p.path,
            param_name: param,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Requests<'_> {}
