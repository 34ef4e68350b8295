//! # routerbench
//!
//! **routerbench** measures HTTP request routers against each other on equal
//! terms: the same route table, registered in the same order, driven by the
//! same requests, with handlers that do the same (near-zero) work.
//!
//! ## Overview
//!
//! Two figures are collected per engine:
//!
//! - **Construction footprint**: heap retained after registering a whole
//!   route table, measured by settling the allocator around `build_bulk`
//! - **Dispatch cost**: wall time per routed request, for a handful of
//!   request shapes (static path, one parameter, two parameters, full sweep)
//!
//! ## Architecture
//!
//! - **[`routes`]** - Route tables, path patterns and the built-in example APIs
//! - **[`request`]** - Borrowed request descriptors and the byte-counting response sink
//! - **[`adapter`]** - The `RouterAdapter` / `Dispatcher` contract and one adapter per engine
//! - **[`engine`]** - In-crate engines: a radix tree and a regex linear scan
//! - **[`scenario`]** - Named request sequences derived from each example API
//! - **[`harness`]** - Construction and throughput measurement, conformance checks
//! - **[`memory`]** - Allocator-backed heap accounting
//! - **[`report`]** - Result types and the text / JSON report sinks
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Environment configuration, tracing setup, command line
//!
//! ### Run Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as routerbench run
//!     participant H as Harness
//!     participant A as RouterAdapter
//!     participant D as Dispatcher
//!     participant S as ReportSink
//!
//!     CLI->>H: run(registry, examples, sink)
//!     H->>S: begin(RunInfo)
//!     loop every engine
//!         H->>H: settle + snapshot
//!         H->>A: build_bulk(table)
//!         A-->>H: Box<dyn Dispatcher>
//!         H->>H: settle + snapshot
//!         H->>S: record_footprint
//!     end
//!     loop every scenario, every built engine
//!         H->>D: warm-up passes
//!         H->>D: measured passes
//!         H->>S: record_result
//!     end
//!     H->>S: finish(Report)
//! ```
//!
//! ## Engines
//!
//! | name               | implementation                          |
//! |--------------------|-----------------------------------------|
//! | `matchit`          | `matchit` crate, one router per method  |
//! | `path-tree`        | `path-tree` crate, one tree per method  |
//! | `radix`            | [`engine::RadixRouter`]                 |
//! | `route-recognizer` | `route-recognizer` crate, per method    |
//! | `regex`            | [`engine::RegexRouter`]                 |
//!
//! ## Quick Start
//!
//! ```no_run
//! use routerbench::adapter::AdapterRegistry;
//! use routerbench::config::BenchConfig;
//! use routerbench::harness::Harness;
//! use routerbench::report::TextReport;
//! use routerbench::scenario::ApiExample;
//!
//! let harness = Harness::new(BenchConfig::default());
//! let mut sink = TextReport::new(std::io::stdout());
//! let report = harness
//!     .run(&AdapterRegistry::builtin(), &[ApiExample::gplus()], &mut sink)
//!     .unwrap();
//! assert!(report.is_success());
//! ```
//!
//! ## Memory Figures
//!
//! The `routerbench` binary installs [`memory::CountingAllocator`] as its
//! global allocator, or jemalloc with the `jemalloc` feature. Library users
//! who want footprints must install one of them too; otherwise the harness
//! falls back to RSS, which is too coarse for small tables.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod engine;
pub mod harness;
pub mod logging;
pub mod memory;
pub mod report;
pub mod request;
pub mod routes;
pub mod scenario;

pub use adapter::{AdapterRegistry, Dispatcher, Handler, RouterAdapter};
pub use harness::Harness;
pub use request::{Outcome, RequestDescriptor, ResponseSink};
pub use routes::{Route, RouteTable};
pub use scenario::{ApiExample, Scenario, ScenarioKind};
