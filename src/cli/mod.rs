//! # CLI Module
//!
//! Command-line front end for the `routerbench` binary.
//!
//! ## Commands
//!
//! ### `run`
//!
//! Build every selected engine for every selected table, report construction
//! footprints, then measure each scenario:
//!
//! ```bash
//! routerbench run --table gplus --engine matchit --engine radix --iterations 50000
//! routerbench run --routes my-api.yaml --duration-ms 200 --format json
//! ```
//!
//! ### `check`
//!
//! Conformance checks only: static requests write nothing, the echo handler
//! writes exactly the bound value, unknown paths are not found, and every
//! route pattern requested literally is routed.
//!
//! ```bash
//! routerbench check
//! ```
//!
//! ### `list`
//!
//! Engines, built-in tables and their scenarios.
//!
//! Exit status is non-zero when an engine fails to build, a scenario fails,
//! or a conformance check fails.

mod commands;


pub use commands::{run_cli, Cli, Commands, OutputFormat, Selection};
