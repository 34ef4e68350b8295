//! # Engine Module
//!
//! The two in-crate routing engines.
//!
//! - [`RadixRouter`] - segment radix tree, O(k) in the path length
//! - [`RegexRouter`] - one anchored regex per route, linear scan
//!
//! Both are generic over the stored value, the same shape as the
//! third-party routers (`matchit::Router<T>` and friends), so the harness
//! reaches them only through their adapters and never special-cases them.

mod radix;
mod regex;

pub use self::radix::{ParamVec, RadixRouter, MAX_INLINE_PARAMS};
pub use self::regex::{RegexMatch, RegexRouter};

use std::fmt;

/// Registration failure in an in-crate engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// Same method and pattern registered twice
    Duplicate {
        /// The repeated pattern
        pattern: String,
    },
    /// Pattern the engine cannot compile
    Pattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::Duplicate { pattern } => {
                write!(f, "route '{pattern}' is already registered for this method")
            }
            InsertError::Pattern { pattern, message } => {
                write!(f, "route '{pattern}' cannot be compiled: {message}")
            }
        }
    }
}

impl std::error::Error for InsertError {}
