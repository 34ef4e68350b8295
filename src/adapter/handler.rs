//! Handler bodies shared by every adapter.

use crate::request::ResponseSink;

/// What a registered route does when it matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// No observable work
    Noop,
    /// Write the value of parameter `param` to the sink
    Echo {
        /// Name of the parameter to echo
        param: Box<str>,
    },
    /// Report the route's table index to the sink; writes nothing
    Mark {
        /// Position of the route in its table
        index: usize,
    },
}

impl Handler {
    /// Echo handler for `param`
    #[must_use]
    pub fn echo(param: &str) -> Self {
        Handler::Echo {
            param: Box::from(param),
        }
    }
}

/// Run `handler` once.
///
/// `lookup` is the engine's own way of finding a parameter by name. It is
/// only called by the echo handler, and the echo handler writes exactly once
/// (an empty string if the engine found nothing).
#[inline]
pub fn invoke<'a>(
    handler: &Handler,
    sink: &mut ResponseSink,
    lookup: impl FnOnce(&str) -> Option<&'a str>,
) {
    match handler {
        Handler::Noop => {}
        Handler::Echo { param } => sink.write_str(lookup(param.as_ref()).unwrap_or_default()),
        Handler::Mark { index } => sink.mark(*index),
    }
}
