//! Resolution reports.
//!
//! [`ArgumentResolver::resolve`](super::ArgumentResolver::resolve) returns only
//! the argument list. The verbose entry point also reports which bindable
//! slots were left out and why, which is the first thing to look at when a
//! handler receives fewer arguments than it declares.

use std::time::Duration;

use super::handler::ResolvedHandler;
use super::resolver::Argument;

/// Why a bindable slot produced no argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The matched route has no resolved param at this position.
    NoResolvedParam,
    /// The param exists but the loader put nothing in the resource map for it.
    MissingResource { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSlot {
    /// Index of the binding among the handler's non-context parameters.
    pub position: usize,
    pub reason: SkipReason,
}

/// Output of [`ArgumentResolver::resolve_verbose`](super::ArgumentResolver::resolve_verbose).
#[derive(Debug)]
pub struct ResolveReport<'a, C> {
    pub arguments: Vec<Argument<'a, C>>,
    /// `None` for inline handlers.
    pub handler: Option<ResolvedHandler>,
    pub skipped: Vec<SkippedSlot>,
    /// Wall time spent resolving, including the handler lookup.
    pub elapsed: Duration,
}
