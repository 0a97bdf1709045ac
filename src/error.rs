use thiserror::Error;

use crate::ResourceKind;

/// Errors raised while building parameter graphs, registering bindings or
/// resolving handler arguments.
///
/// Build-time variants (`ScopedFirstParam`, `MalformedToken`, the inheritance
/// errors) are fatal for the route or owner being set up. Request-time variants
/// propagate to the dispatch layer unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A scoped parameter sits at position 0 and has no predecessor to scope against.
    #[error("The first parameter in route \"{pattern}\" cannot be scoped")]
    ScopedFirstParam { pattern: String, param: String },
    /// A raw parameter token does not follow `[>]name[(lookupKey)]`.
    #[error("malformed route parameter \"{token}\": {reason}")]
    MalformedToken { token: String, reason: &'static str },
    /// The handler reference could not be turned into an owner and method.
    #[error("unable to resolve handler \"{reference}\": {reason}")]
    UnresolvedHandler { reference: String, reason: String },
    /// Handler resolution did not finish within the configured timeout.
    #[error("resolving handler \"{reference}\" timed out after {timeout_ms}ms")]
    HandlerResolutionTimedOut { reference: String, timeout_ms: u64 },
    /// Strict mode only: a bound parameter has no entry in the resource map.
    #[error("no resource loaded for parameter \"{name}\" (argument position {position})")]
    MissingResource { name: String, position: usize },
    /// A resource's kind differs from the kind the handler declared.
    #[error("resource \"{name}\" is a {found}, handler expects {expected}")]
    KindMismatch { name: String, expected: ResourceKind, found: ResourceKind },
    /// A loader tried to insert the same parameter twice.
    #[error("resource \"{name}\" already loaded for this request")]
    DuplicateResource { name: String },
    /// An owner was redeclared with a different parent.
    #[error("owner {owner} already extends {existing}, cannot extend {requested}")]
    ConflictingParent { owner: String, existing: String, requested: String },
    /// Declaring the parent would make the owner its own ancestor.
    #[error("owner {owner} would inherit from itself")]
    InheritanceCycle { owner: String },
    /// Raised by `ResourceLoader` implementations.
    #[error("failed to load resource for \"{param}\": {reason}")]
    LoadFailed { param: String, reason: String },
}
