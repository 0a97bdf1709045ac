//! Route parameter parsing.
//!
//! This module turns the parameter placeholders of a route pattern into an
//! ordered list of [`Param`] descriptors. It runs once per route definition;
//! nothing here depends on request-time values, so the result is cached on the
//! route and shared by every request that matches it.
//!
//! ## How the parts work together
//!
//! ```text
//! "/posts/:post(slug)/comments/:>comment"
//!        │
//!        │  extract_tokens               (pattern.rs)
//!        v
//! ["post(slug)", ">comment"]
//!        │
//!        │  parse_token (per token)      (token.rs)
//!        │  link scoped params to parent (graph.rs)
//!        v
//! [Param post  key=slug        scoped=false parent=-   ]
//! [Param comment key=$primaryKey scoped=true  parent=post]
//! ```
//!
//! ## Token grammar
//!
//! ```text
//! token     := [">"] name ["(" lookupKey ")"]
//! ```
//!
//! - `>` marks the parameter as *scoped*: its resource is looked up through the
//!   resource resolved for the parameter right before it.
//! - `(lookupKey)` names the field used to find the resource. Without it the
//!   primary identifier is used ([`PRIMARY_KEY`]).
//!
//! ## Invariants
//!
//! - Output order equals pattern order.
//! - The first parameter is never scoped; [`build_graph`] rejects such routes.
//! - `parent` is only ever the immediate predecessor. Deeper chains are written
//!   as consecutive scoped tokens (`:post/:>comment/:>reply`).

use std::fmt;

use serde::{Serialize, Serializer};

#[path = "params/graph.rs"]
mod graph;
#[path = "params/pattern.rs"]
mod pattern;
#[path = "params/token.rs"]
mod token;


pub use graph::build_graph;
pub use pattern::{extract_tokens, validate_token};
pub use token::parse_token;

/// Sentinel lookup key meaning "the resource's primary identifier".
pub const PRIMARY_KEY: &str = "$primaryKey";

/// Field used to identify a resource from the raw path value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// No explicit key; the loader uses the primary identifier.
    PrimaryKey,
    /// Explicit key from a `name(field)` token.
    Field(String),
}

impl LookupKey {
    pub fn as_str(&self) -> &str {
        match self {
            LookupKey::PrimaryKey => PRIMARY_KEY,
            LookupKey::Field(field) => field,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, LookupKey::PrimaryKey)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LookupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One parsed route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Param {
    /// Placeholder name, without the scope marker or lookup key.
    pub name: String,
    pub lookup_key: LookupKey,
    /// Resolved through the resource of the preceding parameter.
    pub scoped: bool,
    /// Name of the preceding parameter; only set when `scoped`.
    pub parent: Option<String>,
    /// Token as written in the route, for diagnostics.
    pub raw: String,
}
