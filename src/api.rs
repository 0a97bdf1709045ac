use serde::{Deserialize, Serialize};

use crate::BindingError;
use crate::params::{Param, build_graph, extract_tokens, validate_token};

bitflags::bitflags! {
    /// Which binding problems are hard errors instead of being tolerated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Strictness: u8 {
        /// A loaded resource whose kind differs from the declared binding fails resolution.
        const KIND             = 1 << 0;
        /// A bound param with no loaded resource fails resolution instead of being skipped.
        const MISSING_RESOURCE = 1 << 1;
    }
}

impl Default for Strictness {
    fn default() -> Self {
        Strictness::KIND
    }
}

/// Options that affect argument resolution.
///
/// Deserializable so hosts can embed it in their own configuration; missing
/// fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub strictness: Strictness,
    /// Upper bound for handler-reference resolution. `None` waits as long as
    /// the surrounding request does.
    pub handler_timeout_ms: Option<u64>,
}

/// Parse the parameters of `pattern` into a linked param graph.
///
/// Tokens are validated first, so unlike [`build_graph`] this rejects
/// malformed placeholders.
///
/// # Example
/// ```
/// use routebind::parse_route;
///
/// let params = parse_route("/posts/:post(slug)/comments/:>comment").unwrap();
/// assert_eq!(params[1].parent.as_deref(), Some("post"));
/// ```
pub fn parse_route(pattern: &str) -> Result<Vec<Param>, BindingError> {
    let tokens = extract_tokens(pattern);
    for token in &tokens {
        validate_token(token)?;
    }
    build_graph(pattern, &tokens)
}
