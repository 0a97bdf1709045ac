//! Token extraction from route patterns.
//!
//! Routes are written with `:`-prefixed placeholders, optionally carrying the
//! scope marker and a lookup key:
//!
//! ```text
//! /posts/:post(slug)/comments/:>comment/:>reply?
//!        └───┬────┘           └───┬───┘ └──┬──┘
//!        "post(slug)"       ">comment"   ">reply"   (optional marker dropped)
//! ```
//!
//! The route matcher that consumes these patterns lives outside this crate;
//! only the parameter tokens are of interest here.

use crate::BindingError;

/// Return the raw parameter tokens of `pattern`, in order.
pub fn extract_tokens(pattern: &str) -> Vec<String> {
    regex!(r":([^/]+)")
        .captures_iter(pattern)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('?').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Check `token` against `[>]name[(lookupKey)]`.
///
/// [`parse_token`](super::parse_token) accepts anything; call this first when
/// tokens come from user-written patterns.
pub fn validate_token(token: &str) -> Result<(), BindingError> {
    let malformed = |reason| Err(BindingError::MalformedToken { token: token.to_string(), reason });

    if token.is_empty() {
        return malformed("token is empty");
    }

    let (name, key) = match token.split_once('(') {
        Some((name, key)) => (name, Some(key)),
        None => (token, None),
    };
    let name = name.strip_prefix('>').unwrap_or(name);

    if name.is_empty() {
        return malformed("missing parameter name");
    }
    if !regex!(r"^[A-Za-z_][A-Za-z0-9_]*$").is_match(name) {
        return malformed("parameter name must be an identifier");
    }

    if let Some(key) = key {
        let Some(key) = key.strip_suffix(')') else {
            return malformed("unclosed lookup key");
        };
        if !regex!(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").is_match(key) {
            return malformed("lookup key must be a field name");
        }
    }

    Ok(())
}
