use super::{Param, parse_token};
use crate::BindingError;

/// Parse `tokens` in order and link every scoped parameter to its predecessor.
///
/// `route_pattern` is only used for the error message.
///
/// ```text
/// ["post(slug)", ">comment", ">reply"]
///      │             │          └─ parent = "comment"
///      │             └─ parent = "post"
///      └─ unscoped, parent = None
/// ```
///
/// Fails with [`BindingError::ScopedFirstParam`] when the first token is
/// scoped. The result depends on nothing but the input, so callers compute it
/// once per route and reuse it.
pub fn build_graph<S: AsRef<str>>(route_pattern: &str, tokens: &[S]) -> Result<Vec<Param>, BindingError> {
    let mut params: Vec<Param> = tokens.iter().map(|t| parse_token(t.as_ref())).collect();

    if let Some(first) = params.first().filter(|p| p.scoped) {
        return Err(BindingError::ScopedFirstParam { pattern: route_pattern.to_string(), param: first.raw.clone() });
    }

    for index in 1..params.len() {
        if params[index].scoped {
            let parent = params[index - 1].name.clone();
            params[index].parent = Some(parent);
        }
    }

    tracing::debug!(
        route = route_pattern,
        params = params.len(),
        scoped = params.iter().filter(|p| p.scoped).count(),
        "built route parameter graph"
    );

    Ok(params)
}
