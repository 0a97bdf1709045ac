use super::{LookupKey, Param};

/// Parse one raw parameter token.
///
/// A token can be one of:
///
/// ```text
/// post
/// post(slug)
/// >comment
/// >comment(slug)
/// ```
///
/// Parsing never fails. Syntax checking is the job of
/// [`validate_token`](super::validate_token); this function only splits the
/// token on the first `(`, drops the closing `)` and strips the scope marker.
/// An empty `()` falls back to the primary key.
pub fn parse_token(token: &str) -> Param {
    let (name, lookup_key) = match token.split_once('(') {
        Some((name, key)) => {
            let key = key.strip_suffix(')').unwrap_or(key);
            let key = if key.is_empty() { LookupKey::PrimaryKey } else { LookupKey::Field(key.to_string()) };
            (name, key)
        }
        None => (token, LookupKey::PrimaryKey),
    };

    let (name, scoped) = match name.strip_prefix('>') {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };

    Param { name: name.to_string(), lookup_key, scoped, parent: None, raw: token.to_string() }
}
