use std::collections::HashMap;

use async_trait::async_trait;

use super::registry::OwnerId;
use crate::{BindingError, HandlerRef};

/// Concrete owner and method behind a [`HandlerRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedHandler {
    pub owner: OwnerId,
    pub method: String,
}

/// Turns deferred handler references into `(owner, method)` pairs.
///
/// Resolution may load code or consult another service, hence async. Errors
/// must be returned as-is; the argument resolver never converts them into a
/// context-only fallback.
#[async_trait]
pub trait HandlerResolver: Send + Sync {
    async fn resolve(&self, reference: &HandlerRef) -> Result<ResolvedHandler, BindingError>;
}

#[async_trait]
impl<T: HandlerResolver + ?Sized> HandlerResolver for std::sync::Arc<T> {
    async fn resolve(&self, reference: &HandlerRef) -> Result<ResolvedHandler, BindingError> {
        (**self).resolve(reference).await
    }
}

/// Resolver backed by a fixed name table.
///
/// References are written `Owner.method`; a bare `Owner` dispatches to
/// [`StaticHandlerResolver::DEFAULT_METHOD`].
#[derive(Debug, Clone, Default)]
pub struct StaticHandlerResolver {
    owners: HashMap<String, OwnerId>,
}

impl StaticHandlerResolver {
    pub const DEFAULT_METHOD: &'static str = "handle";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make `owner` reachable under its own name.
    pub fn with_owner(self, owner: impl Into<OwnerId>) -> Self {
        let owner = owner.into();
        self.with_alias(owner.as_str().to_string(), owner)
    }

    /// Make `owner` reachable under `alias` (for example a module path).
    pub fn with_alias(mut self, alias: impl Into<String>, owner: impl Into<OwnerId>) -> Self {
        self.owners.insert(alias.into(), owner.into());
        self
    }

    fn split(reference: &str) -> (&str, &str) {
        match reference.rsplit_once('.') {
            Some((owner, method)) if !method.is_empty() => (owner, method),
            Some((owner, _)) => (owner, Self::DEFAULT_METHOD),
            None => (reference, Self::DEFAULT_METHOD),
        }
    }
}

#[async_trait]
impl HandlerResolver for StaticHandlerResolver {
    async fn resolve(&self, reference: &HandlerRef) -> Result<ResolvedHandler, BindingError> {
        let (owner, method) = Self::split(reference.as_str());

        let owner = self.owners.get(owner).cloned().ok_or_else(|| BindingError::UnresolvedHandler {
            reference: reference.to_string(),
            reason: format!("unknown owner \"{owner}\""),
        })?;

        Ok(ResolvedHandler { owner, method: method.to_string() })
    }
}
