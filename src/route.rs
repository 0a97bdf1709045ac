//! Route-side data consumed by the resolver.
//!
//! A [`Route`] is defined once at build time and caches its parsed
//! [`Param`]s. Each request that matches it gets a [`MatchedRoute`] carrying
//! the raw path values, positionally aligned with those params, and a
//! [`ResourceMap`] filled by a [`ResourceLoader`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;

use crate::params::{Param, build_graph, extract_tokens, validate_token};
use crate::{BindingError, Resource, ResourceMap};

/// Deferred reference to a handler method, e.g. `"PostsController.show"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef(String);

impl HandlerRef {
    pub fn new(reference: impl Into<String>) -> Self {
        HandlerRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Anonymous handler; binding never applies.
    Inline,
    /// Method on an owner type, resolved lazily.
    Reference(HandlerRef),
}

/// A route definition as seen by the binding layer.
#[derive(Debug)]
pub struct Route {
    pattern: String,
    tokens: Vec<String>,
    handler: Handler,
    params: OnceCell<Arc<[Param]>>,
}

impl Route {
    /// Build a route from explicit tokens, bypassing pattern extraction.
    pub fn new(pattern: impl Into<String>, tokens: Vec<String>, handler: Handler) -> Self {
        Route { pattern: pattern.into(), tokens, handler, params: OnceCell::new() }
    }

    /// Extract and validate tokens from `pattern`, then build the param graph eagerly.
    pub fn from_pattern(pattern: impl Into<String>, handler: Handler) -> Result<Self, BindingError> {
        let pattern = pattern.into();
        let tokens = extract_tokens(&pattern);
        for token in &tokens {
            validate_token(token)?;
        }

        let route = Route::new(pattern, tokens, handler);
        route.params()?;
        Ok(route)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Parsed params, computed on first use and cached for the life of the route.
    pub fn params(&self) -> Result<&[Param], BindingError> {
        self.params
            .get_or_try_init(|| build_graph(&self.pattern, &self.tokens).map(Arc::from))
            .map(|params| &params[..])
    }
}

/// A path value bound to its parsed param.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParam {
    pub param: Param,
    pub value: String,
}

impl ResolvedParam {
    pub fn name(&self) -> &str {
        &self.param.name
    }
}

/// Per-request view of a matched route.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    route: Arc<Route>,
    resolved: Vec<Option<ResolvedParam>>,
}

impl MatchedRoute {
    /// Align the raw path `values` produced by the matcher with the route's params.
    ///
    /// Params without a value leave a hole at their position rather than
    /// shifting the ones after them.
    pub fn new(route: Arc<Route>, values: &HashMap<String, String>) -> Result<Self, BindingError> {
        let resolved = route
            .params()?
            .iter()
            .map(|param| values.get(&param.name).map(|value| ResolvedParam { param: param.clone(), value: value.clone() }))
            .collect();
        Ok(MatchedRoute { route, resolved })
    }

    /// Use resolved-parameter metadata computed elsewhere.
    pub fn from_resolved(route: Arc<Route>, resolved: Vec<Option<ResolvedParam>>) -> Self {
        MatchedRoute { route, resolved }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn resolved_param(&self, index: usize) -> Option<&ResolvedParam> {
        self.resolved.get(index).and_then(Option::as_ref)
    }

    pub fn resolved_params(&self) -> &[Option<ResolvedParam>] {
        &self.resolved
    }
}

/// Loads the resource a path value refers to.
///
/// Implementations own the data-store query. `parent` is the resource already
/// loaded for the preceding param when `param.scoped` is set, so the lookup
/// can be restricted to that parent.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Return `Ok(None)` when nothing should be bound for this param.
    async fn load(&self, param: &Param, value: &str, parent: Option<&Resource>) -> Result<Option<Resource>, BindingError>;
}

/// Fill a [`ResourceMap`] for `matched`, walking params in route order.
///
/// A scoped param whose parent was not loaded is left out; loading it without
/// the parent would drop the scoping constraint.
pub async fn load_resources<L>(matched: &MatchedRoute, loader: &L) -> Result<ResourceMap, BindingError>
where
    L: ResourceLoader + ?Sized,
{
    let mut resources = ResourceMap::new();

    for resolved in matched.resolved_params().iter().flatten() {
        let param = &resolved.param;

        let parent = match param.parent.as_deref() {
            Some(parent) if param.scoped => match resources.get(parent) {
                Some(resource) => Some(resource.clone()),
                None => {
                    tracing::debug!(param = %param.name, parent, "parent resource missing, skipping scoped param");
                    continue;
                }
            },
            _ => None,
        };

        if let Some(resource) = loader.load(param, &resolved.value, parent.as_ref()).await? {
            resources.insert(param.name.clone(), resource)?;
        }
    }

    Ok(resources)
}
