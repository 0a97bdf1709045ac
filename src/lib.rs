use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[macro_use]
mod macros;
mod api;
mod binding;
mod error;
mod params;
mod route;

pub use api::{Options, Strictness, parse_route};
pub use binding::{
    Argument, ArgumentResolver, BindingDescriptor, BindingRegistry, Bindings, HandlerResolver, MethodTable, OwnerId,
    ResolveReport, ResolvedHandler, SkipReason, SkippedSlot, StaticHandlerResolver,
};
pub use error::BindingError;
pub use params::{LookupKey, PRIMARY_KEY, Param, build_graph, extract_tokens, parse_token, validate_token};
pub use route::{Handler, HandlerRef, MatchedRoute, ResolvedParam, ResourceLoader, Route, load_resources};

// --- Resources --------------------------------------------------------------

/// Kind tag carried by every [`Resource`] and declared by every binding.
///
/// Kinds are compared by name; `ResourceKind::new("Post")` declared on a
/// handler matches any resource the loader tagged as `"Post"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKind(Cow<'static, str>);

impl ResourceKind {
    pub const fn new(name: &'static str) -> Self {
        ResourceKind(Cow::Borrowed(name))
    }

    pub fn owned(name: impl Into<String>) -> Self {
        ResourceKind(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ResourceKind {
    fn from(name: &'static str) -> Self {
        ResourceKind::new(name)
    }
}

/// A loaded domain object, tagged with its kind.
///
/// The payload is shared, so cloning a `Resource` (or the map holding it) never
/// copies the underlying object.
#[derive(Clone)]
pub struct Resource {
    kind: ResourceKind,
    value: Arc<dyn Any + Send + Sync>,
}

impl Resource {
    pub fn new<T: Any + Send + Sync>(kind: impl Into<ResourceKind>, value: T) -> Self {
        Resource { kind: kind.into(), value: Arc::new(value) }
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Borrow the payload as `T`, or `None` if it was loaded as another type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// True when both handles point at the same loaded object.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("kind", &self.kind).field("value", &"<any>").finish()
    }
}

/// Per-request mapping from parameter name to loaded resource.
///
/// Populated by the loader before argument resolution; the resolver only reads it.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: HashMap<String, Resource>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the resource loaded for `name`. Each parameter is loaded at most once per request.
    pub fn insert(&mut self, name: impl Into<String>, resource: Resource) -> Result<(), BindingError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(BindingError::DuplicateResource { name });
        }
        self.entries.insert(name, resource);
        Ok(())
    }

    /// Like [`ResourceMap::insert`], but also rejects a resource whose kind is not `expected`.
    pub fn insert_checked(
        &mut self,
        name: impl Into<String>,
        expected: &ResourceKind,
        resource: Resource,
    ) -> Result<(), BindingError> {
        let name = name.into();
        if resource.kind() != expected {
            return Err(BindingError::KindMismatch { name, expected: expected.clone(), found: resource.kind().clone() });
        }
        self.insert(name, resource)
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameter names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
