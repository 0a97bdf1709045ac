//! Per-owner binding tables.
//!
//! The registry is filled once during bootstrap and then frozen:
//!
//! ```text
//! bootstrap:  declare_owner / register / bindings!   (BindingRegistry, locked)
//!                              │
//!                              │ freeze()
//!                              v
//! requests:   Bindings::get(owner, method)           (immutable, lock-free)
//! ```
//!
//! ## Inheritance
//!
//! Owners can extend a parent owner. Until an owner registers a method of its
//! own it reads through to the nearest ancestor that has a table. The first
//! registration on an owner copies that ancestor's table, after which the two
//! evolve independently:
//!
//! ```text
//! Base   { index }                    Base   { index, destroy }
//! Posts  -> reads Base     register   Posts  { index, show }
//!                          ───────>   (later Base registrations do not leak)
//! ```
//!
//! The copy and the append happen under the same write lock, so two owners
//! snapshotting the same ancestor from different threads never observe a
//! half-registered table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{BindingError, ResourceKind};

/// Stable identifier of a handler-owning type (for example a controller).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(Arc<str>);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(name: &str) -> Self {
        OwnerId(Arc::from(name))
    }
}

impl From<String> for OwnerId {
    fn from(name: String) -> Self {
        OwnerId(Arc::from(name))
    }
}

/// One handler parameter eligible for resource substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingDescriptor {
    /// Index among the parameters that follow the invocation context.
    pub position: usize,
    /// Declared kind of the parameter.
    pub kind: ResourceKind,
}

/// Method name -> ordered descriptors.
pub type MethodTable = BTreeMap<String, Vec<BindingDescriptor>>;

#[derive(Debug, Default)]
struct OwnerEntry {
    parent: Option<OwnerId>,
    /// `None` until the owner registers something of its own.
    table: Option<MethodTable>,
}

/// Mutable registry used during bootstrap.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    owners: RwLock<HashMap<OwnerId, OwnerEntry>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` extends `parent`.
    ///
    /// Redeclaring the same edge is a no-op. Unknown owners (on either side)
    /// are created on the fly.
    pub fn declare_owner(&self, owner: impl Into<OwnerId>, parent: Option<OwnerId>) -> Result<(), BindingError> {
        let owner = owner.into();
        let mut owners = self.owners.write();

        if let Some(parent) = &parent {
            if *parent == owner || ancestors(&owners, parent).any(|a| *a == owner) {
                return Err(BindingError::InheritanceCycle { owner: owner.to_string() });
            }
            let existing = owners.get(&owner).and_then(|e| e.parent.as_ref());
            if let Some(existing) = existing.filter(|existing| *existing != parent) {
                return Err(BindingError::ConflictingParent {
                    owner: owner.to_string(),
                    existing: existing.to_string(),
                    requested: parent.to_string(),
                });
            }
            owners.entry(parent.clone()).or_default();
        }

        let entry = owners.entry(owner).or_default();
        if entry.parent.is_none() {
            entry.parent = parent;
        }
        Ok(())
    }

    /// Whether `owner` has been declared or registered, directly or as a parent.
    pub fn contains(&self, owner: &OwnerId) -> bool {
        self.owners.read().contains_key(owner)
    }

    /// Register the bindable parameters of `owner::method`.
    ///
    /// `declared` lists every declared parameter kind in order. The first entry
    /// is the invocation context and is skipped; each remaining entry becomes a
    /// [`BindingDescriptor`]. Calling this twice for the same method appends a
    /// second set of descriptors, so bootstrap code must register each method once.
    pub fn register(&self, owner: impl Into<OwnerId>, method: &str, declared: &[ResourceKind]) {
        let owner = owner.into();
        let mut owners = self.owners.write();

        let needs_snapshot = owners.get(&owner).is_none_or(|e| e.table.is_none());
        if needs_snapshot {
            let inherited = owners
                .get(&owner)
                .and_then(|e| e.parent.as_ref())
                .and_then(|parent| effective_table(&owners, parent))
                .cloned()
                .unwrap_or_default();

            tracing::debug!(owner = %owner, inherited_methods = inherited.len(), "snapshotting binding table");
            owners.entry(owner.clone()).or_default().table = Some(inherited);
        }

        let Some(table) = owners.get_mut(&owner).and_then(|e| e.table.as_mut()) else {
            return;
        };

        let descriptors = table.entry(method.to_string()).or_default();
        let start = descriptors.len();
        descriptors.extend(
            declared
                .iter()
                .skip(1)
                .enumerate()
                .map(|(position, kind)| BindingDescriptor { position, kind: kind.clone() }),
        );

        tracing::debug!(
            owner = %owner,
            method,
            bindings = descriptors.len() - start,
            "registered handler bindings"
        );
    }

    /// Effective table of `owner`: its own, or the nearest ancestor's.
    pub fn table(&self, owner: &OwnerId) -> Option<MethodTable> {
        let owners = self.owners.read();
        effective_table(&owners, owner).cloned()
    }

    pub fn bindings_for(&self, owner: &OwnerId, method: &str) -> Option<Vec<BindingDescriptor>> {
        let owners = self.owners.read();
        effective_table(&owners, owner)?.get(method).cloned()
    }

    /// Materialize every owner's effective table and stop accepting registrations.
    pub fn freeze(self) -> Bindings {
        let owners = self.owners.into_inner();
        let mut shared: HashMap<OwnerId, Arc<MethodTable>> = HashMap::new();

        // Owners with a table of their own first, so inheriting owners can share the Arc.
        for (owner, entry) in &owners {
            if let Some(table) = &entry.table {
                shared.insert(owner.clone(), Arc::new(table.clone()));
            }
        }

        let mut tables = shared.clone();
        for owner in owners.keys().filter(|o| !shared.contains_key(*o)) {
            let inherited = ancestors(&owners, owner).find_map(|a| shared.get(a)).cloned();
            if let Some(table) = inherited {
                tables.insert(owner.clone(), table);
            }
        }

        tracing::debug!(owners = tables.len(), "froze binding registry");
        Bindings { tables }
    }
}

/// Immutable binding tables, built by [`BindingRegistry::freeze`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    tables: HashMap<OwnerId, Arc<MethodTable>>,
}

impl Bindings {
    pub fn get(&self, owner: &OwnerId, method: &str) -> Option<&[BindingDescriptor]> {
        self.tables.get(owner)?.get(method).map(Vec::as_slice)
    }

    pub fn table(&self, owner: &OwnerId) -> Option<&MethodTable> {
        self.tables.get(owner).map(Arc::as_ref)
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.tables.keys()
    }
}

/// Walk the parent chain of `owner`, excluding `owner` itself.
///
/// Bounded by the number of owners so a corrupted chain cannot loop forever.
fn ancestors<'a>(owners: &'a HashMap<OwnerId, OwnerEntry>, owner: &'a OwnerId) -> impl Iterator<Item = &'a OwnerId> {
    let mut current = owners.get(owner).and_then(|e| e.parent.as_ref());
    std::iter::from_fn(move || {
        let next = current?;
        current = owners.get(next).and_then(|e| e.parent.as_ref());
        Some(next)
    })
    .take(owners.len())
}

fn effective_table<'a>(owners: &'a HashMap<OwnerId, OwnerEntry>, owner: &'a OwnerId) -> Option<&'a MethodTable> {
    std::iter::once(owner)
        .chain(ancestors(owners, owner))
        .find_map(|o| owners.get(o).and_then(|e| e.table.as_ref()))
}
