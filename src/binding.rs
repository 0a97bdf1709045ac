//! Handler bindings.
//!
//! Binding is the step between "the loader fetched a `Post` and a `Comment`"
//! and "call `CommentsController::show(ctx, post, comment)`". It has a
//! bootstrap half and a request half:
//!
//! ```text
//! bootstrap                               request
//! ─────────                               ───────
//! bindings! / BindingRegistry::register   MatchedRoute + ResourceMap
//!            │                                        │
//!            │ freeze()                               v
//!            └────────────▶ Bindings ──▶ ArgumentResolver::resolve ──▶ [ctx, post, comment]
//!                                              │
//!                                              └─ HandlerResolver (async)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: per-owner method tables with copy-on-first-write
//!   inheritance, and the frozen [`Bindings`] view.
//! - `handler.rs`: the [`HandlerResolver`] seam and a table-backed
//!   implementation.
//! - `resolver.rs`: argument reconstruction for one request.
//! - `report.rs`: the verbose resolution output.

#[path = "binding/handler.rs"]
mod handler;
#[path = "binding/registry.rs"]
mod registry;
#[path = "binding/report.rs"]
mod report;
#[path = "binding/resolver.rs"]
mod resolver;

#[cfg(test)]
#[path = "binding/tests.rs"]
mod tests;

pub use handler::{HandlerResolver, ResolvedHandler, StaticHandlerResolver};
pub use registry::{BindingDescriptor, BindingRegistry, Bindings, MethodTable, OwnerId};
pub use report::{ResolveReport, SkipReason, SkippedSlot};
pub use resolver::{Argument, ArgumentResolver};
