//! Handler argument reconstruction.
//!
//! Runs once per matched request, after the loader has filled the
//! [`ResourceMap`]:
//!
//! ```text
//! Handler::Inline ───────────────────────────────────────────────▶ [ctx]
//! Handler::Reference ─▶ HandlerResolver (await, optional timeout)
//!                           │
//!                           v
//!                Bindings::get(owner, method) ── none ─────────▶ [ctx]
//!                           │
//!                           v
//!         for binding i: resolved_param(i) ─▶ resources[name] ─▶ [ctx, r0, r2, ...]
//!                           └── missing: skip (or fail when strict)
//! ```
//!
//! Skipped slots leave no placeholder, so the result can be shorter than the
//! handler's declared parameter list, but it is never reordered.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::handler::{HandlerResolver, ResolvedHandler};
use super::registry::Bindings;
use super::report::{ResolveReport, SkipReason, SkippedSlot};
use crate::{BindingError, Handler, HandlerRef, MatchedRoute, Options, Resource, ResourceMap, Strictness};

/// One argument for a handler call.
pub enum Argument<'a, C> {
    /// The invocation context; always first.
    Context(&'a C),
    Resource(&'a Resource),
}

impl<'a, C> Argument<'a, C> {
    pub fn as_context(&self) -> Option<&'a C> {
        match *self {
            Argument::Context(ctx) => Some(ctx),
            Argument::Resource(_) => None,
        }
    }

    pub fn as_resource(&self) -> Option<&'a Resource> {
        match *self {
            Argument::Resource(res) => Some(res),
            Argument::Context(_) => None,
        }
    }
}

impl<C> Clone for Argument<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Argument<'_, C> {}

impl<C: fmt::Debug> fmt::Debug for Argument<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Context(ctx) => f.debug_tuple("Context").field(ctx).finish(),
            Argument::Resource(res) => f.debug_tuple("Resource").field(res).finish(),
        }
    }
}

/// Builds handler argument lists from frozen [`Bindings`].
#[derive(Debug)]
pub struct ArgumentResolver<R> {
    bindings: Arc<Bindings>,
    handlers: R,
    options: Options,
}

impl<R: HandlerResolver> ArgumentResolver<R> {
    pub fn new(bindings: Arc<Bindings>, handlers: R) -> Self {
        ArgumentResolver { bindings, handlers, options: Options::default() }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Ordered arguments for the handler of `matched`, context first.
    pub async fn resolve<'a, C>(
        &self,
        context: &'a C,
        matched: &'a MatchedRoute,
        resources: &'a ResourceMap,
    ) -> Result<Vec<Argument<'a, C>>, BindingError> {
        let (arguments, _, _) = self.run(context, matched, resources).await?;
        Ok(arguments)
    }

    /// Like [`ArgumentResolver::resolve`], plus the skipped slots, the resolved handler and timing.
    pub async fn resolve_verbose<'a, C>(
        &self,
        context: &'a C,
        matched: &'a MatchedRoute,
        resources: &'a ResourceMap,
    ) -> Result<ResolveReport<'a, C>, BindingError> {
        let start = Instant::now();
        let (arguments, handler, skipped) = self.run(context, matched, resources).await?;
        Ok(ResolveReport { arguments, handler, skipped, elapsed: start.elapsed() })
    }

    async fn run<'a, C>(
        &self,
        context: &'a C,
        matched: &'a MatchedRoute,
        resources: &'a ResourceMap,
    ) -> Result<(Vec<Argument<'a, C>>, Option<ResolvedHandler>, Vec<SkippedSlot>), BindingError> {
        let mut arguments = vec![Argument::Context(context)];
        let mut skipped = Vec::new();

        let reference = match matched.route().handler() {
            Handler::Inline => return Ok((arguments, None, skipped)),
            Handler::Reference(reference) => reference,
        };

        let handler = self.resolve_handler(reference).await?;

        let Some(descriptors) = self.bindings.get(&handler.owner, &handler.method) else {
            tracing::trace!(owner = %handler.owner, method = %handler.method, "no bindings registered");
            return Ok((arguments, Some(handler), skipped));
        };

        let strictness = self.options.strictness;

        for (position, descriptor) in descriptors.iter().enumerate() {
            let Some(resolved) = matched.resolved_param(position) else {
                tracing::trace!(position, "no resolved param for binding, skipping");
                skipped.push(SkippedSlot { position, reason: SkipReason::NoResolvedParam });
                continue;
            };

            let name = resolved.name();
            let Some(resource) = resources.get(name) else {
                if strictness.contains(Strictness::MISSING_RESOURCE) {
                    return Err(BindingError::MissingResource { name: name.to_string(), position });
                }
                tracing::trace!(position, param = name, "resource not loaded, skipping");
                skipped.push(SkippedSlot { position, reason: SkipReason::MissingResource { name: name.to_string() } });
                continue;
            };

            // A subtype overriding an inherited method appends to the inherited
            // descriptors, so only descriptors that line up with their slot carry a kind.
            if descriptor.position == position && resource.kind() != &descriptor.kind {
                if strictness.contains(Strictness::KIND) {
                    return Err(BindingError::KindMismatch {
                        name: name.to_string(),
                        expected: descriptor.kind.clone(),
                        found: resource.kind().clone(),
                    });
                }
                tracing::warn!(
                    param = name,
                    expected = %descriptor.kind,
                    found = %resource.kind(),
                    "binding kind mismatch tolerated"
                );
            }

            arguments.push(Argument::Resource(resource));
        }

        Ok((arguments, Some(handler), skipped))
    }

    async fn resolve_handler(&self, reference: &HandlerRef) -> Result<ResolvedHandler, BindingError> {
        let pending = self.handlers.resolve(reference);

        match self.options.handler_timeout_ms {
            Some(timeout_ms) => tokio::time::timeout(Duration::from_millis(timeout_ms), pending).await.map_err(|_| {
                BindingError::HandlerResolutionTimedOut { reference: reference.to_string(), timeout_ms }
            })?,
            None => pending.await,
        }
    }
}
