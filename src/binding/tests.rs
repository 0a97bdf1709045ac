use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::binding::{
    ArgumentResolver, BindingDescriptor, BindingRegistry, Bindings, HandlerResolver, OwnerId, ResolvedHandler,
    SkipReason, SkippedSlot, StaticHandlerResolver,
};
use crate::{
    BindingError, Handler, HandlerRef, MatchedRoute, Options, Resource, ResourceKind, ResourceMap, Route, Strictness,
};

const CONTEXT: ResourceKind = ResourceKind::new("HttpContext");
const POST: ResourceKind = ResourceKind::new("Post");
const COMMENT: ResourceKind = ResourceKind::new("Comment");

#[derive(Debug, PartialEq)]
struct Ctx {
    request_id: u32,
}

#[derive(Debug, PartialEq)]
struct Post {
    id: u64,
}

#[derive(Debug, PartialEq)]
struct Comment {
    id: u64,
}

fn owner(name: &str) -> OwnerId {
    OwnerId::from(name)
}

// --- Registry ---------------------------------------------------------------

#[test]
fn context_parameter_is_excluded() {
    let registry = BindingRegistry::new();
    registry.register("PostsController", "show", &[CONTEXT, POST]);

    let show = registry.bindings_for(&owner("PostsController"), "show").unwrap();
    assert_eq!(show, vec![BindingDescriptor { position: 0, kind: POST }]);
}

#[test]
fn context_only_method_registers_empty_list() {
    let registry = BindingRegistry::new();
    registry.register("PostsController", "index", &[CONTEXT]);

    assert_eq!(registry.bindings_for(&owner("PostsController"), "index"), Some(vec![]));
}

#[test]
fn duplicate_registration_appends() {
    let registry = BindingRegistry::new();
    registry.register("PostsController", "show", &[CONTEXT, POST]);
    registry.register("PostsController", "show", &[CONTEXT, POST]);

    assert_eq!(registry.bindings_for(&owner("PostsController"), "show").unwrap().len(), 2);
}

#[test]
fn subtype_registration_never_touches_supertype() {
    let registry = BindingRegistry::new();
    registry.register("BaseController", "index", &[CONTEXT]);
    registry.declare_owner("PostsController", Some(owner("BaseController"))).unwrap();

    let base_before = registry.table(&owner("BaseController")).unwrap();
    registry.register("PostsController", "show", &[CONTEXT, POST]);

    assert_eq!(registry.table(&owner("BaseController")).unwrap(), base_before);

    let posts = registry.table(&owner("PostsController")).unwrap();
    assert!(posts.contains_key("index"));
    assert!(posts.contains_key("show"));
}

#[test]
fn supertype_registration_never_leaks_into_diverged_subtype() {
    let registry = BindingRegistry::new();
    registry.declare_owner("PostsController", Some(owner("BaseController"))).unwrap();
    registry.register("BaseController", "index", &[CONTEXT]);
    registry.register("PostsController", "show", &[CONTEXT, POST]);

    let posts_before = registry.table(&owner("PostsController")).unwrap();
    registry.register("BaseController", "destroy", &[CONTEXT, POST]);

    assert_eq!(registry.table(&owner("PostsController")).unwrap(), posts_before);
    assert!(!posts_before.contains_key("destroy"));
    assert!(registry.table(&owner("BaseController")).unwrap().contains_key("destroy"));
}

#[test]
fn undiverged_subtype_reads_through_to_ancestor() {
    let registry = BindingRegistry::new();
    registry.declare_owner("Admin", Some(owner("Posts"))).unwrap();
    registry.declare_owner("Posts", Some(owner("Base"))).unwrap();
    registry.register("Base", "show", &[CONTEXT, POST]);

    assert_eq!(registry.bindings_for(&owner("Admin"), "show").unwrap().len(), 1);

    registry.register("Base", "edit", &[CONTEXT, POST]);
    assert!(registry.table(&owner("Admin")).unwrap().contains_key("edit"));
}

#[test]
fn freeze_materializes_inherited_tables() {
    let registry = BindingRegistry::new();
    registry.declare_owner("Posts", Some(owner("Base"))).unwrap();
    registry.declare_owner("Comments", Some(owner("Base"))).unwrap();
    registry.register("Base", "show", &[CONTEXT, POST]);
    registry.register("Comments", "show", &[CONTEXT, POST, COMMENT]);

    let bindings = registry.freeze();

    assert_eq!(bindings.get(&owner("Posts"), "show").unwrap().len(), 1);
    // Snapshot of Base plus its own appended descriptors.
    assert_eq!(bindings.get(&owner("Comments"), "show").unwrap().len(), 3);
    assert_eq!(bindings.get(&owner("Base"), "show").unwrap().len(), 1);
    assert!(bindings.get(&owner("Unknown"), "show").is_none());
}

#[test]
fn conflicting_parent_is_rejected() {
    let registry = BindingRegistry::new();
    registry.declare_owner("Posts", Some(owner("Base"))).unwrap();
    registry.declare_owner("Posts", Some(owner("Base"))).unwrap();

    let err = registry.declare_owner("Posts", Some(owner("Other"))).unwrap_err();
    assert!(matches!(err, BindingError::ConflictingParent { .. }));
    assert!(!registry.contains(&owner("Other")));
    assert!(registry.contains(&owner("Base")));
}

#[test]
fn inheritance_cycles_are_rejected() {
    let registry = BindingRegistry::new();
    registry.declare_owner("B", Some(owner("A"))).unwrap();
    registry.declare_owner("C", Some(owner("B"))).unwrap();

    assert!(matches!(registry.declare_owner("A", Some(owner("C"))), Err(BindingError::InheritanceCycle { .. })));
    assert!(matches!(registry.declare_owner("A", Some(owner("A"))), Err(BindingError::InheritanceCycle { .. })));
}

#[test]
fn concurrent_subtypes_snapshot_complete_base() {
    let registry = BindingRegistry::new();
    registry.register("Base", "index", &[CONTEXT]);
    registry.register("Base", "show", &[CONTEXT, POST]);

    let subtypes: Vec<String> = (0..8).map(|i| format!("Sub{i}")).collect();
    for sub in &subtypes {
        registry.declare_owner(sub.as_str(), Some(owner("Base"))).unwrap();
    }

    std::thread::scope(|scope| {
        for sub in &subtypes {
            let registry = &registry;
            scope.spawn(move || registry.register(sub.as_str(), "own", &[CONTEXT, COMMENT]));
        }
    });

    for sub in &subtypes {
        let table = registry.table(&owner(sub)).unwrap();
        assert_eq!(table.len(), 3, "{sub} should see index, show and own");
    }
    assert_eq!(registry.table(&owner("Base")).unwrap().len(), 2);
}

#[test]
fn bindings_macro_registers_owners() {
    let registry = BindingRegistry::new();
    bindings!(registry,
        BaseController {
            index(HttpContext),
        },
        CommentsController: BaseController {
            show(HttpContext, Post, Comment),
            store(HttpContext, Post),
        },
    )
    .unwrap();

    let comments = registry.table(&owner("CommentsController")).unwrap();
    assert_eq!(comments.keys().map(String::as_str).collect::<Vec<_>>(), vec!["index", "show", "store"]);
    assert_eq!(
        comments["show"],
        vec![BindingDescriptor { position: 0, kind: POST }, BindingDescriptor { position: 1, kind: COMMENT }]
    );
}

// --- Resolver ---------------------------------------------------------------

fn comments_route(handler: Handler) -> Arc<Route> {
    Arc::new(Route::from_pattern("/posts/:post/comments/:>comment", handler).unwrap())
}

fn matched(route: Arc<Route>, pairs: &[(&str, &str)]) -> MatchedRoute {
    let values: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    MatchedRoute::new(route, &values).unwrap()
}

fn comments_bindings() -> Arc<Bindings> {
    let registry = BindingRegistry::new();
    registry.register("CommentsController", "show", &[CONTEXT, POST, COMMENT]);
    registry.register("CommentsController", "index", &[CONTEXT, POST]);
    Arc::new(registry.freeze())
}

fn resolver() -> ArgumentResolver<StaticHandlerResolver> {
    ArgumentResolver::new(comments_bindings(), StaticHandlerResolver::new().with_owner("CommentsController"))
}

fn show_handler() -> Handler {
    Handler::Reference(HandlerRef::new("CommentsController.show"))
}

fn full_resources() -> ResourceMap {
    let mut resources = ResourceMap::new();
    resources.insert("post", Resource::new(POST, Post { id: 1 })).unwrap();
    resources.insert("comment", Resource::new(COMMENT, Comment { id: 2 })).unwrap();
    resources
}

#[tokio::test]
async fn inline_handler_gets_context_only() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(Handler::Inline), &[("post", "1"), ("comment", "2")]);
    let resources = full_resources();

    let args = resolver().resolve(&ctx, &route, &resources).await.unwrap();

    assert_eq!(args.len(), 1);
    assert_eq!(args[0].as_context(), Some(&ctx));
}

#[tokio::test]
async fn resolves_all_bound_resources_in_order() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1"), ("comment", "2")]);
    let resources = full_resources();

    let args = resolver().resolve(&ctx, &route, &resources).await.unwrap();

    assert_eq!(args.len(), 3);
    assert_eq!(args[0].as_context(), Some(&ctx));
    assert_eq!(args[1].as_resource().and_then(|r| r.downcast_ref::<Post>()), Some(&Post { id: 1 }));
    assert_eq!(args[2].as_resource().and_then(|r| r.downcast_ref::<Comment>()), Some(&Comment { id: 2 }));
    assert!(args[1].as_resource().unwrap().ptr_eq(resources.get("post").unwrap()));
}

#[tokio::test]
async fn method_without_bindings_gets_context_only() {
    let ctx = Ctx { request_id: 1 };
    let handler = Handler::Reference(HandlerRef::new("CommentsController.destroy"));
    let route = matched(comments_route(handler), &[("post", "1"), ("comment", "2")]);
    let resources = full_resources();

    let args = resolver().resolve(&ctx, &route, &resources).await.unwrap();
    assert_eq!(args.len(), 1);
}

#[tokio::test]
async fn missing_resource_is_skipped_without_placeholder() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1"), ("comment", "2")]);
    let mut resources = ResourceMap::new();
    resources.insert("post", Resource::new(POST, Post { id: 1 })).unwrap();

    let report = resolver().resolve_verbose(&ctx, &route, &resources).await.unwrap();

    assert_eq!(report.arguments.len(), 2);
    assert_eq!(report.arguments[1].as_resource().and_then(|r| r.downcast_ref::<Post>()), Some(&Post { id: 1 }));
    assert_eq!(
        report.skipped,
        vec![SkippedSlot { position: 1, reason: SkipReason::MissingResource { name: "comment".into() } }]
    );
    assert_eq!(
        report.handler,
        Some(ResolvedHandler { owner: owner("CommentsController"), method: "show".into() })
    );
}

#[tokio::test]
async fn skipped_slot_does_not_shift_later_positions() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("comment", "2")]);
    let mut resources = ResourceMap::new();
    resources.insert("comment", Resource::new(COMMENT, Comment { id: 2 })).unwrap();

    let report = resolver().resolve_verbose(&ctx, &route, &resources).await.unwrap();

    assert_eq!(report.arguments.len(), 2);
    assert_eq!(report.arguments[1].as_resource().unwrap().kind(), &COMMENT);
    assert_eq!(report.skipped, vec![SkippedSlot { position: 0, reason: SkipReason::NoResolvedParam }]);
}

#[tokio::test]
async fn strict_missing_resource_fails() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1"), ("comment", "2")]);
    let mut resources = ResourceMap::new();
    resources.insert("post", Resource::new(POST, Post { id: 1 })).unwrap();

    let strict = resolver()
        .with_options(Options { strictness: Strictness::KIND | Strictness::MISSING_RESOURCE, ..Options::default() });
    let err = strict.resolve(&ctx, &route, &resources).await.unwrap_err();

    assert_eq!(err, BindingError::MissingResource { name: "comment".into(), position: 1 });
}

#[tokio::test]
async fn kind_mismatch_fails_by_default() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1"), ("comment", "2")]);
    let mut resources = ResourceMap::new();
    resources.insert("post", Resource::new(COMMENT, Comment { id: 9 })).unwrap();

    let err = resolver().resolve(&ctx, &route, &resources).await.unwrap_err();
    assert_eq!(err, BindingError::KindMismatch { name: "post".into(), expected: POST, found: COMMENT });
}

#[tokio::test]
async fn kind_mismatch_tolerated_when_not_strict() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1")]);
    let mut resources = ResourceMap::new();
    resources.insert("post", Resource::new(COMMENT, Comment { id: 9 })).unwrap();

    let lenient = resolver().with_options(Options { strictness: Strictness::empty(), ..Options::default() });
    let args = lenient.resolve(&ctx, &route, &resources).await.unwrap();

    assert_eq!(args.len(), 2);
}

#[tokio::test]
async fn unresolved_handler_propagates() {
    let ctx = Ctx { request_id: 1 };
    let handler = Handler::Reference(HandlerRef::new("GhostController.show"));
    let route = matched(comments_route(handler), &[("post", "1")]);
    let resources = full_resources();

    let err = resolver().resolve(&ctx, &route, &resources).await.unwrap_err();
    assert!(matches!(err, BindingError::UnresolvedHandler { .. }));
}

#[tokio::test]
async fn overridden_inherited_method_binds_by_slot() {
    let registry = BindingRegistry::new();
    registry.declare_owner("CommentsController", Some(owner("BaseController"))).unwrap();
    registry.register("BaseController", "show", &[CONTEXT, POST]);
    registry.register("CommentsController", "show", &[CONTEXT, POST, COMMENT]);
    let bindings = Arc::new(registry.freeze());

    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1"), ("comment", "2")]);
    let resources = full_resources();
    let resolver = ArgumentResolver::new(bindings, StaticHandlerResolver::new().with_owner("CommentsController"));

    let report = resolver.resolve_verbose(&ctx, &route, &resources).await.unwrap();

    assert_eq!(report.arguments.len(), 3);
    assert_eq!(report.arguments[1].as_resource().unwrap().kind(), &POST);
    assert_eq!(report.arguments[2].as_resource().and_then(|r| r.downcast_ref::<Comment>()), Some(&Comment { id: 2 }));
    assert_eq!(report.skipped, vec![SkippedSlot { position: 2, reason: SkipReason::NoResolvedParam }]);
}

struct NeverResolves;

#[async_trait]
impl HandlerResolver for NeverResolves {
    async fn resolve(&self, _reference: &HandlerRef) -> Result<ResolvedHandler, BindingError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn handler_resolution_times_out() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1")]);
    let resolver = ArgumentResolver::new(comments_bindings(), NeverResolves)
        .with_options(Options { handler_timeout_ms: Some(10), ..Options::default() });
    let resources = full_resources();

    let err = resolver.resolve(&ctx, &route, &resources).await.unwrap_err();
    assert_eq!(
        err,
        BindingError::HandlerResolutionTimedOut { reference: "CommentsController.show".into(), timeout_ms: 10 }
    );
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Abandoned {
    dropped: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
}

#[async_trait]
impl HandlerResolver for Abandoned {
    async fn resolve(&self, reference: &HandlerRef) -> Result<ResolvedHandler, BindingError> {
        let _guard = DropFlag(self.dropped.clone());
        std::future::pending::<()>().await;
        self.completed.store(true, Ordering::SeqCst);
        Err(BindingError::UnresolvedHandler { reference: reference.to_string(), reason: "never resolves".into() })
    }
}

#[tokio::test]
async fn dropping_resolve_cancels_handler_resolution() {
    let ctx = Ctx { request_id: 1 };
    let route = matched(comments_route(show_handler()), &[("post", "1")]);
    let resources = full_resources();
    let handlers = Arc::new(Abandoned::default());
    let resolver = ArgumentResolver::new(comments_bindings(), handlers.clone());

    let outcome = tokio::select! {
        result = resolver.resolve(&ctx, &route, &resources) => Some(result),
        _ = tokio::time::sleep(Duration::from_millis(10)) => None,
    };

    assert!(outcome.is_none());
    assert!(handlers.dropped.load(Ordering::SeqCst));
    assert!(!handlers.completed.load(Ordering::SeqCst));
}
