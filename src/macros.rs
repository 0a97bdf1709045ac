#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static pattern compiles"));
        &*RE
    }};
}

/// Declare owners, their parents and their bindable methods in one place.
///
/// Each method lists its declared parameter kinds in order, the invocation
/// context first. The first entry is dropped by [`BindingRegistry::register`].
///
/// ```
/// use routebind::{BindingRegistry, OwnerId, ResourceKind, bindings};
///
/// let registry = BindingRegistry::new();
/// bindings!(registry,
///     BaseController {
///         index(Context),
///     },
///     CommentsController: BaseController {
///         show(Context, Post, Comment),
///     },
/// )
/// .unwrap();
///
/// let owner = OwnerId::from("CommentsController");
/// let show = registry.bindings_for(&owner, "show").unwrap();
/// assert_eq!(show.len(), 2);
/// assert_eq!(show[1].kind, ResourceKind::new("Comment"));
/// ```
///
/// [`BindingRegistry::register`]: crate::BindingRegistry::register
#[macro_export]
macro_rules! bindings {
    (
        $registry:expr,
        $(
            $owner:ident $(: $parent:ident)? {
                $( $method:ident ( $($kind:ident),* $(,)? ) ),* $(,)?
            }
        ),* $(,)?
    ) => {{
        let registry: &$crate::BindingRegistry = &$registry;
        (|| -> ::core::result::Result<(), $crate::BindingError> {
            $(
                $( registry.declare_owner(stringify!($owner), Some($crate::OwnerId::from(stringify!($parent))))?; )?
                $(
                    registry.register(
                        stringify!($owner),
                        stringify!($method),
                        &[ $( $crate::ResourceKind::new(stringify!($kind)) ),* ],
                    );
                )*
            )*
            Ok(())
        })()
    }};
}
