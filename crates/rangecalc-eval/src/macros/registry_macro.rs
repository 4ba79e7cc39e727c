/// Register builtin function values with the global registry.
///
/// ```ignore
/// register_functions!(MatchFn, VLookupFn, XLookupFn);
/// ```
#[macro_export]
macro_rules! register_functions {
    ( $($fn:path),+ $(,)? ) => {{
        use std::sync::Arc;
        $(
            $crate::function_registry::register(Arc::new($fn));
        )+
    }};
}
