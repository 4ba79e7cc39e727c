/// Implements [`Function::caps`](crate::function::Function::caps) from a list
/// of [`FnCaps`](crate::function::FnCaps) flag names.
#[macro_export]
macro_rules! func_caps {
    ( $($cap:ident),+ $(,)? ) => {
        fn caps(&self) -> $crate::function::FnCaps {
            $( $crate::function::FnCaps::$cap )|+
        }
    };
}
