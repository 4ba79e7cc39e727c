//! Financial functions solved iteratively.

pub mod tvm;

pub fn register_builtins() {
    crate::register_functions!(tvm::RateFn, tvm::IrrFn, tvm::XirrFn);
}
