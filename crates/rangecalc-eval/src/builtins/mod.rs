pub mod financial;
pub mod lookup;
pub mod stats;
mod utils;

use once_cell::sync::OnceCell;

static LOADED: OnceCell<()> = OnceCell::new();

/// Register every builtin with the global function registry. Idempotent.
pub fn load_builtins() {
    LOADED.get_or_init(|| {
        lookup::register_builtins();
        stats::register_builtins();
        financial::register_builtins();
    });
}
