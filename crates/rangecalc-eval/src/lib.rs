pub mod args;
pub mod coercion;
pub mod function;
pub mod function_registry;
pub mod locale;
pub mod search;
pub mod solver;
pub mod sort;
pub mod traits;

pub mod builtins;

mod macros;
pub mod test_workbook;

pub mod engine;

pub use engine::{EvalConfig, EvaluationPass, RangeView, SolverConfig, TraversalOrder, ZoneAdjuster};
pub use rangecalc_common::{CellError, CellErrorKind, CellValue, SheetId, Zone};


/// Install a `fmt` subscriber filtered by `RUST_LOG`. Returns false when a
/// global subscriber was already set.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .is_ok()
}
