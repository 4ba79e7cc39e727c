//! rangecalc-eval/src/function.rs
// Core `Function` trait and its capability flags.

use rangecalc_common::CellError;

use crate::args::{ArgSchema, validate_args};
use crate::engine::EvaluationPass;
use crate::traits::{ArgValue, CalcValue};

bitflags::bitflags! {
    /// Describes the capabilities and properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u16 {
        /// Same output for the same input, no side effects.
        const PURE          = 0b0000_0001;
        /// Output may change with unchanged inputs.
        const VOLATILE      = 0b0000_0010;
        /// Reduces its inputs to a single value (`RANK`, `PERCENTILE`).
        const REDUCTION     = 0b0000_0100;
        /// Performs a lookup (`MATCH`, `XLOOKUP`); may use the pass search cache.
        const LOOKUP        = 0b0000_1000;
        /// Returns arrays that spill (`SORT`, `UNIQUE`).
        const DYNAMIC_ARRAY = 0b0001_0000;
        /// Operates on numbers only.
        const NUMERIC_ONLY  = 0b0010_0000;
        /// Solves iteratively and is bounded by the solver configuration.
        const ITERATIVE     = 0b0100_0000;
    }
}

/// Object-safe trait for spreadsheet functions.
pub trait Function: Send + Sync + 'static {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn min_args(&self) -> usize {
        0
    }

    fn variadic(&self) -> bool {
        false
    }

    fn volatile(&self) -> bool {
        self.caps().contains(FnCaps::VOLATILE)
    }

    fn arg_schema(&self) -> &'static [ArgSchema] {
        &[]
    }

    /// Evaluate with already-resolved arguments. User-data failures are
    /// returned as `Err` and become error values in [`Function::dispatch`].
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError>;

    /// Check arity and argument shapes, then evaluate. Never fails: errors
    /// come back as error-valued results.
    fn dispatch<'a>(&self, args: &[ArgValue<'a>], pass: &mut EvaluationPass) -> CalcValue<'a> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("function", name = self.name(), argc = args.len()).entered();
        let checked = validate_args(
            self.name(),
            self.arg_schema(),
            self.min_args(),
            self.variadic(),
            args,
        )
        .and_then(|()| self.eval(args, pass));
        match checked {
            Ok(v) => v,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "function returned an error value");
                CalcValue::from(e)
            }
        }
    }
}
