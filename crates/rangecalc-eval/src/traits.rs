//! rangecalc-eval – seams to the external evaluation engine (object-safe)

use std::fmt;

use rangecalc_common::{CellError, CellValue, FunctionResult, SheetId, Zone};

use crate::engine::range_view::{Grid, RangeView};
use crate::engine::scalar_pool::ScalarPool;

/* ───────────────────────────── Accessor ───────────────────────────── */

/// Source of cell values behind a [`RangeView`].
///
/// Implemented by the external engine. `read` is where evaluation is forced and
/// dependency edges get registered, so the view layer calls it only for the
/// coordinates a terminal operation actually needs.
pub trait RangeAccessor {
    /// Values of `zone`, relative to the accessor's own origin, row-major.
    ///
    /// Must return exactly `zone.height()` rows of `zone.width()` values; any
    /// other shape is a programmer error and the view panics.
    fn read(&self, zone: Zone) -> Grid<CellValue>;

    /// Declare `zone` as a dependency without reading it. Called when a cached
    /// search answer stands in for a real traversal.
    fn touch(&self, zone: Zone) {
        let _ = zone;
    }
}

/* ──────────────────────── Evaluation context ─────────────────────── */

/// What the core consumes from the evaluation engine.
pub trait EvaluationContext {
    /// Resolve a bounded zone of `sheet` into a lazy view.
    fn resolve_range(&self, zone: Zone, sheet: SheetId) -> Result<RangeView<'_>, CellError>;
}

/* ─────────────────────────── Arguments ──────────────────────────── */

/// A resolved formula argument.
#[derive(Clone)]
pub enum ArgValue<'a> {
    Scalar(FunctionResult),
    Range(RangeView<'a>),
}

impl<'a> ArgValue<'a> {
    pub fn scalar(v: impl Into<CellValue>) -> Self {
        ArgValue::Scalar(FunctionResult::new(v.into()))
    }

    /// Scalar value of the argument. A 1×1 range collapses to its only cell;
    /// larger ranges are a `#VALUE!` (no implicit intersection here).
    pub fn value(&self) -> Result<CellValue, CellError> {
        match self {
            ArgValue::Scalar(r) => Ok(r.value.clone()),
            ArgValue::Range(v) if v.is_single_element() => Ok(v.get(0, 0)),
            ArgValue::Range(v) => Err(CellError::new_value().with_message(format!(
                "Expected a single value, got a {}x{} range",
                v.width(),
                v.height()
            ))),
        }
    }

    /// The argument as a view; scalars become interned 1×1 views.
    pub fn to_view(&self, pool: &mut ScalarPool) -> RangeView<'a> {
        match self {
            ArgValue::Range(v) => v.clone(),
            ArgValue::Scalar(r) => pool.view(&r.value),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, ArgValue::Range(_))
    }
}

impl fmt::Debug for ArgValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Scalar(r) => f.debug_tuple("Scalar").field(&r.value).finish(),
            ArgValue::Range(v) => f.debug_tuple("Range").field(v).finish(),
        }
    }
}

impl From<CellValue> for ArgValue<'_> {
    fn from(v: CellValue) -> Self {
        ArgValue::Scalar(FunctionResult::new(v))
    }
}

impl<'a> From<RangeView<'a>> for ArgValue<'a> {
    fn from(v: RangeView<'a>) -> Self {
        ArgValue::Range(v)
    }
}

/// What a function produces: a single result or an array (spilled by the engine).
#[derive(Clone)]
pub enum CalcValue<'a> {
    Scalar(FunctionResult),
    Range(RangeView<'a>),
}

impl<'a> CalcValue<'a> {
    pub fn into_result(self) -> Result<FunctionResult, CellError> {
        match self {
            CalcValue::Scalar(r) => Ok(r),
            CalcValue::Range(v) if v.is_single_element() => Ok(FunctionResult::new(v.get(0, 0))),
            CalcValue::Range(_) => Err(CellError::new_value().with_message("Result is an array")),
        }
    }

    /// Materialize into a row-major grid (scalars become 1×1).
    pub fn to_grid(&self) -> Grid<CellValue> {
        match self {
            CalcValue::Scalar(r) => vec![vec![r.value.clone()]],
            CalcValue::Range(v) => v.get_all(),
        }
    }

    pub fn error_kind(&self) -> Option<rangecalc_common::CellErrorKind> {
        match self {
            CalcValue::Scalar(r) => r.value.error_kind(),
            CalcValue::Range(_) => None,
        }
    }
}

impl fmt::Debug for CalcValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcValue::Scalar(r) => f.debug_tuple("Scalar").field(&r.value).finish(),
            CalcValue::Range(v) => f.debug_tuple("Range").field(&v.get_all()).finish(),
        }
    }
}

impl From<CellValue> for CalcValue<'_> {
    fn from(v: CellValue) -> Self {
        CalcValue::Scalar(FunctionResult::new(v))
    }
}

impl From<CellError> for CalcValue<'_> {
    fn from(e: CellError) -> Self {
        CalcValue::Scalar(e.into())
    }
}

impl<'a> From<ArgValue<'a>> for CalcValue<'a> {
    fn from(a: ArgValue<'a>) -> Self {
        match a {
            ArgValue::Scalar(r) => CalcValue::Scalar(r),
            ArgValue::Range(v) => CalcValue::Range(v),
        }
    }
}
