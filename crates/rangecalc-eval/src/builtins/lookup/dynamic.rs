//! Dynamic-array lookup and reshaping: XLOOKUP, SORT, SORTBY, SORTN, UNIQUE,
//! TRANSPOSE.
//!
//! Results are lazy views over the arguments (row selections, transposes),
//! so nothing is copied until the engine spills them.

use once_cell::sync::Lazy;
use rangecalc_common::{CellError, CellValue};
use smallvec::SmallVec;

use super::core::modes;
use super::find;
use crate::args::{self, ArgSchema};
use crate::builtins::utils::{array_result, collapse, key_value, not_found, single_lane};
use crate::engine::EvaluationPass;
use crate::engine::range_view::RangeView;
use crate::function::Function;
use crate::search::Lane;
use crate::sort::{Criteria, SortCriterion, SortOrder, TiesMode, sort_view, top_n, unique_cols, unique_rows};
use crate::traits::{ArgValue, CalcValue};

#[derive(Debug)]
pub struct XLookupFn;

/// XLOOKUP(search_key, lookup_range, result_range, [missing_value],
/// [match_mode=0], [search_mode=1])
///
/// A vertical lookup range answers with the matching row of `result_range`,
/// a horizontal one with the matching column.
impl Function for XLookupFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "XLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            let mut missing = ArgSchema::any();
            missing.required = false;
            missing.shape = crate::args::ShapeKind::Range;
            vec![
                ArgSchema::any(),
                ArgSchema::range(),
                ArgSchema::range(),
                missing,
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.0)),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(1.0)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let key = key_value(&args[0])?;
        let lookup = args::view(args, 1, pass)?;
        let result = args::view(args, 2, pass)?;
        let (mode, strategy) = modes(args, 4, pass)?;
        let lane = single_lane(&lookup).ok_or_else(|| {
            CellError::new_value()
                .with_message("XLOOKUP lookup range must be a single row or a single column")
                .with_argument(1)
        })?;
        let (expected, actual) = match lane {
            Lane::Col(_) => (lookup.height(), result.height()),
            Lane::Row(_) => (lookup.width(), result.width()),
        };
        if expected != actual {
            return Err(CellError::new_value()
                .with_message(format!(
                    "XLOOKUP result range has {actual} entries along the lookup direction, expected {expected}"
                ))
                .with_argument(2));
        }

        match find(&lookup, lane, &key, mode, strategy, pass) {
            Some(i) => {
                let hit = match lane {
                    Lane::Col(_) => result.get_row(i, None),
                    Lane::Row(_) => result.get_col(i, None),
                };
                Ok(collapse(hit))
            }
            None => match args.get(3) {
                Some(ArgValue::Scalar(r)) if r.value.is_empty() => Err(not_found(&key)),
                Some(missing) => Ok(CalcValue::from(missing.clone())),
                None => Err(not_found(&key)),
            },
        }
    }
}

/* ───────────────────────────── SORT family ───────────────────────────── */

fn order_arg(args: &[ArgValue<'_>], i: usize, pass: &EvaluationPass) -> Result<SortOrder, CellError> {
    let code = args::number_or(args, i, 1.0, pass.locale())?;
    SortOrder::from_sign(code).ok_or_else(|| {
        CellError::new_value()
            .with_message(format!("Sort order must be 1 or -1, got {code}"))
            .with_argument(i)
    })
}

fn column_arg(args: &[ArgValue<'_>], i: usize, width: usize, pass: &EvaluationPass) -> Result<usize, CellError> {
    let col = args::integer_or(args, i, 1, pass.locale())?;
    if col < 1 || col as usize > width {
        return Err(CellError::new_value()
            .with_message(format!("Sort column {col} is outside a range of {width} columns"))
            .with_argument(i));
    }
    Ok(col as usize - 1)
}

#[derive(Debug)]
pub struct SortFn;

/// SORT(range, [sort_index=1], [sort_order=1], [by_col=FALSE])
impl Function for SortFn {
    crate::func_caps!(PURE, DYNAMIC_ARRAY);
    fn name(&self) -> &'static str {
        "SORT"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::range(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(1.0)),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(1.0)),
                ArgSchema::logical_scalar().optional(CellValue::Boolean(false)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let range = args::view(args, 0, pass)?;
        let by_col = args::logical_or(args, 3, false)?;
        let rows = if by_col { range.transpose() } else { range };
        let col = column_arg(args, 1, rows.width(), pass)?;
        let order = order_arg(args, 2, pass)?;
        let criteria: Criteria<'a> = SmallVec::from_elem(SortCriterion::column(col, order), 1);
        let sorted = sort_view(&rows, &criteria, pass.locale())?;
        array_result(if by_col { sorted.transpose() } else { sorted })
    }
}

#[derive(Debug)]
pub struct SortByFn;

/// SORTBY(range, by_range1, [order1=1], by_range2, [order2=1], ...)
///
/// Key ranges that are rows as wide as `range` sort its columns instead of
/// its rows.
impl Function for SortByFn {
    crate::func_caps!(PURE, DYNAMIC_ARRAY);
    fn name(&self) -> &'static str {
        "SORTBY"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn variadic(&self) -> bool {
        true
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            let mut trailing = ArgSchema::any();
            trailing.shape = crate::args::ShapeKind::Range;
            vec![ArgSchema::range(), ArgSchema::range(), trailing]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let range = args::view(args, 0, pass)?;
        let first = args::view(args, 1, pass)?;
        let by_col = first.height() == 1 && first.width() == range.width() && range.height() != 1;
        let rows = if by_col { range.transpose() } else { range };

        let mut criteria: Criteria<'a> = SmallVec::new();
        let mut i = 1;
        while i < args.len() {
            let by = args::view(args, i, pass)?;
            let by = if by_col { by.transpose() } else { by };
            let order = order_arg(args, i + 1, pass)?;
            criteria.push(SortCriterion::values(by, order));
            i += 2;
        }
        let sorted = sort_view(&rows, &criteria, pass.locale())?;
        array_result(if by_col { sorted.transpose() } else { sorted })
    }
}

#[derive(Debug)]
pub struct SortNFn;

/// SORTN(range, [n=1], [display_ties_mode=0], [sort_column1, is_ascending1], ...)
///
/// Ties modes: 0 first n rows, 1 first n rows plus rows tied with the last,
/// 2 first n distinct rows, 3 every row of the first n distinct rows.
/// Without sort columns the first column is sorted ascending.
impl Function for SortNFn {
    crate::func_caps!(PURE, DYNAMIC_ARRAY);
    fn name(&self) -> &'static str {
        "SORTN"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn variadic(&self) -> bool {
        true
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::range(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(1.0)),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.0)),
                ArgSchema::any(),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let range = args::view(args, 0, pass)?;
        let locale = *pass.locale();
        let n = args::integer_or(args, 1, 1, &locale)?;
        if n < 0 {
            return Err(CellError::new_value()
                .with_message(format!("SORTN count must be positive, got {n}"))
                .with_argument(1));
        }
        let code = args::number_or(args, 2, 0.0, &locale)?;
        let ties = TiesMode::from_code(code).ok_or_else(|| {
            CellError::new_value()
                .with_message(format!("{code} is not a valid ties mode"))
                .with_argument(2)
        })?;

        let mut criteria: Criteria<'a> = SmallVec::new();
        let mut i = 3;
        while i < args.len() {
            let col = column_arg(args, i, range.width(), pass)?;
            let ascending = args::logical_or(args, i + 1, true)?;
            let order = if ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            criteria.push(SortCriterion::column(col, order));
            i += 2;
        }
        array_result(top_n(&range, &criteria, n as usize, ties, &locale)?)
    }
}

#[derive(Debug)]
pub struct UniqueFn;

/// UNIQUE(range, [by_column=FALSE], [exactly_once=FALSE])
impl Function for UniqueFn {
    crate::func_caps!(PURE, DYNAMIC_ARRAY);
    fn name(&self) -> &'static str {
        "UNIQUE"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::range(),
                ArgSchema::logical_scalar().optional(CellValue::Boolean(false)),
                ArgSchema::logical_scalar().optional(CellValue::Boolean(false)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let range = args::view(args, 0, pass)?;
        let by_col = args::logical_or(args, 1, false)?;
        let exactly_once = args::logical_or(args, 2, false)?;
        let out = if by_col {
            unique_cols(&range, exactly_once)
        } else {
            unique_rows(&range, exactly_once)
        };
        array_result(out)
    }
}

#[derive(Debug)]
pub struct TransposeFn;

/// TRANSPOSE(range)
impl Function for TransposeFn {
    crate::func_caps!(PURE, DYNAMIC_ARRAY);
    fn name(&self) -> &'static str {
        "TRANSPOSE"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &crate::builtins::utils::ARG_RANGE_ONE[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let range: RangeView<'a> = args::view(args, 0, pass)?;
        array_result(range.transpose())
    }
}
