//! Classic lookups: MATCH, XMATCH, VLOOKUP, HLOOKUP, LOOKUP.
//!
//! - MATCH match_type: 0 exact (wildcards for text keys), 1 largest value
//!   <= key over ascending data, -1 smallest value >= key over descending data.
//! - VLOOKUP/HLOOKUP search the first column/row of the table; `is_sorted`
//!   (default TRUE) selects the approximate dichotomic search.
//! - Error keys propagate. Cells that are never probed are never read, so an
//!   error elsewhere in the table does not matter.

use once_cell::sync::Lazy;
use rangecalc_common::{CellError, CellValue};

use super::{Strategy, find, find_by_match_type, invalid_code, search_mode_from_code};
use crate::args::{self, ArgSchema};
use crate::builtins::utils::{key_value, not_found, single_lane};
use crate::engine::EvaluationPass;
use crate::function::Function;
use crate::search::{Lane, SearchMode};
use crate::sort::SortOrder;
use crate::traits::{ArgValue, CalcValue};

#[derive(Debug)]
pub struct MatchFn;

/// MATCH(search_key, range, [match_type=1]) → 1-based position.
impl Function for MatchFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "MATCH"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::any(),
                ArgSchema::range(),
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
        let range = args::view(args, 1, pass)?;
        let match_type = args::number_or(args, 2, 1.0, pass.locale())?;
        let lane = single_lane(&range).ok_or_else(|| {
            CellError::new_na()
                .with_message("MATCH range must be a single row or a single column")
                .with_argument(1)
        })?;
        find_by_match_type(&range, lane, &key, match_type, pass)
            .map(|i| CalcValue::from(CellValue::Number((i + 1) as f64)))
            .ok_or_else(|| not_found(&key))
    }
}

#[derive(Debug)]
pub struct XMatchFn;

/// XMATCH(search_key, range, [match_mode=0], [search_mode=1]) → 1-based position.
impl Function for XMatchFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "XMATCH"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::any(),
                ArgSchema::range(),
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
        let range = args::view(args, 1, pass)?;
        let (mode, strategy) = modes(args, 2, pass)?;
        let lane = single_lane(&range).ok_or_else(|| {
            CellError::new_value()
                .with_message("XMATCH range must be a single row or a single column")
                .with_argument(1)
        })?;
        find(&range, lane, &key, mode, strategy, pass)
            .map(|i| CalcValue::from(CellValue::Number((i + 1) as f64)))
            .ok_or_else(|| not_found(&key))
    }
}

/// `match_mode` and `search_mode` at `args[at]` and `args[at + 1]`.
pub(crate) fn modes(
    args: &[ArgValue<'_>],
    at: usize,
    pass: &EvaluationPass,
) -> Result<(SearchMode, Strategy), CellError> {
    let locale = pass.locale();
    let match_code = args::integer_or(args, at, 0, locale)?;
    let search_code = args::integer_or(args, at + 1, 1, locale)?;
    let mode = search_mode_from_code(match_code)
        .ok_or_else(|| invalid_code("match mode", match_code).with_argument(at))?;
    let strategy = Strategy::from_search_mode(search_code)
        .ok_or_else(|| invalid_code("search mode", search_code).with_argument(at + 1))?;
    Ok((mode, strategy))
}

/// Shared body of VLOOKUP and HLOOKUP: `lane_of` picks the searched lane,
/// `pick` reads the answer at (found index, 0-based offset).
fn table_lookup<'a>(
    args: &[ArgValue<'a>],
    pass: &mut EvaluationPass,
    vertical: bool,
) -> Result<CalcValue<'a>, CellError> {
    let key = key_value(&args[0])?;
    let table = args::view(args, 1, pass)?;
    let index = args::integer_or(args, 2, 0, pass.locale())?;
    let sorted = args::logical_or(args, 3, true)?;
    let extent = if vertical { table.width() } else { table.height() };
    if index < 1 {
        return Err(CellError::new_value()
            .with_message(format!("Index {index} must be at least 1"))
            .with_argument(2));
    }
    if index as usize > extent {
        return Err(CellError::new_ref()
            .with_message(format!("Index {index} is out of a range of size {extent}"))
            .with_argument(2));
    }
    let lane = if vertical { Lane::Col(0) } else { Lane::Row(0) };
    let found = if sorted {
        find(&table, lane, &key, SearchMode::NextSmaller, Strategy::Dichotomic(SortOrder::Ascending), pass)
    } else {
        find_by_match_type(&table, lane, &key, 0.0, pass)
    };
    let at = found.ok_or_else(|| not_found(&key))?;
    let offset = index as usize - 1;
    let value = if vertical {
        table.get(offset, at)
    } else {
        table.get(at, offset)
    };
    Ok(CalcValue::from(value))
}

fn table_schema() -> Vec<ArgSchema> {
    vec![
        ArgSchema::any(),
        ArgSchema::range(),
        ArgSchema::number_lenient_scalar(),
        ArgSchema::logical_scalar().optional(CellValue::Boolean(true)),
    ]
}

#[derive(Debug)]
pub struct VLookupFn;

/// VLOOKUP(search_key, range, index, [is_sorted=TRUE])
impl Function for VLookupFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "VLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(table_schema);
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        table_lookup(args, pass, true)
    }
}

#[derive(Debug)]
pub struct HLookupFn;

/// HLOOKUP(search_key, range, index, [is_sorted=TRUE])
impl Function for HLookupFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "HLOOKUP"
    }
    fn min_args(&self) -> usize {
        3
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(table_schema);
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        table_lookup(args, pass, false)
    }
}

#[derive(Debug)]
pub struct LookupFn;

/// LOOKUP(search_key, search_range, [result_range])
///
/// Approximate match over ascending data. Without a result range, a wide
/// search range is searched along its first row and answers from its last
/// row; otherwise along its first column, answering from the last column.
impl Function for LookupFn {
    crate::func_caps!(PURE, LOOKUP);
    fn name(&self) -> &'static str {
        "LOOKUP"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            let mut result = ArgSchema::range();
            result.required = false;
            vec![ArgSchema::any(), ArgSchema::range(), result]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let key = key_value(&args[0])?;
        let search = args::view(args, 1, pass)?;
        let strategy = Strategy::Dichotomic(SortOrder::Ascending);

        if args.len() < 3 {
            let wide = search.width() > search.height();
            let lane = if wide { Lane::Row(0) } else { Lane::Col(0) };
            let at = find(&search, lane, &key, SearchMode::NextSmaller, strategy, pass)
                .ok_or_else(|| not_found(&key))?;
            let value = if wide {
                search.get(at, search.height() - 1)
            } else {
                search.get(search.width() - 1, at)
            };
            return Ok(CalcValue::from(value));
        }

        let result = args::view(args, 2, pass)?;
        let lane = single_lane(&search).ok_or_else(|| {
            CellError::new_na()
                .with_message("LOOKUP search range must be a single row or column when a result range is given")
                .with_argument(1)
        })?;
        let result_lane = single_lane(&result).ok_or_else(|| {
            CellError::new_na()
                .with_message("LOOKUP result range must be a single row or column")
                .with_argument(2)
        })?;
        let at = find(&search, lane, &key, SearchMode::NextSmaller, strategy, pass)
            .ok_or_else(|| not_found(&key))?;
        if at >= result_lane.len(&result) {
            return Err(CellError::new_ref()
                .with_message("LOOKUP result range is shorter than the search range")
                .with_argument(2));
        }
        Ok(CalcValue::from(result_lane.value_at(&result, at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::range_view::RangeView;
    use rangecalc_common::CellErrorKind;

    fn n(x: f64) -> CellValue {
        CellValue::Number(x)
    }

    fn t(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn scalar(v: CalcValue<'_>) -> CellValue {
        match v {
            CalcValue::Scalar(r) => r.value,
            CalcValue::Range(v) => panic!("expected a scalar, got {:?}", v.get_all()),
        }
    }

    fn call<'a>(f: &dyn Function, args: &[ArgValue<'a>]) -> CellValue {
        let mut pass = EvaluationPass::default();
        pass.begin();
        scalar(f.dispatch(args, &mut pass))
    }

    fn column(xs: Vec<CellValue>) -> ArgValue<'static> {
        ArgValue::Range(RangeView::from_column(xs))
    }

    #[test]
    fn match_types() {
        let data = || column(vec![n(10.0), n(20.0), n(30.0), n(40.0)]);
        assert_eq!(call(&MatchFn, &[ArgValue::scalar(25.0), data()]), n(2.0));
        assert_eq!(call(&MatchFn, &[ArgValue::scalar(30.0), data(), ArgValue::scalar(0.0)]), n(3.0));
        assert_eq!(
            call(&MatchFn, &[ArgValue::scalar(25.0), data(), ArgValue::scalar(0.0)]).error_kind(),
            Some(CellErrorKind::Na)
        );
        let desc = column(vec![n(40.0), n(30.0), n(20.0), n(10.0)]);
        assert_eq!(call(&MatchFn, &[ArgValue::scalar(25.0), desc, ArgValue::scalar(-1.0)]), n(2.0));
        assert_eq!(call(&MatchFn, &[ArgValue::scalar(5.0), data()]).error_kind(), Some(CellErrorKind::Na));
    }

    #[test]
    fn match_exact_understands_wildcards() {
        let names = column(vec![t("apple"), t("banana"), t("cherry")]);
        assert_eq!(call(&MatchFn, &[ArgValue::scalar("b*"), names, ArgValue::scalar(0.0)]), n(2.0));
    }

    #[test]
    fn match_rejects_two_dimensional_ranges() {
        let grid = ArgValue::Range(RangeView::constant(n(1.0), 2, 2));
        assert_eq!(call(&MatchFn, &[ArgValue::scalar(1.0), grid]).error_kind(), Some(CellErrorKind::Na));
    }

    #[test]
    fn xmatch_modes() {
        let data = || column(vec![n(10.0), n(20.0), n(20.0), n(40.0)]);
        assert_eq!(call(&XMatchFn, &[ArgValue::scalar(20.0), data()]), n(2.0));
        assert_eq!(
            call(&XMatchFn, &[ArgValue::scalar(20.0), data(), ArgValue::scalar(0.0), ArgValue::scalar(-1.0)]),
            n(3.0)
        );
        assert_eq!(call(&XMatchFn, &[ArgValue::scalar(35.0), data(), ArgValue::scalar(1.0)]), n(4.0));
        assert_eq!(call(&XMatchFn, &[ArgValue::scalar(35.0), data(), ArgValue::scalar(-1.0)]), n(2.0));
        assert_eq!(
            call(&XMatchFn, &[ArgValue::scalar(40.0), data(), ArgValue::scalar(0.0), ArgValue::scalar(2.0)]),
            n(4.0)
        );
        assert_eq!(
            call(&XMatchFn, &[ArgValue::scalar(1.0), data(), ArgValue::scalar(5.0)]).error_kind(),
            Some(CellErrorKind::Value)
        );
    }

    fn table() -> ArgValue<'static> {
        ArgValue::Range(RangeView::from_rows(vec![
            vec![n(1.0), t("one")],
            vec![n(2.0), t("two")],
            vec![n(3.0), t("three")],
        ]))
    }

    #[test]
    fn vlookup_sorted_and_exact() {
        assert_eq!(call(&VLookupFn, &[ArgValue::scalar(2.5), table(), ArgValue::scalar(2.0)]), t("two"));
        assert_eq!(
            call(&VLookupFn, &[ArgValue::scalar(3.0), table(), ArgValue::scalar(2.0), ArgValue::scalar(false)]),
            t("three")
        );
        assert_eq!(
            call(&VLookupFn, &[ArgValue::scalar(2.5), table(), ArgValue::scalar(2.0), ArgValue::scalar(false)])
                .error_kind(),
            Some(CellErrorKind::Na)
        );
        assert_eq!(
            call(&VLookupFn, &[ArgValue::scalar(1.0), table(), ArgValue::scalar(3.0)]).error_kind(),
            Some(CellErrorKind::Ref)
        );
        assert_eq!(
            call(&VLookupFn, &[ArgValue::scalar(1.0), table(), ArgValue::scalar(0.0)]).error_kind(),
            Some(CellErrorKind::Value)
        );
    }

    #[test]
    fn hlookup_reads_rows() {
        let wide = ArgValue::Range(RangeView::from_rows(vec![
            vec![t("a"), t("b"), t("c")],
            vec![n(1.0), n(2.0), n(3.0)],
        ]));
        assert_eq!(
            call(&HLookupFn, &[ArgValue::scalar("B"), wide, ArgValue::scalar(2.0), ArgValue::scalar(false)]),
            n(2.0)
        );
    }

    #[test]
    fn lookup_with_and_without_result_range() {
        let keys = column(vec![n(1.0), n(5.0), n(9.0)]);
        let results = ArgValue::Range(RangeView::from_rows(vec![vec![t("lo"), t("mid"), t("hi")]]));
        assert_eq!(call(&LookupFn, &[ArgValue::scalar(6.0), keys, results]), t("mid"));
        assert_eq!(call(&LookupFn, &[ArgValue::scalar(2.0), table()]), t("two"));
        assert_eq!(call(&LookupFn, &[ArgValue::scalar(0.0), table()]).error_kind(), Some(CellErrorKind::Na));
    }

    #[test]
    fn error_keys_propagate() {
        let key = ArgValue::from(CellValue::Error(CellError::new_div()));
        assert_eq!(call(&VLookupFn, &[key, table(), ArgValue::scalar(2.0)]).error_kind(), Some(CellErrorKind::Div));
    }
}
