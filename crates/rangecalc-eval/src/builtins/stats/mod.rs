//! Order statistics: RANK.EQ, LARGE, SMALL, PERCENTILE.INC/EXC, QUARTILE.INC/EXC.
//!
//! Range arguments contribute only their numeric cells; text, logicals and
//! blanks are skipped. Errors anywhere in the data propagate. Empty data and
//! out-of-range `k` are `#NUM!`.

use once_cell::sync::Lazy;
use rangecalc_common::{CellError, CellValue};

use crate::args::{self, ArgSchema};
use crate::builtins::utils::{ARG_RANGE_NUM, collect_numbers};
use crate::coercion::to_number;
use crate::engine::EvaluationPass;
use crate::function::Function;
use crate::sort::{self, SortOrder};
use crate::traits::{ArgValue, CalcValue};

fn sorted_numbers(arg: &ArgValue<'_>, pass: &EvaluationPass) -> Result<Vec<f64>, CellError> {
    collect_numbers(arg, pass.locale()).map(sort::sorted_numbers)
}

/// Linear interpolation at fractional 0-based `rank` of sorted data.
fn interpolate(sorted: &[f64], rank: f64) -> f64 {
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    match sorted.get(lo + 1) {
        Some(hi) if frac > 0.0 => sorted[lo] + frac * (hi - sorted[lo]),
        _ => sorted[lo],
    }
}

pub fn percentile_inc(sorted: &[f64], k: f64) -> Result<f64, CellError> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&k) {
        return Err(CellError::new_num().with_message(format!("Percentile {k} is outside [0, 1]")));
    }
    Ok(interpolate(sorted, k * (sorted.len() - 1) as f64))
}

pub fn percentile_exc(sorted: &[f64], k: f64) -> Result<f64, CellError> {
    let n = sorted.len() as f64;
    let rank = k * (n + 1.0) - 1.0;
    if sorted.is_empty() || k <= 0.0 || k >= 1.0 || rank < 0.0 || rank > n - 1.0 {
        return Err(CellError::new_num()
            .with_message(format!("Percentile {k} is outside the exclusive range for {n} values")));
    }
    Ok(interpolate(sorted, rank))
}

#[derive(Debug)]
pub struct RankEqFn;

/// RANK.EQ(value, data, [is_ascending=0]); ties share the best rank.
impl Function for RankEqFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "RANK.EQ"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["RANK"]
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        static SCHEMA: Lazy<Vec<ArgSchema>> = Lazy::new(|| {
            vec![
                ArgSchema::number_lenient_scalar(),
                ArgSchema::range(),
                ArgSchema::number_lenient_scalar().optional(CellValue::Number(0.0)),
            ]
        });
        &SCHEMA[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let value = to_number(&args[0].value()?, pass.locale())?;
        let data = collect_numbers(&args[1], pass.locale())?;
        let order = if args::number_or(args, 2, 0.0, pass.locale())? != 0.0 {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        };
        let rank = sort::rank_of(value, &data, order).ok_or_else(|| {
            CellError::new_na().with_message(format!("Value {value} does not appear in the data"))
        })?;
        Ok(CalcValue::from(CellValue::Number(rank as f64)))
    }
}

fn kth(args: &[ArgValue<'_>], pass: &EvaluationPass, largest: bool) -> Result<f64, CellError> {
    let xs = sorted_numbers(&args[0], pass)?;
    let k = args::number(args, 1, pass.locale())?.trunc();
    if k < 1.0 || k > xs.len() as f64 {
        return Err(CellError::new_num().with_message(format!("k = {k} is outside 1..={}", xs.len())));
    }
    let k = k as usize;
    Ok(if largest { xs[xs.len() - k] } else { xs[k - 1] })
}

#[derive(Debug)]
pub struct LargeFn;

/// LARGE(data, k): k-th largest value.
impl Function for LargeFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "LARGE"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        kth(args, pass, true).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

#[derive(Debug)]
pub struct SmallFn;

/// SMALL(data, k): k-th smallest value.
impl Function for SmallFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "SMALL"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        kth(args, pass, false).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

#[derive(Debug)]
pub struct PercentileIncFn;

impl Function for PercentileIncFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "PERCENTILE.INC"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["PERCENTILE"]
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let xs = sorted_numbers(&args[0], pass)?;
        let k = args::number(args, 1, pass.locale())?;
        percentile_inc(&xs, k).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

#[derive(Debug)]
pub struct PercentileExcFn;

impl Function for PercentileExcFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "PERCENTILE.EXC"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let xs = sorted_numbers(&args[0], pass)?;
        let k = args::number(args, 1, pass.locale())?;
        percentile_exc(&xs, k).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

fn quart(args: &[ArgValue<'_>], pass: &EvaluationPass, range: std::ops::RangeInclusive<f64>) -> Result<f64, CellError> {
    let q = args::number(args, 1, pass.locale())?.trunc();
    if !range.contains(&q) {
        return Err(CellError::new_num()
            .with_message(format!("Quartile {q} is outside {}..={}", range.start(), range.end()))
            .with_argument(1));
    }
    Ok(q / 4.0)
}

#[derive(Debug)]
pub struct QuartileIncFn;

/// QUARTILE.INC(data, quartile 0..=4)
impl Function for QuartileIncFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "QUARTILE.INC"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["QUARTILE"]
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let k = quart(args, pass, 0.0..=4.0)?;
        let xs = sorted_numbers(&args[0], pass)?;
        percentile_inc(&xs, k).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

#[derive(Debug)]
pub struct QuartileExcFn;

/// QUARTILE.EXC(data, quartile 1..=3)
impl Function for QuartileExcFn {
    crate::func_caps!(PURE, REDUCTION, NUMERIC_ONLY);
    fn name(&self) -> &'static str {
        "QUARTILE.EXC"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn arg_schema(&self) -> &'static [ArgSchema] {
        &ARG_RANGE_NUM[..]
    }
    fn eval<'a>(
        &self,
        args: &[ArgValue<'a>],
        pass: &mut EvaluationPass,
    ) -> Result<CalcValue<'a>, CellError> {
        let k = quart(args, pass, 1.0..=3.0)?;
        let xs = sorted_numbers(&args[0], pass)?;
        percentile_exc(&xs, k).map(|x| CalcValue::from(CellValue::Number(x)))
    }
}

pub fn register_builtins() {
    crate::register_functions!(
        RankEqFn,
        LargeFn,
        SmallFn,
        PercentileIncFn,
        PercentileExcFn,
        QuartileIncFn,
        QuartileExcFn,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::range_view::RangeView;
    use rangecalc_common::CellErrorKind;

    fn data(xs: &[f64]) -> ArgValue<'static> {
        ArgValue::Range(RangeView::from_column(xs.iter().map(|&x| CellValue::Number(x)).collect()))
    }

    fn eval(f: &dyn Function, args: &[ArgValue<'_>]) -> CellValue {
        let mut pass = EvaluationPass::default();
        match f.dispatch(args, &mut pass) {
            CalcValue::Scalar(r) => r.value,
            CalcValue::Range(v) => panic!("unexpected array {:?}", v.get_all()),
        }
    }

    fn num(f: &dyn Function, args: &[ArgValue<'_>]) -> f64 {
        match eval(f, args) {
            CellValue::Number(n) => n,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn rank_eq_both_directions() {
        let d = || data(&[7.0, 3.5, 3.5, 1.0, 2.0]);
        assert_eq!(num(&RankEqFn, &[ArgValue::scalar(7.0), d(), ArgValue::scalar(1.0)]), 5.0);
        assert_eq!(num(&RankEqFn, &[ArgValue::scalar(3.5), d()]), 2.0);
        assert_eq!(num(&RankEqFn, &[ArgValue::scalar(2.0), d()]), 4.0);
        assert_eq!(eval(&RankEqFn, &[ArgValue::scalar(9.0), d()]).error_kind(), Some(CellErrorKind::Na));
    }

    #[test]
    fn large_and_small() {
        let d = || data(&[3.0, 5.0, 3.0, 5.0, 4.0]);
        assert_eq!(num(&LargeFn, &[d(), ArgValue::scalar(3.0)]), 4.0);
        assert_eq!(num(&SmallFn, &[d(), ArgValue::scalar(2.0)]), 3.0);
        assert_eq!(eval(&LargeFn, &[d(), ArgValue::scalar(6.0)]).error_kind(), Some(CellErrorKind::Num));
        assert_eq!(eval(&SmallFn, &[d(), ArgValue::scalar(0.0)]).error_kind(), Some(CellErrorKind::Num));
    }

    #[test]
    fn percentiles() {
        assert!((num(&PercentileIncFn, &[data(&[1.0, 3.0, 2.0, 4.0]), ArgValue::scalar(0.3)]) - 1.9).abs() < 1e-12);
        let d = data(&[1.0, 2.0, 3.0, 6.0, 6.0, 6.0, 7.0, 8.0, 9.0]);
        assert!((num(&PercentileExcFn, &[d.clone(), ArgValue::scalar(0.25)]) - 2.5).abs() < 1e-12);
        assert_eq!(
            eval(&PercentileExcFn, &[d, ArgValue::scalar(0.05)]).error_kind(),
            Some(CellErrorKind::Num)
        );
        assert_eq!(
            eval(&PercentileIncFn, &[data(&[1.0]), ArgValue::scalar(1.5)]).error_kind(),
            Some(CellErrorKind::Num)
        );
    }

    #[test]
    fn quartiles() {
        let inc = data(&[1.0, 2.0, 4.0, 7.0, 8.0, 9.0, 10.0, 12.0]);
        assert!((num(&QuartileIncFn, &[inc.clone(), ArgValue::scalar(1.0)]) - 3.5).abs() < 1e-12);
        assert_eq!(num(&QuartileIncFn, &[inc.clone(), ArgValue::scalar(4.0)]), 12.0);
        assert_eq!(eval(&QuartileIncFn, &[inc, ArgValue::scalar(5.0)]).error_kind(), Some(CellErrorKind::Num));

        let exc = || data(&[6.0, 7.0, 15.0, 36.0, 39.0, 40.0, 41.0, 42.0, 43.0, 47.0, 49.0]);
        assert_eq!(num(&QuartileExcFn, &[exc(), ArgValue::scalar(1.0)]), 15.0);
        assert_eq!(num(&QuartileExcFn, &[exc(), ArgValue::scalar(3.0)]), 43.0);
        assert_eq!(eval(&QuartileExcFn, &[exc(), ArgValue::scalar(0.0)]).error_kind(), Some(CellErrorKind::Num));
    }

    #[test]
    fn text_and_blanks_are_skipped() {
        let mixed = ArgValue::Range(RangeView::from_column(vec![
            CellValue::Number(1.0),
            CellValue::from("x"),
            CellValue::Empty,
            CellValue::Number(3.0),
        ]));
        assert_eq!(num(&LargeFn, &[mixed, ArgValue::scalar(1.0)]), 3.0);
    }
}
