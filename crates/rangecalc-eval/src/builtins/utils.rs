use once_cell::sync::Lazy;
use rangecalc_common::{CellError, CellValue};

use crate::args::ArgSchema;
use crate::coercion::to_number;
use crate::engine::range_view::RangeView;
use crate::locale::Locale;
use crate::search::Lane;
use crate::traits::{ArgValue, CalcValue};

/// One range argument.
pub static ARG_RANGE_ONE: Lazy<Vec<ArgSchema>> = Lazy::new(|| vec![ArgSchema::range()]);

/// A range followed by a numeric scalar (LARGE, SMALL, PERCENTILE, ...).
pub static ARG_RANGE_NUM: Lazy<Vec<ArgSchema>> =
    Lazy::new(|| vec![ArgSchema::range(), ArgSchema::number_lenient_scalar()]);

/// Numbers of an argument with spreadsheet statistics semantics: range cells
/// contribute only numbers (text, logicals and blanks are skipped), direct
/// scalars are coerced. Errors propagate either way.
pub fn collect_numbers(arg: &ArgValue<'_>, locale: &Locale) -> Result<Vec<f64>, CellError> {
    match arg {
        ArgValue::Scalar(r) => Ok(vec![to_number(&r.value, locale)?]),
        ArgValue::Range(view) => numbers_in_view(view),
    }
}

/// Numbers of a view, skipping other values. The first error wins and carries
/// its position within the view.
pub fn numbers_in_view(view: &RangeView<'_>) -> Result<Vec<f64>, CellError> {
    let mut out = Vec::with_capacity(view.width() * view.height());
    let mut error = None;
    view.visit(|v, c, r| match v {
        CellValue::Number(n) => out.push(*n),
        CellValue::Error(e) if error.is_none() => {
            error = Some(e.clone().with_location(c as u32, r as u32));
        }
        _ => {}
    });
    match error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

/// The searchable lane of a single row or column view.
pub fn single_lane(view: &RangeView<'_>) -> Option<Lane> {
    if view.width() == 1 {
        Some(Lane::Col(0))
    } else if view.height() == 1 {
        Some(Lane::Row(0))
    } else {
        None
    }
}

/// Propagate an error-valued lookup key.
pub fn key_value(arg: &ArgValue<'_>) -> Result<CellValue, CellError> {
    match arg.value()? {
        CellValue::Error(e) => Err(e),
        v => Ok(v),
    }
}

pub fn not_found(key: &CellValue) -> CellError {
    CellError::new_na().with_message(format!("Did not find value '{key}' in the range"))
}

/// A 1×1 view collapses to its only value; anything else stays an array.
pub fn collapse(view: RangeView<'_>) -> CalcValue<'_> {
    if view.is_single_element() {
        CalcValue::from(view.get(0, 0))
    } else {
        CalcValue::Range(view)
    }
}

/// Wrap an array result; an array with no cells is an error value.
pub fn array_result(view: RangeView<'_>) -> Result<CalcValue<'_>, CellError> {
    if view.is_empty() {
        return Err(CellError::new_eval().with_message("No results"));
    }
    Ok(collapse(view))
}

/// Spreadsheet-style f64 check: NaN and infinities become `#NUM!`.
pub fn finite(n: f64) -> Result<f64, CellError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(CellError::new_num())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangecalc_common::CellErrorKind;

    #[test]
    fn ranges_keep_only_numbers() {
        let v = RangeView::from_rows(vec![vec![
            CellValue::Number(1.0),
            CellValue::from("2"),
            CellValue::Boolean(true),
            CellValue::Empty,
            CellValue::Number(4.0),
        ]]);
        let l = Locale::invariant();
        assert_eq!(collect_numbers(&ArgValue::Range(v), &l).unwrap(), vec![1.0, 4.0]);
        assert_eq!(collect_numbers(&ArgValue::scalar("2"), &l).unwrap(), vec![2.0]);
    }

    #[test]
    fn errors_inside_ranges_propagate() {
        let v = RangeView::from_column(vec![CellValue::Number(1.0), CellValue::Error(CellError::new_ref())]);
        let e = numbers_in_view(&v).unwrap_err();
        assert_eq!(e.kind, CellErrorKind::Ref);
        let at = e.context.map(|c| (c.col, c.row));
        assert_eq!(at, Some((Some(0), Some(1))));
    }

    #[test]
    fn lanes_and_empty_arrays() {
        assert_eq!(single_lane(&RangeView::constant(CellValue::Empty, 1, 4)), Some(Lane::Col(0)));
        assert_eq!(single_lane(&RangeView::constant(CellValue::Empty, 4, 1)), Some(Lane::Row(0)));
        assert_eq!(single_lane(&RangeView::constant(CellValue::Empty, 2, 2)), None);
        assert_eq!(array_result(RangeView::empty()).unwrap_err().kind, CellErrorKind::Error);
    }
}
