//! Value coercion and the single cross-type ordering used by search and sort.
//!
//! Coercion table (`→` means success, `✗` means `#VALUE!`, errors always propagate):
//!
//! | from \ to | number                 | logical               | text            |
//! |-----------|------------------------|-----------------------|-----------------|
//! | Number    | itself                 | `n != 0`              | shortest repr   |
//! | Text      | invariant parse or ✗   | `TRUE`/`FALSE` or ✗   | itself          |
//! | Boolean   | 1 / 0                  | itself                | `TRUE`/`FALSE`  |
//! | Empty     | 0                      | false                 | `""`            |
//!
//! `to_number_strict` refuses text altogether.

use std::cmp::Ordering;

use rangecalc_common::{CellError, CellValue};

use crate::locale::Locale;

pub fn to_number(v: &CellValue, locale: &Locale) -> Result<f64, CellError> {
    match v {
        CellValue::Number(n) => Ok(*n),
        CellValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Empty => Ok(0.0),
        CellValue::Text(s) => locale.parse_number_invariant(s).ok_or_else(|| {
            CellError::new_value().with_message(format!("Cannot convert '{s}' to a number"))
        }),
        CellValue::Error(e) => Err(e.clone()),
    }
}

pub fn to_logical(v: &CellValue) -> Result<bool, CellError> {
    match v {
        CellValue::Boolean(b) => Ok(*b),
        CellValue::Number(n) => Ok(*n != 0.0),
        CellValue::Empty => Ok(false),
        CellValue::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" => Ok(true),
            "FALSE" => Ok(false),
            _ => Err(CellError::new_value()
                .with_message(format!("Cannot convert '{s}' to a boolean"))),
        },
        CellValue::Error(e) => Err(e.clone()),
    }
}

pub fn to_text(v: &CellValue) -> Result<String, CellError> {
    match v {
        CellValue::Error(e) => Err(e.clone()),
        other => Ok(other.to_string()),
    }
}

/// Cross-type rank: number < error < text < boolean, empty after everything.
#[inline]
pub fn type_rank(v: &CellValue) -> u8 {
    match v {
        CellValue::Number(_) => 0,
        CellValue::Error(_) => 1,
        CellValue::Text(_) => 2,
        CellValue::Boolean(_) => 3,
        CellValue::Empty => 4,
    }
}

#[inline]
pub fn same_type(a: &CellValue, b: &CellValue) -> bool {
    type_rank(a) == type_rank(b)
}

/// `-0` folds into `0` and every NaN into one canonical NaN.
#[inline]
pub fn canonical_number(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else if x.is_nan() {
        f64::NAN
    } else {
        x
    }
}

/// Total order on numbers: `-0 == 0`, NaN equals NaN and sorts above every
/// other number.
#[inline]
pub fn cmp_numbers(x: f64, y: f64) -> Ordering {
    canonical_number(x).total_cmp(&canonical_number(y))
}

/// Natural order within one type; cross-type falls back to [`type_rank`].
pub fn compare_values(a: &CellValue, b: &CellValue, locale: &Locale) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => cmp_numbers(*x, *y),
        (CellValue::Text(x), CellValue::Text(y)) => locale.compare_text(x, y),
        (CellValue::Boolean(x), CellValue::Boolean(y)) => x.cmp(y),
        (CellValue::Error(x), CellValue::Error(y)) => {
            locale.compare_text(x.kind.code(), y.kind.code())
        }
        (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Exact lookup equality: same tag and equal under the locale collation.
pub fn lookup_equal(a: &CellValue, b: &CellValue, locale: &Locale) -> bool {
    same_type(a, b) && compare_values(a, b, locale) == Ordering::Equal
}
