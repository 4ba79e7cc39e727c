//! Argument schemas and typed accessors for builtin functions.

use rangecalc_common::{CellError, CellValue};
use smallvec::{SmallVec, smallvec};

use crate::coercion::{to_logical, to_number};
use crate::engine::EvaluationPass;
use crate::engine::range_view::RangeView;
use crate::locale::Locale;
use crate::traits::ArgValue;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArgKind {
    Any,
    Number,
    Logical,
    Range,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShapeKind {
    Scalar,
    Range,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CoercionPolicy {
    None,
    NumberLenientText,
    Logical,
}

#[derive(Clone, Debug)]
pub struct ArgSchema {
    pub kinds: SmallVec<[ArgKind; 2]>,
    pub required: bool,
    pub shape: ShapeKind,
    pub coercion: CoercionPolicy,
    pub default: Option<CellValue>,
}

impl ArgSchema {
    pub fn any() -> Self {
        Self {
            kinds: smallvec![ArgKind::Any],
            required: true,
            shape: ShapeKind::Scalar,
            coercion: CoercionPolicy::None,
            default: None,
        }
    }

    pub fn range() -> Self {
        Self {
            kinds: smallvec![ArgKind::Range],
            required: true,
            shape: ShapeKind::Range,
            coercion: CoercionPolicy::None,
            default: None,
        }
    }

    pub fn number_lenient_scalar() -> Self {
        Self {
            kinds: smallvec![ArgKind::Number],
            required: true,
            shape: ShapeKind::Scalar,
            coercion: CoercionPolicy::NumberLenientText,
            default: None,
        }
    }

    pub fn logical_scalar() -> Self {
        Self {
            kinds: smallvec![ArgKind::Logical],
            required: true,
            shape: ShapeKind::Scalar,
            coercion: CoercionPolicy::Logical,
            default: None,
        }
    }

    /// Optional argument with a default value.
    pub fn optional(mut self, default: CellValue) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    fn check_scalar(&self, v: &CellValue, locale: &Locale) -> Result<(), CellError> {
        match self.coercion {
            CoercionPolicy::None => Ok(()),
            CoercionPolicy::NumberLenientText => to_number(v, locale).map(|_| ()),
            CoercionPolicy::Logical => to_logical(v).map(|_| ()),
        }
    }
}

/// Arity and shape validation shared by every function. Variadic functions
/// reuse the last schema entry for trailing arguments.
pub fn validate_args(
    name: &str,
    schema: &[ArgSchema],
    min_args: usize,
    variadic: bool,
    args: &[ArgValue<'_>],
) -> Result<(), CellError> {
    if args.len() < min_args {
        return Err(CellError::new_value().with_message(format!(
            "{name} expects at least {min_args} arguments, got {}",
            args.len()
        )));
    }
    if !variadic && !schema.is_empty() && args.len() > schema.len() {
        return Err(CellError::new_value().with_message(format!(
            "{name} expects at most {} arguments, got {}",
            schema.len(),
            args.len()
        )));
    }
    let locale = Locale::invariant();
    for (i, arg) in args.iter().enumerate() {
        let Some(entry) = schema.get(i).or(if variadic { schema.last() } else { None }) else {
            continue;
        };
        match (entry.shape, arg) {
            (ShapeKind::Scalar, ArgValue::Range(v)) if !v.is_single_element() => {
                return Err(CellError::new_value()
                    .with_message(format!("{name}: argument {} must be a single value", i + 1))
                    .with_argument(i));
            }
            (ShapeKind::Scalar, ArgValue::Scalar(r)) => {
                entry.check_scalar(&r.value, &locale)
                    .map_err(|e| e.with_argument(i))?;
            }
            _ => {}
        }
    }
    Ok(())
}

/* ───────────────────────── typed accessors ───────────────────────── */

fn present<'x, 'a>(args: &'x [ArgValue<'a>], i: usize) -> Option<&'x ArgValue<'a>> {
    args.get(i).filter(|a| !matches!(a, ArgValue::Scalar(r) if r.value.is_empty()))
}

/// Argument `i` as a number; missing or empty arguments yield `default`.
pub fn number_or(args: &[ArgValue<'_>], i: usize, default: f64, locale: &Locale) -> Result<f64, CellError> {
    match present(args, i) {
        Some(a) => to_number(&a.value()?, locale).map_err(|e| e.with_argument(i)),
        None => Ok(default),
    }
}

pub fn number(args: &[ArgValue<'_>], i: usize, locale: &Locale) -> Result<f64, CellError> {
    match args.get(i) {
        Some(a) => to_number(&a.value()?, locale).map_err(|e| e.with_argument(i)),
        None => Err(CellError::new_value()
            .with_message(format!("Missing argument {}", i + 1))
            .with_argument(i)),
    }
}

/// Integer argument (truncated towards zero).
pub fn integer_or(args: &[ArgValue<'_>], i: usize, default: i64, locale: &Locale) -> Result<i64, CellError> {
    number_or(args, i, default as f64, locale).map(|n| n.trunc() as i64)
}

pub fn logical_or(args: &[ArgValue<'_>], i: usize, default: bool) -> Result<bool, CellError> {
    match present(args, i) {
        Some(a) => to_logical(&a.value()?).map_err(|e| e.with_argument(i)),
        None => Ok(default),
    }
}

/// Argument `i` as a view; scalars become interned 1×1 views.
pub fn view<'a>(args: &[ArgValue<'a>], i: usize, pass: &mut EvaluationPass) -> Result<RangeView<'a>, CellError> {
    match args.get(i) {
        Some(a) => Ok(a.to_view(pass.scalars())),
        None => Err(CellError::new_value()
            .with_message(format!("Missing range argument {}", i + 1))
            .with_argument(i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangecalc_common::CellErrorKind;

    #[test]
    fn arity_and_shape_checks() {
        let schema = [ArgSchema::number_lenient_scalar(), ArgSchema::range()];
        let range = RangeView::from_column(vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
        let ok = [ArgValue::scalar(1.0), ArgValue::Range(range.clone())];
        assert!(validate_args("F", &schema, 2, false, &ok).is_ok());

        let few = [ArgValue::scalar(1.0)];
        assert!(validate_args("F", &schema, 2, false, &few).is_err());

        let wrong_shape = [ArgValue::Range(range.clone()), ArgValue::Range(range)];
        let e = validate_args("F", &schema, 2, false, &wrong_shape).unwrap_err();
        assert_eq!(e.context.and_then(|c| c.argument), Some(0));

        let bad_number = [ArgValue::scalar("abc"), ArgValue::scalar(1.0)];
        assert_eq!(
            validate_args("F", &schema, 2, false, &bad_number).unwrap_err().kind,
            CellErrorKind::Value
        );
    }

    #[test]
    fn typed_accessors_apply_defaults() {
        let l = Locale::invariant();
        let args = [ArgValue::scalar(2.9), ArgValue::from(CellValue::Empty), ArgValue::scalar("TRUE")];
        assert_eq!(integer_or(&args, 0, 0, &l).unwrap(), 2);
        assert_eq!(number_or(&args, 1, 7.0, &l).unwrap(), 7.0);
        assert_eq!(number_or(&args, 9, 1.5, &l).unwrap(), 1.5);
        assert!(logical_or(&args, 2, false).unwrap());
        assert!(number(&args, 5, &l).is_err());
    }

    #[test]
    fn scalars_become_views() {
        let mut pass = EvaluationPass::default();
        let args = [ArgValue::scalar(5.0)];
        let v = view(&args, 0, &mut pass).unwrap();
        assert!(v.is_single_element());
        assert_eq!(v.get(0, 0), CellValue::Number(5.0));
    }
}
