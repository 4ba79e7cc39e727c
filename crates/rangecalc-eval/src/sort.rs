//! Multi-key sorting of view rows, top-N selection and row de-duplication.
//!
//! Every routine here orders cells with [`compare_for_sort`]: empty cells
//! last whatever the direction, otherwise number < error < text < boolean,
//! natural order within a type, and the direction flips only same-type
//! comparisons.

use std::cmp::Ordering;
use std::rc::Rc;

use rangecalc_common::{CellError, CellValue};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::coercion::{cmp_numbers, compare_values, same_type, type_rank};
use crate::engine::range_view::{RangeView, TraversalOrder};
use crate::locale::Locale;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// `1` ascending, `-1` descending, anything else rejected.
    pub fn from_sign(n: f64) -> Option<Self> {
        if n == 1.0 {
            Some(SortOrder::Ascending)
        } else if n == -1.0 {
            Some(SortOrder::Descending)
        } else {
            None
        }
    }

    #[inline]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

pub fn compare_for_sort(a: &CellValue, b: &CellValue, order: SortOrder, locale: &Locale) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ if same_type(a, b) => order.apply(compare_values(a, b, locale)),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Sort a slice of values in place (stable).
pub fn sort_values(values: &mut [CellValue], order: SortOrder, locale: &Locale) {
    values.sort_by(|a, b| compare_for_sort(a, b, order, locale));
}

/// What a criterion sorts by.
#[derive(Clone, Debug)]
pub enum SortKey<'a> {
    /// A column of the sorted view.
    Column(usize),
    /// A separate single row/column with one value per sorted row.
    Values(RangeView<'a>),
}

#[derive(Clone, Debug)]
pub struct SortCriterion<'a> {
    pub key: SortKey<'a>,
    pub order: SortOrder,
}

impl<'a> SortCriterion<'a> {
    pub fn column(col: usize, order: SortOrder) -> Self {
        SortCriterion {
            key: SortKey::Column(col),
            order,
        }
    }

    pub fn values(view: RangeView<'a>, order: SortOrder) -> Self {
        SortCriterion {
            key: SortKey::Values(view),
            order,
        }
    }
}

pub type Criteria<'a> = SmallVec<[SortCriterion<'a>; 2]>;

struct KeyColumns {
    keys: SmallVec<[(Vec<CellValue>, SortOrder); 2]>,
}

impl KeyColumns {
    fn build(view: &RangeView<'_>, criteria: &[SortCriterion<'_>]) -> Result<Self, CellError> {
        let rows = view.height();
        let mut keys = SmallVec::new();
        let default = [SortCriterion::column(0, SortOrder::Ascending)];
        let criteria = if criteria.is_empty() && view.width() > 0 {
            &default[..]
        } else {
            criteria
        };
        for (i, c) in criteria.iter().enumerate() {
            let values = match &c.key {
                SortKey::Column(col) if *col < view.width() => {
                    view.get_col(*col, None).flatten(TraversalOrder::RowMajor)
                }
                SortKey::Column(col) => {
                    return Err(CellError::new_value()
                        .with_message(format!(
                            "Sort column {} is outside a range of {} columns",
                            col + 1,
                            view.width()
                        ))
                        .with_argument(i));
                }
                SortKey::Values(by) => {
                    if !by.is_single_col_or_row() || by.width() * by.height() != rows {
                        return Err(CellError::new_value()
                            .with_message(format!(
                                "Sort key has {}x{} cells, expected one value per row ({rows})",
                                by.width(),
                                by.height()
                            ))
                            .with_argument(i));
                    }
                    by.flatten(TraversalOrder::RowMajor)
                }
            };
            keys.push((values, c.order));
        }
        Ok(KeyColumns { keys })
    }

    fn compare(&self, i: usize, j: usize, locale: &Locale) -> Ordering {
        for (vals, order) in &self.keys {
            let o = compare_for_sort(&vals[i], &vals[j], *order, locale);
            if o != Ordering::Equal {
                return o;
            }
        }
        Ordering::Equal
    }
}

/// Stable permutation of row indices ordered by `criteria` (first non-equal
/// criterion wins). No criteria means "first column ascending".
pub fn sort_permutation(
    view: &RangeView<'_>,
    criteria: &[SortCriterion<'_>],
    locale: &Locale,
) -> Result<Vec<usize>, CellError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("sort_permutation", rows = view.height(), keys = criteria.len()).entered();
    let keys = KeyColumns::build(view, criteria)?;
    let mut perm: Vec<usize> = (0..view.height()).collect();
    perm.sort_by(|&i, &j| keys.compare(i, j, locale));
    Ok(perm)
}

/// Rows of `view` in sorted order, as a lazy selection.
pub fn sort_view<'a>(
    view: &RangeView<'a>,
    criteria: &[SortCriterion<'a>],
    locale: &Locale,
) -> Result<RangeView<'a>, CellError> {
    let perm = sort_permutation(view, criteria, locale)?;
    Ok(view.select_rows(perm))
}

/// How [`top_n`] treats rows tied with the N-th.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TiesMode {
    /// Exactly the first N rows.
    #[default]
    FirstN,
    /// First N rows plus every following row tied with the N-th on the criteria.
    WithTies,
    /// First N distinct rows (whole-row equality).
    UniqueRows,
    /// Rows of the first N distinct groups, duplicates included.
    UniqueGroups,
}

impl TiesMode {
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 0.0 => Some(TiesMode::FirstN),
            c if c == 1.0 => Some(TiesMode::WithTies),
            c if c == 2.0 => Some(TiesMode::UniqueRows),
            c if c == 3.0 => Some(TiesMode::UniqueGroups),
            _ => None,
        }
    }
}

/// Sorted top-`n` selection of `view` rows.
pub fn top_n<'a>(
    view: &RangeView<'a>,
    criteria: &[SortCriterion<'a>],
    n: usize,
    ties: TiesMode,
    locale: &Locale,
) -> Result<RangeView<'a>, CellError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("top_n", rows = view.height(), n, ?ties).entered();
    let keys = KeyColumns::build(view, criteria)?;
    let mut perm: Vec<usize> = (0..view.height()).collect();
    perm.sort_by(|&i, &j| keys.compare(i, j, locale));
    if n == 0 {
        return Ok(view.select_rows(Vec::<usize>::new()));
    }

    let picked: Vec<usize> = match ties {
        TiesMode::FirstN => perm.into_iter().take(n).collect(),
        TiesMode::WithTies => {
            let mut out: Vec<usize> = perm.iter().copied().take(n).collect();
            if let Some(&last) = out.last() {
                let taken = out.len();
                out.extend(
                    perm[taken..]
                        .iter()
                        .copied()
                        .take_while(|&r| keys.compare(last, r, locale) == Ordering::Equal),
                );
            }
            out
        }
        TiesMode::UniqueRows | TiesMode::UniqueGroups => {
            let grid = view.get_all();
            let mut groups: FxHashSet<&[CellValue]> = FxHashSet::default();
            let mut out = Vec::new();
            for r in perm {
                let row = grid[r].as_slice();
                if groups.contains(row) {
                    if ties == TiesMode::UniqueGroups {
                        out.push(r);
                    }
                    continue;
                }
                if groups.len() == n {
                    if ties == TiesMode::UniqueRows {
                        break;
                    }
                    continue;
                }
                groups.insert(row);
                out.push(r);
            }
            out
        }
    };
    Ok(view.select_rows(picked))
}

/// Distinct rows in first-occurrence order; with `exactly_once` only rows
/// that appear a single time. Rows compare structurally.
pub fn unique_rows<'a>(view: &RangeView<'a>, exactly_once: bool) -> RangeView<'a> {
    let grid = view.get_all();
    let mut counts: FxHashMap<&[CellValue], (usize, usize)> = FxHashMap::default();
    let mut order = Vec::new();
    for (i, row) in grid.iter().enumerate() {
        counts
            .entry(row.as_slice())
            .and_modify(|(_, n)| *n += 1)
            .or_insert_with(|| {
                order.push(row.as_slice());
                (i, 1)
            });
    }
    let keep: Rc<[usize]> = order
        .iter()
        .filter_map(|row| {
            let (first, n) = counts[row];
            (!exactly_once || n == 1).then_some(first)
        })
        .collect();
    view.select_rows(keep)
}

/// Numbers in ascending order; NaN sorts last.
pub fn sorted_numbers(mut xs: Vec<f64>) -> Vec<f64> {
    xs.sort_by(|a, b| cmp_numbers(*a, *b));
    xs
}

/// 1-based rank of `value` in `data`: ties share the best rank. `None` when
/// `value` does not occur.
pub fn rank_of(value: f64, data: &[f64], order: SortOrder) -> Option<usize> {
    if !data.contains(&value) {
        return None;
    }
    let ahead = data
        .iter()
        .filter(|&&x| order.apply(cmp_numbers(x, value)) == Ordering::Less)
        .count();
    Some(ahead + 1)
}

/// Column-wise counterpart of [`unique_rows`].
pub fn unique_cols<'a>(view: &RangeView<'a>, exactly_once: bool) -> RangeView<'a> {
    unique_rows(&view.transpose(), exactly_once).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> CellValue {
        CellValue::Number(x)
    }

    fn col(xs: &[f64]) -> RangeView<'static> {
        RangeView::from_column(xs.iter().map(|&x| n(x)).collect())
    }

    fn flat(v: &RangeView<'_>) -> Vec<CellValue> {
        v.flatten(TraversalOrder::RowMajor)
    }

    #[test]
    fn permutation_of_three_values() {
        let l = Locale::invariant();
        let v = col(&[3.0, 1.0, 2.0]);
        let asc = [SortCriterion::column(0, SortOrder::Ascending)];
        let desc = [SortCriterion::column(0, SortOrder::Descending)];
        assert_eq!(sort_permutation(&v, &asc, &l).unwrap(), vec![1, 2, 0]);
        assert_eq!(sort_permutation(&v, &desc, &l).unwrap(), vec![0, 2, 1]);
        assert_eq!(sort_permutation(&v, &[], &l).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn type_order_is_direction_independent() {
        let l = Locale::invariant();
        let values = vec![
            CellValue::Boolean(false),
            CellValue::Empty,
            CellValue::from("b"),
            n(2.0),
            CellValue::from("a"),
            n(1.0),
        ];
        let mut asc = values.clone();
        sort_values(&mut asc, SortOrder::Ascending, &l);
        assert_eq!(
            asc,
            vec![n(1.0), n(2.0), CellValue::from("a"), CellValue::from("b"), CellValue::Boolean(false), CellValue::Empty]
        );
        let mut desc = values;
        sort_values(&mut desc, SortOrder::Descending, &l);
        assert_eq!(
            desc,
            vec![n(2.0), n(1.0), CellValue::from("b"), CellValue::from("a"), CellValue::Boolean(false), CellValue::Empty]
        );
    }

    #[test]
    fn multiple_criteria_and_stability() {
        let l = Locale::invariant();
        let v = RangeView::from_rows(vec![
            vec![CellValue::from("x"), n(2.0)],
            vec![CellValue::from("y"), n(1.0)],
            vec![CellValue::from("x"), n(1.0)],
            vec![CellValue::from("y"), n(1.0)],
        ]);
        let crit = [
            SortCriterion::column(0, SortOrder::Descending),
            SortCriterion::column(1, SortOrder::Ascending),
        ];
        assert_eq!(sort_permutation(&v, &crit, &l).unwrap(), vec![1, 3, 2, 0]);
        let sorted = sort_view(&v, &crit, &l).unwrap();
        assert_eq!(sorted.get(1, 3), n(2.0));
    }

    #[test]
    fn sort_by_external_values_and_bad_keys() {
        let l = Locale::invariant();
        let v = col(&[10.0, 20.0, 30.0]);
        let by = RangeView::from_rows(vec![vec![n(3.0), n(1.0), n(2.0)]]);
        let crit = [SortCriterion::values(by, SortOrder::Ascending)];
        assert_eq!(flat(&sort_view(&v, &crit, &l).unwrap()), vec![n(20.0), n(30.0), n(10.0)]);

        let short = [SortCriterion::values(col(&[1.0]), SortOrder::Ascending)];
        assert!(sort_permutation(&v, &short, &l).is_err());
        let wide = [SortCriterion::column(4, SortOrder::Ascending)];
        assert_eq!(
            sort_permutation(&v, &wide, &l).unwrap_err().kind,
            rangecalc_common::CellErrorKind::Value
        );
    }

    #[test]
    fn top_n_tie_modes() {
        let l = Locale::invariant();
        let v = col(&[5.0, 9.0, 7.0, 9.0, 7.0, 1.0]);
        let crit = [SortCriterion::column(0, SortOrder::Descending)];
        let run = |k, t| flat(&top_n(&v, &crit, k, t, &l).unwrap());
        assert_eq!(run(2, TiesMode::FirstN), vec![n(9.0), n(9.0)]);
        assert_eq!(run(3, TiesMode::WithTies), vec![n(9.0), n(9.0), n(7.0), n(7.0)]);
        assert_eq!(run(3, TiesMode::UniqueRows), vec![n(9.0), n(7.0), n(5.0)]);
        assert_eq!(run(2, TiesMode::UniqueGroups), vec![n(9.0), n(9.0), n(7.0), n(7.0)]);
        assert!(run(0, TiesMode::FirstN).is_empty());
        assert_eq!(run(10, TiesMode::FirstN).len(), 6);
    }

    #[test]
    fn ranks_share_the_best_position() {
        let data = sorted_numbers(vec![7.0, 3.5, 3.5, 1.0, 2.0]);
        assert_eq!(data, vec![1.0, 2.0, 3.5, 3.5, 7.0]);
        assert_eq!(rank_of(3.5, &data, SortOrder::Descending), Some(2));
        assert_eq!(rank_of(3.5, &data, SortOrder::Ascending), Some(3));
        assert_eq!(rank_of(7.0, &data, SortOrder::Ascending), Some(5));
        assert_eq!(rank_of(4.0, &data, SortOrder::Ascending), None);
    }

    #[test]
    fn unique_first_occurrence_and_exactly_once() {
        let v = col(&[1.0, 2.0, 1.0, 3.0]);
        assert_eq!(flat(&unique_rows(&v, false)), vec![n(1.0), n(2.0), n(3.0)]);
        assert_eq!(flat(&unique_rows(&v, true)), vec![n(2.0), n(3.0)]);

        let wide = RangeView::from_rows(vec![vec![n(1.0), n(2.0), n(1.0)]]);
        assert_eq!(unique_cols(&wide, false).get_all(), vec![vec![n(1.0), n(2.0)]]);
    }

    #[test]
    fn unique_compares_whole_rows() {
        let v = RangeView::from_rows(vec![
            vec![n(1.0), CellValue::from("a")],
            vec![n(1.0), CellValue::from("b")],
            vec![n(1.0), CellValue::from("a")],
        ]);
        assert_eq!(unique_rows(&v, false).height(), 2);
        assert_eq!(unique_rows(&v, true).get_all(), vec![vec![n(1.0), CellValue::from("b")]]);
    }
}
