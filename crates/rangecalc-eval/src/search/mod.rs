//! Lookup search over one lane (a row or a column) of a view.
//!
//! * [`dichotomic_search`] – binary search over an ordered lane, reading only
//!   the probed cells.
//! * [`linear_search`] – full scan with wildcard support, memoized per pass in
//!   a [`SearchCache`].
//!
//! Both report `None` when nothing matches; callers turn that into `#N/A`.

pub mod wildcard;

use std::cmp::Ordering;
use std::rc::Rc;

use rangecalc_common::CellValue;
use rustc_hash::FxHashMap;

use crate::coercion::{compare_values, lookup_equal, same_type};
use crate::engine::cache::{ExactIndex, MatchKey, SearchCache};
use crate::engine::range_view::{RangeView, TraversalOrder};
use crate::locale::Locale;
use crate::sort::SortOrder;

pub use wildcard::{WildcardPattern, has_wildcards, is_pattern};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SearchMode {
    /// Exact match only.
    Strict,
    /// Exact match, else the greatest value below the key.
    NextSmaller,
    /// Exact match, else the smallest value above the key.
    NextGreater,
    /// `*`/`?`/`~` patterns for text keys, exact otherwise. Treated as `Strict`
    /// by the dichotomic search.
    Wildcard,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Reverse,
}

/// Which one-dimensional projection of a view is searched.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Lane {
    /// Column `i`, indexed by row.
    Col(usize),
    /// Row `i`, indexed by column.
    Row(usize),
}

impl Lane {
    pub fn len(&self, view: &RangeView<'_>) -> usize {
        match self {
            Lane::Col(_) => view.height(),
            Lane::Row(_) => view.width(),
        }
    }

    pub fn value_at(&self, view: &RangeView<'_>, i: usize) -> CellValue {
        match *self {
            Lane::Col(c) => view.get(c, i),
            Lane::Row(r) => view.get(i, r),
        }
    }

    /// The lane as a one-dimensional view.
    pub fn view<'a>(&self, view: &RangeView<'a>) -> RangeView<'a> {
        match *self {
            Lane::Col(c) => view.get_col(c, None),
            Lane::Row(r) => view.get_row(r, None),
        }
    }

    pub fn values(&self, view: &RangeView<'_>) -> Vec<CellValue> {
        self.view(view).flatten(TraversalOrder::RowMajor)
    }
}

/* ───────────────────────── dichotomic ───────────────────────── */

/// Closest non-empty cell at or left of `mid`, not going below `left`.
///
/// Gallops left from `mid` (steps 1, 2, 4, ...) and then bisects between the
/// first filled probe and the last empty one, so a run of blanks costs
/// O(log run) reads. Blanks are assumed contiguous within the run.
fn nearest_filled(
    left: usize,
    mid: usize,
    project: &mut impl FnMut(usize) -> CellValue,
) -> Option<(usize, CellValue)> {
    let value = project(mid);
    if !value.is_empty() {
        return Some((mid, value));
    }
    let mut empty_at = mid;
    let mut step = 1usize;
    let (mut lo, mut lo_value) = loop {
        if empty_at == left {
            return None;
        }
        let at = mid.saturating_sub(step).max(left);
        let value = project(at);
        if !value.is_empty() {
            break (at, value);
        }
        empty_at = at;
        step = step.saturating_mul(2);
    };
    while empty_at - lo > 1 {
        let m = lo + (empty_at - lo) / 2;
        let value = project(m);
        if value.is_empty() {
            empty_at = m;
        } else {
            lo = m;
            lo_value = value;
        }
    }
    Some((lo, lo_value))
}

/// Binary search over `project(0..length)`, which must be monotonic in `order`.
///
/// Empty cells are skipped by galloping left from the probe. Cross-type
/// probes steer the search by type rank (number < error < text < boolean) but
/// never become candidates. On duplicates `Strict`/`NextGreater` report the
/// first equal index; `NextSmaller` over ascending data reports the last one.
pub fn dichotomic_search_by(
    length: usize,
    key: &CellValue,
    mode: SearchMode,
    order: SortOrder,
    locale: &Locale,
    mut project: impl FnMut(usize) -> CellValue,
) -> Option<usize> {
    if length == 0 || key.is_empty() {
        return None;
    }
    let mode = if mode == SearchMode::Wildcard {
        SearchMode::Strict
    } else {
        mode
    };
    let mut left = 0usize;
    let mut right = length; // exclusive
    let mut best: Option<(usize, bool)> = None;

    while left < right {
        let mid = left + (right - left) / 2;
        let Some((idx, value)) = nearest_filled(left, mid, &mut project) else {
            left = mid + 1;
            continue;
        };

        let ord = compare_values(&value, key, locale);
        if same_type(&value, key) {
            let exact = ord == Ordering::Equal;
            let qualifies = match mode {
                SearchMode::Strict | SearchMode::Wildcard => exact,
                SearchMode::NextSmaller => ord != Ordering::Greater,
                SearchMode::NextGreater => ord != Ordering::Less,
            };
            // Narrowing makes later candidates closer to the key; an exact hit
            // is never replaced by an approximate one.
            if qualifies && !(matches!(best, Some((_, true))) && !exact) {
                best = Some((idx, exact));
            }
        }

        let go_left = match (ord, order) {
            (Ordering::Equal, SortOrder::Ascending) => mode != SearchMode::NextSmaller,
            (Ordering::Equal, SortOrder::Descending) => true,
            (Ordering::Greater, SortOrder::Ascending) | (Ordering::Less, SortOrder::Descending) => {
                true
            }
            _ => false,
        };
        if go_left {
            right = idx;
        } else {
            left = mid + 1;
        }
    }
    best.map(|(i, _)| i)
}

/// Binary search along `lane` of `view`.
pub fn dichotomic_search(
    view: &RangeView<'_>,
    lane: Lane,
    key: &CellValue,
    mode: SearchMode,
    order: SortOrder,
    locale: &Locale,
) -> Option<usize> {
    #[cfg(feature = "tracing")]
    let _span = tracing::trace_span!("dichotomic_search", ?lane, ?mode).entered();
    let line = lane.view(view);
    let len = lane.len(view);
    dichotomic_search_by(len, key, mode, order, locale, |i| match lane {
        Lane::Col(_) => line.get(0, i),
        Lane::Row(_) => line.get(i, 0),
    })
}

/* ─────────────────────────── linear ─────────────────────────── */

fn scan_order(length: usize, direction: SearchDirection) -> Box<dyn Iterator<Item = usize>> {
    match direction {
        SearchDirection::Forward => Box::new(0..length),
        SearchDirection::Reverse => Box::new((0..length).rev()),
    }
}

/// Linear scan of `project(0..length)` in `direction`, without memoization.
///
/// Approximate modes report the first exact match in scan order, else the
/// closest same-type value on the requested side (first one on ties).
pub fn linear_search_by(
    length: usize,
    key: &CellValue,
    mode: SearchMode,
    direction: SearchDirection,
    locale: &Locale,
    mut project: impl FnMut(usize) -> CellValue,
) -> Option<usize> {
    match mode {
        SearchMode::Strict => scan_order(length, direction).find(|&i| lookup_equal(&project(i), key, locale)),
        SearchMode::Wildcard => match key {
            CellValue::Text(p) if is_pattern(p) => {
                let pattern = WildcardPattern::compile(p);
                scan_order(length, direction).find(|&i| match project(i) {
                    CellValue::Text(t) => pattern.matches(&t, locale),
                    _ => false,
                })
            }
            _ => scan_order(length, direction).find(|&i| lookup_equal(&project(i), key, locale)),
        },
        SearchMode::NextSmaller | SearchMode::NextGreater => {
            let wanted = if mode == SearchMode::NextSmaller {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best: Option<(usize, CellValue)> = None;
            for i in scan_order(length, direction) {
                let v = project(i);
                if !same_type(&v, key) {
                    continue;
                }
                match compare_values(&v, key, locale) {
                    Ordering::Equal => return Some(i),
                    o if o == wanted => {
                        let closer = best
                            .as_ref()
                            .is_none_or(|(_, b)| compare_values(&v, b, locale) == wanted.reverse());
                        if closer {
                            best = Some((i, v));
                        }
                    }
                    _ => {}
                }
            }
            best.map(|(i, _)| i)
        }
    }
}

fn build_exact_index(values: &[CellValue], direction: SearchDirection, locale: &Locale) -> ExactIndex {
    let mut map = FxHashMap::with_capacity_and_hasher(values.len(), Default::default());
    for i in scan_order(values.len(), direction) {
        map.entry(MatchKey::new(&values[i], locale)).or_insert(i);
    }
    Rc::new(map)
}

/// Linear search along `lane` of `view`.
///
/// Exact probes build a first-occurrence index of the lane on the first call
/// of the pass and answer repeats from it; wildcard probes memoize their
/// answer per pattern. A memoized answer still declares the lane as a
/// dependency through [`RangeView::register_dependency`].
pub fn linear_search(
    view: &RangeView<'_>,
    lane: Lane,
    key: &CellValue,
    mode: SearchMode,
    direction: SearchDirection,
    locale: &Locale,
    cache: &mut SearchCache,
) -> Option<usize> {
    #[cfg(feature = "tracing")]
    let _span = tracing::trace_span!("linear_search", ?lane, ?mode, ?direction).entered();
    let line = lane.view(view);
    let exact_probe = match (mode, key) {
        (SearchMode::Strict, _) => true,
        (SearchMode::Wildcard, CellValue::Text(p)) => !is_pattern(p),
        (SearchMode::Wildcard, _) => true,
        _ => false,
    };

    if !cache.is_enabled() || !(exact_probe || mode == SearchMode::Wildcard) {
        let values = line.flatten(TraversalOrder::RowMajor);
        return linear_search_by(values.len(), key, mode, direction, locale, |i| {
            values[i].clone()
        });
    }

    let vkey = line.key();
    if exact_probe {
        let index = match cache.get_exact(vkey, lane, direction, locale) {
            Some(index) => {
                line.register_dependency();
                index
            }
            None => {
                let values = line.flatten(TraversalOrder::RowMajor);
                let index = build_exact_index(&values, direction, locale);
                #[cfg(feature = "tracing")]
                tracing::debug!(cells = values.len(), distinct = index.len(), "built exact-match index");
                cache.insert_exact(vkey, lane, direction, locale, Rc::clone(&index));
                index
            }
        };
        return index.get(&MatchKey::new(key, locale)).copied();
    }

    let pattern = match key {
        CellValue::Text(p) => p.as_str(),
        _ => return None,
    };
    if let Some(found) = cache.get_wildcard(vkey, lane, direction, locale, pattern) {
        line.register_dependency();
        return found;
    }
    let values = line.flatten(TraversalOrder::RowMajor);
    let found = linear_search_by(values.len(), key, mode, direction, locale, |i| values[i].clone());
    cache.insert_wildcard(vkey, lane, direction, locale, pattern, found);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(xs: &[f64]) -> RangeView<'static> {
        RangeView::from_column(xs.iter().map(|&x| CellValue::Number(x)).collect())
    }

    fn dich(xs: &[CellValue], key: CellValue, mode: SearchMode, order: SortOrder) -> Option<usize> {
        dichotomic_search_by(xs.len(), &key, mode, order, &Locale::invariant(), |i| xs[i].clone())
    }

    fn n(x: f64) -> CellValue {
        CellValue::Number(x)
    }

    #[test]
    fn strict_dichotomic_finds_present_keys() {
        let xs: Vec<_> = [1.0, 3.0, 5.0, 7.0, 9.0, 11.0].map(n).to_vec();
        for (i, x) in xs.iter().enumerate() {
            assert_eq!(dich(&xs, x.clone(), SearchMode::Strict, SortOrder::Ascending), Some(i));
        }
        assert_eq!(dich(&xs, n(4.0), SearchMode::Strict, SortOrder::Ascending), None);
    }

    #[test]
    fn next_smaller_and_next_greater_ascending() {
        let xs: Vec<_> = [10.0, 20.0, 30.0, 40.0].map(n).to_vec();
        let asc = SortOrder::Ascending;
        assert_eq!(dich(&xs, n(23.0), SearchMode::NextSmaller, asc), Some(1));
        assert_eq!(dich(&xs, n(5.0), SearchMode::NextSmaller, asc), None);
        assert_eq!(dich(&xs, n(99.0), SearchMode::NextSmaller, asc), Some(3));
        assert_eq!(dich(&xs, n(23.0), SearchMode::NextGreater, asc), Some(2));
        assert_eq!(dich(&xs, n(41.0), SearchMode::NextGreater, asc), None);
        assert_eq!(dich(&xs, n(30.0), SearchMode::NextGreater, asc), Some(2));
    }

    #[test]
    fn descending_order() {
        let xs: Vec<_> = [40.0, 30.0, 20.0, 10.0].map(n).to_vec();
        let desc = SortOrder::Descending;
        assert_eq!(dich(&xs, n(23.0), SearchMode::NextGreater, desc), Some(1));
        assert_eq!(dich(&xs, n(23.0), SearchMode::NextSmaller, desc), Some(2));
        assert_eq!(dich(&xs, n(20.0), SearchMode::NextGreater, desc), Some(2));
        assert_eq!(dich(&xs, n(10.0), SearchMode::Strict, desc), Some(3));
    }

    #[test]
    fn duplicates_resolve_to_first_or_last() {
        let xs: Vec<_> = [1.0, 2.0, 2.0, 2.0, 3.0].map(n).to_vec();
        let asc = SortOrder::Ascending;
        assert_eq!(dich(&xs, n(2.0), SearchMode::Strict, asc), Some(1));
        assert_eq!(dich(&xs, n(2.0), SearchMode::NextSmaller, asc), Some(3));
        assert_eq!(dich(&xs, n(2.0), SearchMode::NextGreater, asc), Some(1));
    }

    #[test]
    fn empties_are_skipped_and_types_do_not_mix() {
        let xs = vec![n(1.0), CellValue::Empty, n(3.0), CellValue::Empty, CellValue::Empty, n(9.0)];
        let asc = SortOrder::Ascending;
        assert_eq!(dich(&xs, n(4.0), SearchMode::NextSmaller, asc), Some(2));
        assert_eq!(dich(&xs, n(9.0), SearchMode::Strict, asc), Some(5));

        let mixed = vec![n(1.0), n(5.0), CellValue::from("apple"), CellValue::from("kiwi"), CellValue::Boolean(true)];
        assert_eq!(dich(&mixed, CellValue::from("banana"), SearchMode::NextSmaller, asc), Some(2));
        assert_eq!(dich(&mixed, n(100.0), SearchMode::NextSmaller, asc), Some(1));
        assert_eq!(dich(&mixed, CellValue::from("a"), SearchMode::NextSmaller, asc), None);
        assert_eq!(dich(&mixed, CellValue::Boolean(true), SearchMode::Strict, asc), Some(4));
    }

    #[test]
    fn dichotomic_reads_only_probed_cells() {
        let xs: Vec<f64> = (0..1024).map(f64::from).collect();
        let mut probes = 0;
        let found = dichotomic_search_by(
            xs.len(),
            &n(700.0),
            SearchMode::Strict,
            SortOrder::Ascending,
            &Locale::invariant(),
            |i| {
                probes += 1;
                n(xs[i])
            },
        );
        assert_eq!(found, Some(700));
        assert!(probes <= 11, "{probes} probes");
    }

    #[test]
    fn linear_strict_and_reverse() {
        let v = nums(&[5.0, 7.0, 5.0, 1.0]);
        let l = Locale::invariant();
        let mut cache = SearchCache::new(16);
        let f = |c: &mut SearchCache, d| linear_search(&v, Lane::Col(0), &n(5.0), SearchMode::Strict, d, &l, c);
        assert_eq!(f(&mut cache, SearchDirection::Forward), Some(0));
        assert_eq!(f(&mut cache, SearchDirection::Reverse), Some(2));
        assert_eq!(
            linear_search(&v, Lane::Col(0), &n(8.0), SearchMode::Strict, SearchDirection::Forward, &l, &mut cache),
            None
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn linear_text_is_case_insensitive_and_type_strict() {
        let v = RangeView::from_column(vec![n(1.0), CellValue::from("1"), CellValue::from("Pear")]);
        let l = Locale::invariant();
        let mut cache = SearchCache::new(16);
        let go = |k: CellValue, c: &mut SearchCache| {
            linear_search(&v, Lane::Col(0), &k, SearchMode::Strict, SearchDirection::Forward, &l, c)
        };
        assert_eq!(go(CellValue::from("1"), &mut cache), Some(1));
        assert_eq!(go(CellValue::from("PEAR"), &mut cache), Some(2));
        assert_eq!(go(n(1.0), &mut cache), Some(0));
    }

    #[test]
    fn linear_wildcards_and_approximate() {
        let v = RangeView::from_column(
            ["alpha", "beta", "gamma", "delta"].iter().map(|s| CellValue::from(*s)).collect(),
        );
        let l = Locale::invariant();
        let mut cache = SearchCache::new(16);
        let w = |k: &str, d, c: &mut SearchCache| {
            linear_search(&v, Lane::Col(0), &CellValue::from(k), SearchMode::Wildcard, d, &l, c)
        };
        assert_eq!(w("*ta", SearchDirection::Forward, &mut cache), Some(1));
        assert_eq!(w("*ta", SearchDirection::Reverse, &mut cache), Some(3));
        assert_eq!(w("g?mma", SearchDirection::Forward, &mut cache), Some(2));
        assert_eq!(w("GAMMA", SearchDirection::Forward, &mut cache), Some(2));
        assert_eq!(w("z*", SearchDirection::Forward, &mut cache), None);

        let unsorted = [30.0, 10.0, 25.0, 40.0];
        let p = |i: usize| n(unsorted[i]);
        let fwd = SearchDirection::Forward;
        assert_eq!(linear_search_by(4, &n(27.0), SearchMode::NextSmaller, fwd, &l, p), Some(2));
        assert_eq!(linear_search_by(4, &n(27.0), SearchMode::NextGreater, fwd, &l, p), Some(0));
        assert_eq!(linear_search_by(4, &n(5.0), SearchMode::NextSmaller, fwd, &l, p), None);
    }

    #[test]
    fn linear_row_lane_and_empty_key() {
        let v = RangeView::from_rows(vec![
            vec![CellValue::from("a"), CellValue::Empty, CellValue::from("c")],
            vec![n(1.0), n(2.0), n(3.0)],
        ]);
        let l = Locale::invariant();
        let mut cache = SearchCache::new(0);
        let fwd = SearchDirection::Forward;
        assert_eq!(linear_search(&v, Lane::Row(1), &n(3.0), SearchMode::Strict, fwd, &l, &mut cache), Some(2));
        assert_eq!(linear_search(&v, Lane::Row(0), &CellValue::Empty, SearchMode::Strict, fwd, &l, &mut cache), Some(1));
        assert_eq!(dichotomic_search(&v, Lane::Row(1), &n(2.5), SearchMode::NextSmaller, SortOrder::Ascending, &l), Some(1));
    }
}
