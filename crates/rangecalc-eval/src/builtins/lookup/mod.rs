//! Lookup and dynamic-array builtins.
//!
//! Exact probes go through the pass search cache, so repeated lookups into
//! the same range in one pass build a single index. Approximate probes on
//! sorted data use the dichotomic search and read O(log n) cells.

pub mod core;
pub mod dynamic;

use rangecalc_common::{CellError, CellValue};

use crate::engine::EvaluationPass;
use crate::engine::range_view::RangeView;
use crate::search::{Lane, SearchDirection, SearchMode, dichotomic_search, linear_search};
use crate::sort::SortOrder;

/// How a lookup walks its lane.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    Linear(SearchDirection),
    Dichotomic(SortOrder),
}

impl Strategy {
    /// XLOOKUP/XMATCH `search_mode`: 1, -1, 2, -2.
    pub fn from_search_mode(code: i64) -> Option<Self> {
        match code {
            1 => Some(Strategy::Linear(SearchDirection::Forward)),
            -1 => Some(Strategy::Linear(SearchDirection::Reverse)),
            2 => Some(Strategy::Dichotomic(SortOrder::Ascending)),
            -2 => Some(Strategy::Dichotomic(SortOrder::Descending)),
            _ => None,
        }
    }
}

/// XLOOKUP/XMATCH `match_mode`: 0 exact, -1 exact or next smaller,
/// 1 exact or next larger, 2 wildcard.
pub fn search_mode_from_code(code: i64) -> Option<SearchMode> {
    match code {
        0 => Some(SearchMode::Strict),
        -1 => Some(SearchMode::NextSmaller),
        1 => Some(SearchMode::NextGreater),
        2 => Some(SearchMode::Wildcard),
        _ => None,
    }
}

pub(crate) fn find(
    view: &RangeView<'_>,
    lane: Lane,
    key: &CellValue,
    mode: SearchMode,
    strategy: Strategy,
    pass: &mut EvaluationPass,
) -> Option<usize> {
    let (locale, cache) = pass.search_parts();
    match strategy {
        Strategy::Linear(direction) => linear_search(view, lane, key, mode, direction, locale, cache),
        Strategy::Dichotomic(order) => dichotomic_search(view, lane, key, mode, order, locale),
    }
}

/// MATCH-style `match_type`: 0 exact (wildcards allowed), positive for the
/// largest value not above the key in ascending data, negative for the
/// smallest value not below it in descending data.
pub(crate) fn find_by_match_type(
    view: &RangeView<'_>,
    lane: Lane,
    key: &CellValue,
    match_type: f64,
    pass: &mut EvaluationPass,
) -> Option<usize> {
    if match_type == 0.0 {
        find(view, lane, key, SearchMode::Wildcard, Strategy::Linear(SearchDirection::Forward), pass)
    } else if match_type > 0.0 {
        find(view, lane, key, SearchMode::NextSmaller, Strategy::Dichotomic(SortOrder::Ascending), pass)
    } else {
        find(view, lane, key, SearchMode::NextGreater, Strategy::Dichotomic(SortOrder::Descending), pass)
    }
}

pub(crate) fn invalid_code(what: &str, code: i64) -> CellError {
    CellError::new_value().with_message(format!("{code} is not a valid {what}"))
}

pub fn register_builtins() {
    crate::register_functions!(
        core::MatchFn,
        core::XMatchFn,
        core::VLookupFn,
        core::HLookupFn,
        core::LookupFn,
        dynamic::XLookupFn,
        dynamic::SortFn,
        dynamic::SortByFn,
        dynamic::SortNFn,
        dynamic::UniqueFn,
        dynamic::TransposeFn,
    );
}
