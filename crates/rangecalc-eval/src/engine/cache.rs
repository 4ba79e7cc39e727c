//! Pass-scoped memoization for linear lookups.
//!
//! Entries are keyed by view identity ([`ViewKey`]) plus the search family
//! (lane, direction, collation and, for wildcard probes, the pattern). The
//! cache belongs to the evaluation pass and must be emptied by
//! [`SearchCache::begin_pass`] before the next pass reads anything.

use std::rc::Rc;

use rangecalc_common::{CellErrorKind, CellValue};
use rustc_hash::FxHashMap;

use crate::coercion::canonical_number;
use crate::engine::range_view::ViewKey;
use crate::locale::{Collation, Locale};
use crate::search::{Lane, SearchDirection};

/// Hashable form of a value under lookup equality: `-0 == 0`, text folded
/// per collation, errors by kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Number(u64),
    Text(String),
    Boolean(bool),
    Error(CellErrorKind),
    Empty,
}

impl MatchKey {
    pub fn new(v: &CellValue, locale: &Locale) -> Self {
        match v {
            CellValue::Number(n) => MatchKey::Number(canonical_number(*n).to_bits()),
            CellValue::Text(s) => MatchKey::Text(locale.fold_case(s).into_owned()),
            CellValue::Boolean(b) => MatchKey::Boolean(*b),
            CellValue::Error(e) => MatchKey::Error(e.kind),
            CellValue::Empty => MatchKey::Empty,
        }
    }
}

/// First-occurrence index of every distinct value in a lane, in scan order.
pub type ExactIndex = Rc<FxHashMap<MatchKey, usize>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct FamilyKey {
    view: ViewKey,
    lane: Lane,
    direction: SearchDirection,
    collation: Collation,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct SearchCache {
    exact: FxHashMap<FamilyKey, ExactIndex>,
    wildcard: FxHashMap<(FamilyKey, String), Option<usize>>,
    entries_cap: usize,
    stats: CacheStats,
}

impl SearchCache {
    /// `entries_cap == 0` disables memoization.
    pub fn new(entries_cap: usize) -> Self {
        Self {
            exact: FxHashMap::default(),
            wildcard: FxHashMap::default(),
            entries_cap,
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries_cap > 0
    }

    /// Drop everything from the previous pass.
    pub fn begin_pass(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            exact = self.exact.len(),
            wildcard = self.wildcard.len(),
            hits = self.stats.hits,
            misses = self.stats.misses,
            "search cache reset"
        );
        self.exact.clear();
        self.wildcard.clear();
        self.stats = CacheStats::default();
    }

    pub fn get_exact(
        &mut self,
        view: ViewKey,
        lane: Lane,
        direction: SearchDirection,
        locale: &Locale,
    ) -> Option<ExactIndex> {
        let key = FamilyKey {
            view,
            lane,
            direction,
            collation: locale.collation,
        };
        let found = self.exact.get(&key).cloned();
        self.record(found.is_some());
        found
    }

    pub fn insert_exact(
        &mut self,
        view: ViewKey,
        lane: Lane,
        direction: SearchDirection,
        locale: &Locale,
        index: ExactIndex,
    ) {
        if !self.is_enabled() {
            return;
        }
        let key = FamilyKey {
            view,
            lane,
            direction,
            collation: locale.collation,
        };
        if self.len() >= self.entries_cap && !self.exact.contains_key(&key) {
            self.evict_one();
        }
        self.exact.insert(key, index);
    }

    pub fn get_wildcard(
        &mut self,
        view: ViewKey,
        lane: Lane,
        direction: SearchDirection,
        locale: &Locale,
        pattern: &str,
    ) -> Option<Option<usize>> {
        let key = FamilyKey {
            view,
            lane,
            direction,
            collation: locale.collation,
        };
        let found = self.wildcard.get(&(key, pattern.to_string())).copied();
        self.record(found.is_some());
        found
    }

    pub fn insert_wildcard(
        &mut self,
        view: ViewKey,
        lane: Lane,
        direction: SearchDirection,
        locale: &Locale,
        pattern: &str,
        result: Option<usize>,
    ) {
        if !self.is_enabled() {
            return;
        }
        let key = (
            FamilyKey {
                view,
                lane,
                direction,
                collation: locale.collation,
            },
            pattern.to_string(),
        );
        if self.len() >= self.entries_cap && !self.wildcard.contains_key(&key) {
            self.evict_one();
        }
        self.wildcard.insert(key, result);
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
    }

    // Capacity is a soft bound; evict an arbitrary entry, wildcard results first.
    fn evict_one(&mut self) {
        if let Some(k) = self.wildcard.keys().next().cloned() {
            self.wildcard.remove(&k);
        } else if let Some(k) = self.exact.keys().next().copied() {
            self.exact.remove(&k);
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(crate::engine::EvalConfig::default().search_cache_entries)
    }
}
