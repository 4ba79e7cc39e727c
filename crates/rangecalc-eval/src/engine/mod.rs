//! Evaluation-pass plumbing: configuration, per-pass caches and the view layer.

pub mod cache;
pub mod range_view;
pub mod scalar_pool;
pub mod zone_adjuster;

pub use cache::{CacheStats, SearchCache};
pub use range_view::{Grid, RangeView, TraversalOrder, ViewError, ViewKey};
pub use scalar_pool::ScalarPool;
pub use zone_adjuster::{
    Axis, ShiftOperation, StructuralEdit, ZoneAdjuster, ZoneAdjustment, adapt_unbounded_zone,
    adapt_zone,
};

use crate::locale::Locale;

/// Limits for iterative root finding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub epsilon: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon: 1e-10,
        }
    }
}

/// Configuration for an evaluation pass
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub locale: Locale,
    /// Soft cap on memoized search entries; 0 disables memoization.
    pub search_cache_entries: usize,
    /// Distinct scalar values interned as 1×1 views per pass.
    pub scalar_pool_entries: usize,
    pub solver: SolverConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            locale: Locale::invariant(),
            search_cache_entries: 512,
            scalar_pool_entries: 64,
            solver: SolverConfig::default(),
        }
    }
}

impl EvalConfig {
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_search_cache_entries(mut self, entries: usize) -> Self {
        self.search_cache_entries = entries;
        self
    }

    pub fn with_scalar_pool_entries(mut self, entries: usize) -> Self {
        self.scalar_pool_entries = entries;
        self
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// State owned by one evaluation pass. Call [`EvaluationPass::begin`] at the
/// start of every pass; nothing cached survives it.
pub struct EvaluationPass {
    config: EvalConfig,
    search_cache: SearchCache,
    scalars: ScalarPool,
    pass: u64,
}

impl EvaluationPass {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            search_cache: SearchCache::new(config.search_cache_entries),
            scalars: ScalarPool::new(config.scalar_pool_entries),
            config,
            pass: 0,
        }
    }

    pub fn begin(&mut self) {
        self.pass += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(pass = self.pass, "evaluation pass begins");
        self.search_cache.begin_pass();
        self.scalars.clear();
    }

    /// Number of passes begun so far.
    pub fn pass_number(&self) -> u64 {
        self.pass
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn locale(&self) -> &Locale {
        &self.config.locale
    }

    pub fn search_cache(&mut self) -> &mut SearchCache {
        &mut self.search_cache
    }

    pub fn scalars(&mut self) -> &mut ScalarPool {
        &mut self.scalars
    }

    /// Locale and search cache together, for calls that need both.
    pub fn search_parts(&mut self) -> (&Locale, &mut SearchCache) {
        (&self.config.locale, &mut self.search_cache)
    }
}

impl Default for EvaluationPass {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}
