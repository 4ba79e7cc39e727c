//! Interned 1×1 views for scalar arguments used where a range is expected.

use rangecalc_common::CellValue;
use rustc_hash::FxHashMap;

use crate::engine::range_view::RangeView;

/// Pass-owned pool of constant views, keyed by value. Once `capacity` distinct
/// values are held, further values get a fresh, uninterned view.
pub struct ScalarPool {
    views: FxHashMap<CellValue, RangeView<'static>>,
    capacity: usize,
}

impl ScalarPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            views: FxHashMap::default(),
            capacity,
        }
    }

    pub fn view<'a>(&mut self, value: &CellValue) -> RangeView<'a> {
        if let Some(v) = self.views.get(value) {
            return v.clone();
        }
        let v = RangeView::scalar(value.clone());
        if self.views.len() < self.capacity {
            self.views.insert(value.clone(), v.clone());
        }
        v
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_share_a_view() {
        let mut pool = ScalarPool::new(4);
        let a = pool.view(&CellValue::Number(0.0));
        let b = pool.view(&CellValue::Number(-0.0));
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), pool.view(&CellValue::from("0")).key());
        assert_eq!(pool.len(), 2);
        assert_eq!(b.broadcast(3, 3).unwrap().get(2, 2), CellValue::Number(0.0));
    }

    #[test]
    fn capacity_bounds_interning() {
        let mut pool = ScalarPool::new(1);
        pool.view(&CellValue::Boolean(true));
        let x = pool.view(&CellValue::Boolean(false));
        let y = pool.view(&CellValue::Boolean(false));
        assert_ne!(x.key(), y.key());
        assert_eq!(pool.len(), 1);
        pool.clear();
        assert!(pool.is_empty());
    }
}
