//! Lazy 2D views over cell values.
//!
//! A [`RangeView`] is a shared source plus a [`Placement`] (origin, size and a
//! transposed flag). Slicing and transposing only compose the placement; cell
//! values are pulled from the source when a terminal operation (`get`,
//! `get_zone`, `flatten`, `reduce`, `map`, ...) needs them.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use rangecalc_common::{CellValue, SheetId, Zone};

use crate::traits::RangeAccessor;

/// Row-major grid: `grid[row][col]`.
pub type Grid<T> = Vec<Vec<T>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("cell (col {col}, row {row}) is outside a {width}x{height} view")]
    OutOfBounds {
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    },
    #[error("zone {zone} is outside a {width}x{height} view")]
    ZoneOutOfBounds {
        zone: Zone,
        width: usize,
        height: usize,
    },
    #[error("accessor returned {got_width}x{got_height} values for a {width}x{height} read")]
    ShapeMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum TraversalOrder {
    #[default]
    RowMajor,
    ColMajor,
}

/// Identity of the data behind a view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Sheet { sheet: SheetId, zone: Zone },
    Anonymous(u64),
}

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(1);

fn anonymous_key() -> SourceKey {
    SourceKey::Anonymous(NEXT_ANONYMOUS.fetch_add(1, AtomicOrdering::Relaxed))
}

/// Window of a view inside its source. `col`/`row` are source coordinates,
/// `width`/`height` are the view's own dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub col: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
    pub transposed: bool,
}

impl Placement {
    fn whole(width: usize, height: usize) -> Self {
        Placement {
            col: 0,
            row: 0,
            width,
            height,
            transposed: false,
        }
    }

    /// Source zone covered by a view-relative zone.
    fn source_zone(&self, z: Zone) -> Zone {
        let (c0, r0) = (self.col as u32, self.row as u32);
        if self.transposed {
            Zone {
                left: z.top + c0,
                right: z.bottom + c0,
                top: z.left + r0,
                bottom: z.right + r0,
            }
        } else {
            Zone {
                left: z.left + c0,
                right: z.right + c0,
                top: z.top + r0,
                bottom: z.bottom + r0,
            }
        }
    }
}

/// Cache identity of a view: same key means same cells in the same layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub source: SourceKey,
    pub placement: Placement,
}

enum Source<'a> {
    Accessor(Rc<dyn RangeAccessor + 'a>),
    Values(Grid<CellValue>),
    /// One value repeated over any window.
    Constant(CellValue),
    /// A 1×1 parent repeated over any window.
    Repeat(RangeView<'a>),
    /// Rows of `parent` in the given order.
    Rows {
        parent: RangeView<'a>,
        rows: Rc<[usize]>,
    },
}

struct Node<'a> {
    key: SourceKey,
    source: Source<'a>,
}

impl<'a> Node<'a> {
    fn read(&self, zone: Zone) -> Result<Grid<CellValue>, ViewError> {
        let (w, h) = (zone.width() as usize, zone.height() as usize);
        match &self.source {
            Source::Accessor(acc) => {
                let grid = acc.read(zone);
                let bad_row = grid.iter().find(|r| r.len() != w);
                if grid.len() != h || bad_row.is_some() {
                    return Err(ViewError::ShapeMismatch {
                        width: w,
                        height: h,
                        got_width: bad_row.or(grid.first()).map_or(0, Vec::len),
                        got_height: grid.len(),
                    });
                }
                Ok(grid)
            }
            Source::Values(rows) => {
                let (l, r) = (zone.left as usize, zone.right as usize);
                Ok((zone.top..=zone.bottom)
                    .map(|row| rows[row as usize][l..=r].to_vec())
                    .collect())
            }
            Source::Constant(v) => Ok(vec![vec![v.clone(); w]; h]),
            Source::Repeat(parent) => {
                let v = parent.try_get(0, 0)?;
                Ok(vec![vec![v; w]; h])
            }
            Source::Rows { parent, rows } => {
                let wanted = &rows[zone.top as usize..=zone.bottom as usize];
                let mut out = Vec::with_capacity(h);
                // Coalesce runs of consecutive parent rows into one read.
                let mut i = 0;
                while i < wanted.len() {
                    let start = wanted[i];
                    let mut j = i + 1;
                    while j < wanted.len() && wanted[j] == wanted[j - 1] + 1 {
                        j += 1;
                    }
                    let run = Zone {
                        left: zone.left,
                        right: zone.right,
                        top: start as u32,
                        bottom: (start + (j - i) - 1) as u32,
                    };
                    out.extend(parent.try_get_zone(run)?);
                    i = j;
                }
                Ok(out)
            }
        }
    }

    fn touch(&self, zone: Zone) {
        match &self.source {
            Source::Accessor(acc) => acc.touch(zone),
            Source::Repeat(parent) => parent.register_dependency(),
            Source::Rows { parent, rows } => {
                let sub = parent.slice_cols(zone.left as usize, Some(zone.right as usize + 1));
                for &r in &rows[zone.top as usize..=zone.bottom as usize] {
                    sub.get_row(r, None).register_dependency();
                }
            }
            Source::Values(_) | Source::Constant(_) => {}
        }
    }
}

/// Lazy, immutable window over cell values.
#[derive(Clone)]
pub struct RangeView<'a> {
    node: Rc<Node<'a>>,
    placement: Placement,
}

impl<'a> fmt::Debug for RangeView<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeView")
            .field("source", &self.node.key)
            .field("placement", &self.placement)
            .finish()
    }
}

impl<'a> RangeView<'a> {
    fn with_source(key: SourceKey, source: Source<'a>, width: usize, height: usize) -> Self {
        RangeView {
            node: Rc::new(Node { key, source }),
            placement: Placement::whole(width, height),
        }
    }

    /// View over `width × height` cells served by `accessor`.
    pub fn from_accessor(accessor: Rc<dyn RangeAccessor + 'a>, width: usize, height: usize) -> Self {
        Self::with_source(anonymous_key(), Source::Accessor(accessor), width, height)
    }

    /// View over a sheet zone. Views of the same `(sheet, zone)` share a cache identity.
    pub fn from_sheet(accessor: Rc<dyn RangeAccessor + 'a>, sheet: SheetId, zone: Zone) -> Self {
        Self::with_source(
            SourceKey::Sheet { sheet, zone },
            Source::Accessor(accessor),
            zone.width() as usize,
            zone.height() as usize,
        )
    }

    /// Owned row-major values. Short rows are padded with `Empty`.
    pub fn from_rows(mut rows: Grid<CellValue>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for r in rows.iter_mut() {
            r.resize(width, CellValue::Empty);
        }
        let height = if width == 0 { 0 } else { rows.len() };
        Self::with_source(anonymous_key(), Source::Values(rows), width, height)
    }

    /// A single column of owned values.
    pub fn from_column(values: Vec<CellValue>) -> Self {
        Self::from_rows(values.into_iter().map(|v| vec![v]).collect())
    }

    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// `value` repeated over `width × height` cells.
    pub fn constant(value: CellValue, width: usize, height: usize) -> Self {
        Self::with_source(anonymous_key(), Source::Constant(value), width, height)
    }

    pub fn scalar(value: CellValue) -> Self {
        Self::constant(value, 1, 1)
    }

    /* ───────────────────────── shape ───────────────────────── */

    #[inline]
    pub fn width(&self) -> usize {
        self.placement.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.placement.height
    }

    /// `(width, height)`
    pub fn dims(&self) -> (usize, usize) {
        (self.placement.width, self.placement.height)
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn key(&self) -> ViewKey {
        ViewKey {
            source: self.node.key,
            placement: self.placement,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn is_single_element(&self) -> bool {
        self.width() == 1 && self.height() == 1
    }

    pub fn is_single_col_or_row(&self) -> bool {
        !self.is_empty() && (self.width() == 1 || self.height() == 1)
    }

    /* ─────────────────────── transforms ─────────────────────── */

    fn reposition(&self, placement: Placement) -> Self {
        RangeView {
            node: Rc::clone(&self.node),
            placement,
        }
    }

    /// Columns `start..end` (end defaults to the width).
    pub fn slice_cols(&self, start: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(self.width());
        assert!(
            start <= end && end <= self.width(),
            "column slice {start}..{end} outside a view of width {}",
            self.width()
        );
        let mut p = self.placement;
        if p.transposed {
            p.row += start;
        } else {
            p.col += start;
        }
        p.width = end - start;
        self.reposition(p)
    }

    /// Rows `start..end` (end defaults to the height).
    pub fn slice_rows(&self, start: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(self.height());
        assert!(
            start <= end && end <= self.height(),
            "row slice {start}..{end} outside a view of height {}",
            self.height()
        );
        let mut p = self.placement;
        if p.transposed {
            p.col += start;
        } else {
            p.row += start;
        }
        p.height = end - start;
        self.reposition(p)
    }

    /// Row `i`, from column `start` to the end.
    pub fn get_row(&self, i: usize, start: Option<usize>) -> Self {
        self.slice_rows(i, Some(i + 1))
            .slice_cols(start.unwrap_or(0), None)
    }

    /// Column `i`, from row `start` to the end.
    pub fn get_col(&self, i: usize, start: Option<usize>) -> Self {
        self.slice_cols(i, Some(i + 1))
            .slice_rows(start.unwrap_or(0), None)
    }

    pub fn transpose(&self) -> Self {
        let mut p = self.placement;
        p.transposed = !p.transposed;
        std::mem::swap(&mut p.width, &mut p.height);
        self.reposition(p)
    }

    /// Stretch a 1×1 view to `width × height` without copying values.
    /// Returns `None` for any other shape.
    pub fn broadcast(&self, width: usize, height: usize) -> Option<Self> {
        if !self.is_single_element() {
            return None;
        }
        if let Source::Constant(_) = self.node.source {
            return Some(self.reposition(Placement::whole(width, height)));
        }
        Some(Self::with_source(
            anonymous_key(),
            Source::Repeat(self.clone()),
            width,
            height,
        ))
    }

    /// Rows of this view in the order given by `indices` (repeats allowed).
    pub fn select_rows(&self, indices: impl Into<Rc<[usize]>>) -> Self {
        let rows: Rc<[usize]> = indices.into();
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.height()) {
            panic!(
                "row {bad} selected from a view of height {}",
                self.height()
            );
        }
        let height = if self.width() == 0 { 0 } else { rows.len() };
        Self::with_source(
            anonymous_key(),
            Source::Rows {
                parent: self.clone(),
                rows,
            },
            self.width(),
            height,
        )
    }

    /* ─────────────────────── terminal ops ─────────────────────── */

    fn check_zone(&self, zone: Zone) -> Result<(), ViewError> {
        if (zone.right as usize) < self.width() && (zone.bottom as usize) < self.height() {
            Ok(())
        } else {
            Err(ViewError::ZoneOutOfBounds {
                zone,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    pub fn try_get_zone(&self, zone: Zone) -> Result<Grid<CellValue>, ViewError> {
        self.check_zone(zone)?;
        let p = self.placement;
        let grid = self.node.read(p.source_zone(zone))?;
        Ok(if p.transposed {
            transpose_grid(grid)
        } else {
            grid
        })
    }

    /// Values of a view-relative zone. Panics when the zone leaves the view.
    pub fn get_zone(&self, zone: Zone) -> Grid<CellValue> {
        self.try_get_zone(zone).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_get(&self, col: usize, row: usize) -> Result<CellValue, ViewError> {
        if col >= self.width() || row >= self.height() {
            return Err(ViewError::OutOfBounds {
                col,
                row,
                width: self.width(),
                height: self.height(),
            });
        }
        let mut grid = self.try_get_zone(Zone::cell(col as u32, row as u32))?;
        Ok(grid
            .pop()
            .and_then(|mut r| r.pop())
            .unwrap_or(CellValue::Empty))
    }

    /// Value at `(col, row)`. Panics outside the view.
    pub fn get(&self, col: usize, row: usize) -> CellValue {
        self.try_get(col, row).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Every value, row-major.
    pub fn get_all(&self) -> Grid<CellValue> {
        if self.height() == 0 {
            return Vec::new();
        }
        if self.width() == 0 {
            return vec![Vec::new(); self.height()];
        }
        let all = Zone {
            left: 0,
            right: self.width() as u32 - 1,
            top: 0,
            bottom: self.height() as u32 - 1,
        };
        self.get_zone(all)
    }

    /// Values of the part of `zone` that overlaps the view; empty when disjoint.
    pub fn get_intersection(&self, zone: Zone) -> Grid<CellValue> {
        if self.is_empty() {
            return Vec::new();
        }
        let own = Zone {
            left: 0,
            right: self.width() as u32 - 1,
            top: 0,
            bottom: self.height() as u32 - 1,
        };
        match own.intersection(&zone) {
            Some(z) => self.get_zone(z),
            None => Vec::new(),
        }
    }

    pub fn flatten(&self, order: TraversalOrder) -> Vec<CellValue> {
        self.flatten_with(order, |v, _, _| v)
    }

    /// Flatten with a mapping applied to `(value, col, row)`.
    pub fn flatten_with<T>(
        &self,
        order: TraversalOrder,
        mut f: impl FnMut(CellValue, usize, usize) -> T,
    ) -> Vec<T> {
        let grid = self.get_all();
        let mut out = Vec::with_capacity(self.width() * self.height());
        match order {
            TraversalOrder::RowMajor => {
                for (r, row) in grid.into_iter().enumerate() {
                    for (c, v) in row.into_iter().enumerate() {
                        out.push(f(v, c, r));
                    }
                }
            }
            TraversalOrder::ColMajor => {
                let mut cols = transpose_grid(grid);
                for (c, col) in cols.drain(..).enumerate() {
                    for (r, v) in col.into_iter().enumerate() {
                        out.push(f(v, c, r));
                    }
                }
            }
        }
        out
    }

    pub fn reduce<T>(
        &self,
        order: TraversalOrder,
        mut f: impl FnMut(T, &CellValue) -> T,
        init: T,
    ) -> T {
        let mut acc = init;
        for v in self.flatten(order).iter() {
            acc = f(acc, v);
        }
        acc
    }

    /// Map every value, keeping the shape.
    pub fn map<T>(&self, mut f: impl FnMut(&CellValue) -> T) -> Grid<T> {
        self.get_all()
            .iter()
            .map(|row| row.iter().map(&mut f).collect())
            .collect()
    }

    /// Visit `(value, col, row)` in row-major order.
    pub fn visit(&self, mut f: impl FnMut(&CellValue, usize, usize)) {
        for (r, row) in self.get_all().iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                f(v, c, r);
            }
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(&CellValue)) -> &Self {
        self.visit(|v, _, _| f(v));
        self
    }

    /// Declare every cell of the view as a dependency without reading it.
    pub fn register_dependency(&self) {
        if self.is_empty() {
            return;
        }
        let all = Zone {
            left: 0,
            right: self.width() as u32 - 1,
            top: 0,
            bottom: self.height() as u32 - 1,
        };
        self.node.touch(self.placement.source_zone(all));
    }
}

pub fn transpose_grid<T>(grid: Grid<T>) -> Grid<T> {
    let width = grid.first().map_or(0, Vec::len);
    let mut out: Grid<T> = (0..width).map(|_| Vec::with_capacity(grid.len())).collect();
    for row in grid {
        for (c, v) in row.into_iter().enumerate() {
            out[c].push(v);
        }
    }
    out
}
