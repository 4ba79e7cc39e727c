//! crates/rangecalc-eval/src/test_workbook.rs
//! ------------------------------------------
//! Lightweight in-memory workbook for unit/prop tests. Every accessor read and
//! dependency touch is logged so tests can check what a computation pulled.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rangecalc_common::{CellError, CellValue, SheetId, Zone};

use crate::engine::EvaluationPass;
use crate::engine::range_view::{Grid, RangeView};
use crate::traits::{ArgValue, CalcValue, EvaluationContext, RangeAccessor};

type CellKey = (u32, u32); // 0-based (col, row)

/// One logged interaction with the workbook, in absolute sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read { sheet: SheetId, zone: Zone },
    Touch { sheet: SheetId, zone: Zone },
}

#[derive(Default, Clone)]
struct Sheet {
    cells: HashMap<CellKey, CellValue>,
}

#[derive(Default)]
pub struct TestWorkbook {
    sheets: HashMap<SheetId, Sheet>,
    log: RefCell<Vec<Access>>,
}

impl TestWorkbook {
    /* ─────────────── constructors ─────────────── */
    pub fn new() -> Self {
        Self::default()
    }

    /* ─────────────── cell helpers ─────────────── */
    pub fn with_cell(mut self, sheet: SheetId, col: u32, row: u32, v: impl Into<CellValue>) -> Self {
        let sh = self.sheets.entry(sheet).or_default();
        sh.cells.insert((col, row), v.into());
        self
    }

    pub fn with_cell_a1(self, sheet: SheetId, a1: &str, v: impl Into<CellValue>) -> Self {
        let zone: Zone = a1.parse().expect("bad A1 ref in with_cell_a1");
        self.with_cell(sheet, zone.left, zone.top, v)
    }

    /// Row-major `data` with its top-left corner at `(col, row)`.
    pub fn with_range(mut self, sheet: SheetId, col: u32, row: u32, data: Vec<Vec<CellValue>>) -> Self {
        let sh = self.sheets.entry(sheet).or_default();
        for (dr, r) in data.into_iter().enumerate() {
            for (dc, v) in r.into_iter().enumerate() {
                sh.cells.insert((col + dc as u32, row + dr as u32), v);
            }
        }
        self
    }

    pub fn cell(&self, sheet: SheetId, col: u32, row: u32) -> CellValue {
        self.sheets
            .get(&sheet)
            .and_then(|s| s.cells.get(&(col, row)))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /* ─────────────── resolution ─────────────── */

    /// `resolve_range` for an A1 reference such as `"A1:C9"`.
    pub fn range(&self, sheet: SheetId, a1: &str) -> Result<RangeView<'_>, CellError> {
        let zone: Zone = a1
            .parse()
            .map_err(|e| CellError::new_ref().with_message(format!("{a1}: {e}")))?;
        self.resolve_range(zone, sheet)
    }

    /// Evaluate a registered function by name.
    pub fn call<'a>(&'a self, name: &str, args: &[ArgValue<'a>], pass: &mut EvaluationPass) -> CalcValue<'a> {
        crate::builtins::load_builtins();
        match crate::function_registry::get(name) {
            Some(f) => f.dispatch(args, pass),
            None => CalcValue::from(CellError::new_eval().with_message(format!("Unknown function {name}"))),
        }
    }

    /* ─────────────── access log ─────────────── */

    pub fn accesses(&self) -> Vec<Access> {
        self.log.borrow().clone()
    }

    /// Total number of cells read through accessors.
    pub fn cells_read(&self) -> u64 {
        self.log
            .borrow()
            .iter()
            .map(|a| match a {
                Access::Read { zone, .. } => zone.size(),
                Access::Touch { .. } => 0,
            })
            .sum()
    }

    /// How many times cell `(col, row)` was read.
    pub fn reads_of(&self, sheet: SheetId, col: u32, row: u32) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|a| matches!(a, Access::Read { sheet: s, zone } if *s == sheet && zone.contains(col, row)))
            .count()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl EvaluationContext for TestWorkbook {
    fn resolve_range(&self, zone: Zone, sheet: SheetId) -> Result<RangeView<'_>, CellError> {
        if !self.sheets.contains_key(&sheet) {
            return Err(CellError::new_ref().with_message(format!("Unknown sheet {sheet}")));
        }
        let accessor = SheetAccessor {
            book: self,
            sheet,
            origin: zone,
        };
        Ok(RangeView::from_sheet(Rc::new(accessor), sheet, zone))
    }
}

struct SheetAccessor<'w> {
    book: &'w TestWorkbook,
    sheet: SheetId,
    origin: Zone,
}

impl SheetAccessor<'_> {
    fn absolute(&self, zone: Zone) -> Zone {
        Zone {
            left: self.origin.left + zone.left,
            right: self.origin.left + zone.right,
            top: self.origin.top + zone.top,
            bottom: self.origin.top + zone.bottom,
        }
    }
}

impl RangeAccessor for SheetAccessor<'_> {
    fn read(&self, zone: Zone) -> Grid<CellValue> {
        let abs = self.absolute(zone);
        self.book.log.borrow_mut().push(Access::Read {
            sheet: self.sheet,
            zone: abs,
        });
        (abs.top..=abs.bottom)
            .map(|r| (abs.left..=abs.right).map(|c| self.book.cell(self.sheet, c, r)).collect())
            .collect()
    }

    fn touch(&self, zone: Zone) {
        self.book.log.borrow_mut().push(Access::Touch {
            sheet: self.sheet,
            zone: self.absolute(zone),
        });
    }
}
