//! Keep stored zones valid across row/column insertion and deletion.
//!
//! Insert policy: a bound `b` moves by `count` iff `b >= before`, for both the
//! start and the end bound. Inserting right before a zone therefore moves the
//! whole zone, and inserting right before its last line grows it.

use rangecalc_common::{CellError, UnboundedZone, Zone};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Columns,
    Rows,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralEdit {
    Insert { axis: Axis, before: u32, count: u32 },
    /// Deleted indices, in any order; duplicates are ignored.
    Delete { axis: Axis, indices: Vec<u32> },
}

impl StructuralEdit {
    /// Delete `count` consecutive lines starting at `start`.
    pub fn delete_range(axis: Axis, start: u32, count: u32) -> Self {
        StructuralEdit::Delete {
            axis,
            indices: (start..start.saturating_add(count)).collect(),
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            StructuralEdit::Insert { axis, .. } | StructuralEdit::Delete { axis, .. } => *axis,
        }
    }
}

/// Row/column shifts as issued by sheet editing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRows { before: u32, count: u32 },
    DeleteRows { start: u32, count: u32 },
    InsertColumns { before: u32, count: u32 },
    DeleteColumns { start: u32, count: u32 },
}

impl From<ShiftOperation> for StructuralEdit {
    fn from(op: ShiftOperation) -> Self {
        match op {
            ShiftOperation::InsertRows { before, count } => StructuralEdit::Insert {
                axis: Axis::Rows,
                before,
                count,
            },
            ShiftOperation::InsertColumns { before, count } => StructuralEdit::Insert {
                axis: Axis::Columns,
                before,
                count,
            },
            ShiftOperation::DeleteRows { start, count } => {
                StructuralEdit::delete_range(Axis::Rows, start, count)
            }
            ShiftOperation::DeleteColumns { start, count } => {
                StructuralEdit::delete_range(Axis::Columns, start, count)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ZoneAdjustment {
    Zone(Zone),
    /// Every line of the zone on the edited axis was deleted.
    Destroyed,
}

impl ZoneAdjustment {
    pub fn zone(self) -> Option<Zone> {
        match self {
            ZoneAdjustment::Zone(z) => Some(z),
            ZoneAdjustment::Destroyed => None,
        }
    }

    /// A destroyed zone becomes `#REF!`.
    pub fn into_result(self) -> Result<Zone, CellError> {
        self.zone().ok_or_else(|| {
            CellError::new_ref().with_message("Referenced cells were deleted")
        })
    }
}

/// Adjust one axis. `end == None` is an open bound. Returns `None` when the
/// whole span is deleted.
fn adapt_span(start: u32, end: Option<u32>, edit: &StructuralEdit) -> Option<(u32, Option<u32>)> {
    match edit {
        StructuralEdit::Insert { before, count, .. } => {
            let shift = |b: u32| if b >= *before { b.saturating_add(*count) } else { b };
            Some((shift(start), end.map(shift)))
        }
        StructuralEdit::Delete { indices, .. } => {
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            sorted.dedup();
            let before = sorted.partition_point(|&i| i < start) as u32;
            match end {
                Some(end) => {
                    let up_to_end = sorted.partition_point(|&i| i <= end) as u32;
                    let inside = up_to_end - before;
                    if inside == end - start + 1 {
                        return None;
                    }
                    Some((start - before, Some(end - before - inside)))
                }
                None => Some((start - before, None)),
            }
        }
    }
}

/// Adapt a zone to a structural edit. Pure and total.
pub fn adapt_zone(zone: Zone, edit: &StructuralEdit) -> ZoneAdjustment {
    let adjusted = match edit.axis() {
        Axis::Columns => adapt_span(zone.left, Some(zone.right), edit).map(|(l, r)| Zone {
            left: l,
            right: r.unwrap_or(l),
            ..zone
        }),
        Axis::Rows => adapt_span(zone.top, Some(zone.bottom), edit).map(|(t, b)| Zone {
            top: t,
            bottom: b.unwrap_or(t),
            ..zone
        }),
    };
    match adjusted {
        Some(z) => ZoneAdjustment::Zone(z),
        None => ZoneAdjustment::Destroyed,
    }
}

/// Same as [`adapt_zone`] for zones with open right/bottom bounds, which stay
/// open. `None` means destroyed.
pub fn adapt_unbounded_zone(zone: UnboundedZone, edit: &StructuralEdit) -> Option<UnboundedZone> {
    match edit.axis() {
        Axis::Columns => adapt_span(zone.left, zone.right, edit).map(|(left, right)| UnboundedZone {
            left,
            right,
            ..zone
        }),
        Axis::Rows => adapt_span(zone.top, zone.bottom, edit).map(|(top, bottom)| UnboundedZone {
            top,
            bottom,
            ..zone
        }),
    }
}

/// A sequence of edits applied in order.
#[derive(Clone, Debug, Default)]
pub struct ZoneAdjuster {
    edits: Vec<StructuralEdit>,
}

impl ZoneAdjuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: impl Into<StructuralEdit>) -> &mut Self {
        self.edits.push(edit.into());
        self
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn apply(&self, zone: Zone) -> ZoneAdjustment {
        let mut current = zone;
        for edit in &self.edits {
            match adapt_zone(current, edit) {
                ZoneAdjustment::Zone(z) => current = z,
                ZoneAdjustment::Destroyed => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%zone, ?edit, "zone destroyed by structural edit");
                    return ZoneAdjustment::Destroyed;
                }
            }
        }
        ZoneAdjustment::Zone(current)
    }

    /// Adapt many zones at once, in input order.
    pub fn apply_all(&self, zones: &[Zone]) -> Vec<ZoneAdjustment> {
        zones.iter().map(|&z| self.apply(z)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangecalc_common::CellErrorKind;

    fn z(l: u32, r: u32, t: u32, b: u32) -> Zone {
        Zone::new(l, r, t, b).unwrap()
    }

    fn insert_cols(before: u32, count: u32) -> StructuralEdit {
        StructuralEdit::Insert {
            axis: Axis::Columns,
            before,
            count,
        }
    }

    #[test]
    fn insert_shifts_bounds_at_or_after_point() {
        let zone = z(2, 4, 0, 9);
        assert_eq!(adapt_zone(zone, &insert_cols(0, 2)).zone(), Some(z(4, 6, 0, 9)));
        assert_eq!(adapt_zone(zone, &insert_cols(2, 1)).zone(), Some(z(3, 5, 0, 9)));
        assert_eq!(adapt_zone(zone, &insert_cols(3, 1)).zone(), Some(z(2, 5, 0, 9)));
        assert_eq!(adapt_zone(zone, &insert_cols(4, 1)).zone(), Some(z(2, 5, 0, 9)));
        assert_eq!(adapt_zone(zone, &insert_cols(5, 1)).zone(), Some(zone));
    }

    #[test]
    fn delete_shrinks_and_shifts() {
        let zone = z(0, 9, 3, 6);
        let rows = |idx: Vec<u32>| StructuralEdit::Delete {
            axis: Axis::Rows,
            indices: idx,
        };
        assert_eq!(adapt_zone(zone, &rows(vec![0, 1])).zone(), Some(z(0, 9, 1, 4)));
        assert_eq!(adapt_zone(zone, &rows(vec![4])).zone(), Some(z(0, 9, 3, 5)));
        assert_eq!(adapt_zone(zone, &rows(vec![6, 3, 3])).zone(), Some(z(0, 9, 3, 4)));
        assert_eq!(adapt_zone(zone, &rows(vec![1, 5, 8])).zone(), Some(z(0, 9, 2, 4)));
        assert_eq!(adapt_zone(zone, &rows(vec![10])).zone(), Some(zone));
        assert_eq!(adapt_zone(zone, &rows(vec![3, 4, 5, 6])), ZoneAdjustment::Destroyed);
    }

    #[test]
    fn destroyed_zone_is_a_ref_error() {
        let r = adapt_zone(Zone::cell(1, 1), &StructuralEdit::delete_range(Axis::Columns, 1, 1));
        assert_eq!(r.into_result().unwrap_err().kind, CellErrorKind::Ref);
    }

    #[test]
    fn unbounded_bounds_stay_open() {
        let full_col = UnboundedZone {
            left: 3,
            right: Some(3),
            top: 0,
            bottom: None,
        };
        let ins = StructuralEdit::Insert {
            axis: Axis::Rows,
            before: 0,
            count: 5,
        };
        let out = adapt_unbounded_zone(full_col, &ins).unwrap();
        assert_eq!(out.top, 5);
        assert_eq!(out.bottom, None);
        let del = StructuralEdit::delete_range(Axis::Columns, 3, 1);
        assert_eq!(adapt_unbounded_zone(full_col, &del), None);
    }

    #[test]
    fn batch_and_shift_operations() {
        let mut adj = ZoneAdjuster::new();
        adj.push(ShiftOperation::InsertRows { before: 0, count: 2 })
            .push(ShiftOperation::DeleteColumns { start: 0, count: 1 });
        assert_eq!(adj.apply(z(1, 2, 1, 1)).zone(), Some(z(0, 1, 3, 3)));
        assert_eq!(adj.apply(Zone::cell(0, 0)), ZoneAdjustment::Destroyed);
        let all = adj.apply_all(&[Zone::cell(5, 5), Zone::cell(0, 5)]);
        assert_eq!(all, vec![ZoneAdjustment::Zone(Zone::cell(4, 7)), ZoneAdjustment::Destroyed]);
    }
}
