//! Axis-aligned rectangles of cells.
//!
//! A [`Zone`] is inclusive on all four bounds and 0-based. Zones are plain
//! `Copy` values; every operation returns a new zone.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("zone is inverted: left {left} > right {right}")]
    InvertedColumns { left: u32, right: u32 },
    #[error("zone is inverted: top {top} > bottom {bottom}")]
    InvertedRows { top: u32, bottom: u32 },
    #[error("zone must have at least one row and one column")]
    Empty,
    #[error("zone translated outside the grid")]
    OutOfGrid,
    #[error("not an A1 reference")]
    Malformed,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Zone {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Zone {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Result<Self, ZoneError> {
        if left > right {
            return Err(ZoneError::InvertedColumns { left, right });
        }
        if top > bottom {
            return Err(ZoneError::InvertedRows { top, bottom });
        }
        Ok(Self {
            left,
            right,
            top,
            bottom,
        })
    }

    /// Zone covering one cell.
    pub const fn cell(col: u32, row: u32) -> Self {
        Self {
            left: col,
            right: col,
            top: row,
            bottom: row,
        }
    }

    /// Zone `[0, width) × [0, height)`. Both dimensions must be non-zero.
    pub fn sized(width: u32, height: u32) -> Result<Self, ZoneError> {
        if width == 0 || height == 0 {
            return Err(ZoneError::Empty);
        }
        Self::new(0, width - 1, 0, height - 1)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    pub fn size(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_single_cell(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.left..=self.right).contains(&col) && (self.top..=self.bottom).contains(&row)
    }

    pub fn contains_zone(&self, other: &Zone) -> bool {
        self.left <= other.left
            && self.right >= other.right
            && self.top <= other.top
            && self.bottom >= other.bottom
    }

    pub fn overlaps(&self, other: &Zone) -> bool {
        self.intersection(other).is_some()
    }

    /// Common part of two zones, or `None` when they do not touch.
    pub fn intersection(&self, other: &Zone) -> Option<Zone> {
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        let top = self.top.max(other.top);
        let bottom = self.bottom.min(other.bottom);
        if left > right || top > bottom {
            return None;
        }
        Some(Zone {
            left,
            right,
            top,
            bottom,
        })
    }

    /// Smallest zone containing both.
    pub fn union(&self, other: &Zone) -> Zone {
        Zone {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Move the zone by signed offsets. Fails when any bound would go negative.
    pub fn translate(&self, d_col: i64, d_row: i64) -> Result<Zone, ZoneError> {
        let shift = |v: u32, d: i64| -> Result<u32, ZoneError> {
            u32::try_from(v as i64 + d).map_err(|_| ZoneError::OutOfGrid)
        };
        Ok(Zone {
            left: shift(self.left, d_col)?,
            right: shift(self.right, d_col)?,
            top: shift(self.top, d_row)?,
            bottom: shift(self.bottom, d_row)?,
        })
    }

    /// Same zone with columns and rows exchanged.
    pub fn transposed(&self) -> Zone {
        Zone {
            left: self.top,
            right: self.bottom,
            top: self.left,
            bottom: self.right,
        }
    }

    /// Row-major iteration over `(col, row)` pairs.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.top..=self.bottom).flat_map(move |r| (self.left..=self.right).map(move |c| (c, r)))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.left), self.top + 1)?;
        if !self.is_single_cell() {
            write!(f, ":{}{}", column_name(self.right), self.bottom + 1)?;
        }
        Ok(())
    }
}

fn parse_cell(s: &str) -> Result<(u32, u32), ZoneError> {
    let split = s
        .find(|c: char| c.is_ascii_digit())
        .ok_or(ZoneError::Malformed)?;
    let (letters, digits) = s.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ZoneError::Malformed);
    }
    let col = letters.chars().try_fold(0u32, |acc, c| {
        let d = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26).and_then(|a| a.checked_add(d))
    });
    let row: u32 = digits.parse().map_err(|_| ZoneError::Malformed)?;
    match (col, row) {
        (Some(c), r) if r > 0 => Ok((c - 1, r - 1)),
        _ => Err(ZoneError::Malformed),
    }
}

/// Parses `"B2"` or `"A1:C3"`; corners may be given in any order.
impl FromStr for Zone {
    type Err = ZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (a, b) = s.split_once(':').unwrap_or((s, s));
        let (c1, r1) = parse_cell(a)?;
        let (c2, r2) = parse_cell(b)?;
        Zone::new(c1.min(c2), c1.max(c2), r1.min(r2), r1.max(r2))
    }
}

/// Spreadsheet column letters for a 0-based index (`0 -> A`, `26 -> AA`).
pub fn column_name(col: u32) -> String {
    let mut n = col as u64 + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Zone whose `right` and/or `bottom` may be open (full columns `A:A`,
/// full rows `1:1`). Must be resolved with [`UnboundedZone::bounded`] before
/// a view can be built over it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnboundedZone {
    pub left: u32,
    pub right: Option<u32>,
    pub top: u32,
    pub bottom: Option<u32>,
}

impl UnboundedZone {
    pub fn is_full_col(&self) -> bool {
        self.bottom.is_none()
    }

    /// Clamp open bounds to the sheet extent (`cols` × `rows` cells).
    pub fn bounded(&self, cols: u32, rows: u32) -> Result<Zone, ZoneError> {
        let right = self.right.unwrap_or(cols.saturating_sub(1));
        let bottom = self.bottom.unwrap_or(rows.saturating_sub(1));
        Zone::new(self.left, right, self.top, bottom)
    }
}

impl From<Zone> for UnboundedZone {
    fn from(z: Zone) -> Self {
        UnboundedZone {
            left: z.left,
            right: Some(z.right),
            top: z.top,
            bottom: Some(z.bottom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inverted_bounds() {
        assert_eq!(
            Zone::new(3, 1, 0, 0),
            Err(ZoneError::InvertedColumns { left: 3, right: 1 })
        );
        assert!(Zone::new(0, 0, 5, 4).is_err());
        assert!(Zone::new(1, 1, 4, 4).unwrap().is_single_cell());
    }

    #[test]
    fn intersection_and_union() {
        let a = Zone::new(0, 3, 0, 3).unwrap();
        let b = Zone::new(2, 5, 1, 8).unwrap();
        assert_eq!(a.intersection(&b), Some(Zone::new(2, 3, 1, 3).unwrap()));
        assert_eq!(a.union(&b), Zone::new(0, 5, 0, 8).unwrap());
        let far = Zone::cell(10, 10);
        assert_eq!(a.intersection(&far), None);
        assert!(!a.overlaps(&far));
    }

    #[test]
    fn translate_stays_on_grid() {
        let z = Zone::new(1, 2, 1, 2).unwrap();
        assert_eq!(z.translate(2, -1).unwrap(), Zone::new(3, 4, 0, 1).unwrap());
        assert_eq!(z.translate(-2, 0), Err(ZoneError::OutOfGrid));
    }

    #[test]
    fn display_uses_a1_notation() {
        assert_eq!(Zone::new(0, 1, 0, 2).unwrap().to_string(), "A1:B3");
        assert_eq!(Zone::cell(27, 9).to_string(), "AB10");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(701), "ZZ");
    }

    #[test]
    fn parses_a1_references() {
        assert_eq!("A1:B3".parse::<Zone>(), Zone::new(0, 1, 0, 2));
        assert_eq!("b3:a1".parse::<Zone>(), Zone::new(0, 1, 0, 2));
        assert_eq!("AB10".parse::<Zone>(), Ok(Zone::cell(27, 9)));
        assert_eq!("A0".parse::<Zone>(), Err(ZoneError::Malformed));
        assert_eq!("12".parse::<Zone>(), Err(ZoneError::Malformed));
        assert_eq!("A1B".parse::<Zone>(), Err(ZoneError::Malformed));
    }

    #[test]
    fn unbounded_resolves_against_sheet() {
        let full_col = UnboundedZone {
            left: 2,
            right: Some(2),
            top: 0,
            bottom: None,
        };
        assert!(full_col.is_full_col());
        assert_eq!(
            full_col.bounded(26, 100).unwrap(),
            Zone::new(2, 2, 0, 99).unwrap()
        );
    }

    #[test]
    fn cells_iterate_row_major() {
        let z = Zone::new(0, 1, 0, 1).unwrap();
        let cells: Vec<_> = z.cells().collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }
}
