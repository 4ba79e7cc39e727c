use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::{CellError, CellErrorKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a sheet inside the external document model.
pub type SheetId = u16;

/// A single evaluated cell value.
///
/// Equality and hashing are *structural*: numbers compare by value (`-0 == 0`),
/// text is case-sensitive and errors compare by kind and message. Spreadsheet
/// comparison semantics (case folding, cross-type ordering) live in the
/// evaluation crate, never in these trait impls.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,
    Error(CellError),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Error(a), CellValue::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            CellValue::Number(n) => {
                state.write_u8(0);
                // -0.0 == 0.0 and every NaN equals every other NaN
                let n = if *n == 0.0 {
                    0.0
                } else if n.is_nan() {
                    f64::NAN
                } else {
                    *n
                };
                n.to_bits().hash(state);
            }
            CellValue::Text(s) => {
                state.write_u8(1);
                s.hash(state);
            }
            CellValue::Boolean(b) => {
                state.write_u8(2);
                b.hash(state);
            }
            CellValue::Empty => state.write_u8(3),
            CellValue::Error(e) => {
                state.write_u8(4);
                e.hash(state);
            }
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Ok(()),
            CellValue::Error(e) => write!(f, "{}", e.kind),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<CellErrorKind> {
        match self {
            CellValue::Error(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Short tag name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Empty => "empty",
            CellValue::Error(_) => "error",
        }
    }
}

/// Absolute 0-based cell position in the external document.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CellPosition {
    pub sheet: SheetId,
    pub col: u32,
    pub row: u32,
}

impl CellPosition {
    pub fn new(sheet: SheetId, col: u32, row: u32) -> Self {
        Self { sheet, col, row }
    }
}

/// What a function hands back to the evaluator for a single cell.
///
/// `format` is an opaque number-format hint (`"0%"` for rates), `position`
/// names the cell the value was read from when a function returns a reference
/// to an existing cell (lookups), and `message` is a user-facing explanation,
/// mostly set for error results.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub value: CellValue,
    pub format: Option<String>,
    pub position: Option<CellPosition>,
    pub message: Option<String>,
}

impl FunctionResult {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            format: None,
            position: None,
            message: None,
        }
    }

    pub fn error(kind: CellErrorKind, message: impl Into<String>) -> Self {
        CellError::new(kind).with_message(message).into()
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_position(mut self, position: CellPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_error(&self) -> bool {
        self.value.is_error()
    }
}

impl From<CellValue> for FunctionResult {
    fn from(value: CellValue) -> Self {
        FunctionResult::new(value)
    }
}

impl From<CellError> for FunctionResult {
    fn from(error: CellError) -> Self {
        let message = error.message.clone();
        FunctionResult {
            value: CellValue::Error(error),
            format: None,
            position: None,
            message,
        }
    }
}
