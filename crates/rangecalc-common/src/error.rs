//! Spreadsheet error values.
//!
//! - **`CellErrorKind`**: the error codes a formula can evaluate to
//! - **`ErrorContext`**: optional structural detail (which argument, which bound)
//! - **`CellError`**: kind + message + context, carried inside `CellValue::Error`
//!
//! These are *values*, not faults: a failed lookup or a diverging solver produces
//! a `CellError` that flows through the formula like any other result. Calling-code
//! defects (out-of-bounds reads on a view, malformed zones) are reported with the
//! `thiserror` enums in the modules that detect them.

use std::{error::Error, fmt};

use crate::CellValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised error codes.
///
/// **Note:** names are CamelCase while `Display` renders the
/// spreadsheet code (`#DIV/0!`, `#N/A`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellErrorKind {
    /// Reference invalidated by a structural edit or out of the sheet.
    Ref,
    /// No match found by a lookup.
    Na,
    Div,
    /// Generic evaluation failure: dimension mismatch, bad argument
    /// combination, solver without result.
    Error,
    Value,
    Num,
}

impl fmt::Display for CellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl CellErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ref => "#REF!",
            Self::Na => "#N/A",
            Self::Div => "#DIV/0!",
            Self::Error => "#ERROR!",
            Self::Value => "#VALUE!",
            Self::Num => "#NUM!",
        }
    }

    /// Parse a displayed error code. Unknown codes yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "#REF!" => Some(Self::Ref),
            "#N/A" => Some(Self::Na),
            "#DIV/0!" => Some(Self::Div),
            "#ERROR!" => Some(Self::Error),
            "#VALUE!" => Some(Self::Value),
            "#NUM!" => Some(Self::Num),
            _ => None,
        }
    }
}

/// Structural detail attached to an error. Kept sheet-agnostic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    /// 0-based index of the offending function argument.
    pub argument: Option<usize>,
    pub row: Option<u32>,
    pub col: Option<u32>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellError {
    pub kind: CellErrorKind,
    pub message: Option<String>,
    pub context: Option<ErrorContext>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<CellErrorKind> for CellError {
    fn from(kind: CellErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl CellError {
    pub fn new(kind: CellErrorKind) -> Self {
        kind.into()
    }

    pub fn new_ref() -> Self {
        Self::new(CellErrorKind::Ref)
    }

    pub fn new_na() -> Self {
        Self::new(CellErrorKind::Na)
    }

    pub fn new_div() -> Self {
        Self::new(CellErrorKind::Div)
    }

    pub fn new_value() -> Self {
        Self::new(CellErrorKind::Value)
    }

    pub fn new_num() -> Self {
        Self::new(CellErrorKind::Num)
    }

    /// Generic evaluation error (`#ERROR!`).
    pub fn new_eval() -> Self {
        Self::new(CellErrorKind::Error)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Record which argument caused the error.
    pub fn with_argument(mut self, index: usize) -> Self {
        self.context.get_or_insert_with(ErrorContext::default).argument = Some(index);
        self
    }

    /// Attach a 0-based cell location.
    pub fn with_location(mut self, col: u32, row: u32) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.col = Some(col);
        ctx.row = Some(row);
        self
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }

        if let Some(ref ctx) = self.context {
            if let Some(arg) = ctx.argument {
                write!(f, " (argument {})", arg + 1)?;
            }
            if let (Some(c), Some(r)) = (ctx.col, ctx.row) {
                write!(f, " (col {c}, row {r})")?;
            }
        }
        Ok(())
    }
}

impl Error for CellError {}

impl From<CellError> for CellValue {
    fn from(error: CellError) -> Self {
        CellValue::Error(error)
    }
}

impl PartialEq<str> for CellErrorKind {
    fn eq(&self, other: &str) -> bool {
        self.code() == other
    }
}

impl PartialEq<&str> for CellError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.code() == *other
    }
}
