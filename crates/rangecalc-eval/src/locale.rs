use std::borrow::Cow;
use std::cmp::Ordering;

/// Text collation used by lookups and sorting.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Collation {
    /// Unicode lowercase folding before comparison (spreadsheet default).
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

/// Locale contract for the evaluation core.
///
/// Numeric parsing is invariant (ASCII, `.` decimal separator, no grouping), so
/// `"1.234,56"` is *not* a number. Text comparison follows the configured
/// [`Collation`]; the default folds case with Unicode rules so `"É" == "é"`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Locale {
    pub collation: Collation,
}

impl Locale {
    pub const fn invariant() -> Self {
        Locale {
            collation: Collation::CaseInsensitive,
        }
    }

    pub const fn case_sensitive() -> Self {
        Locale {
            collation: Collation::CaseSensitive,
        }
    }

    /// Parse a number using invariant rules. Infinite and NaN spellings are rejected.
    pub fn parse_number_invariant(&self, s: &str) -> Option<f64> {
        let t = s.trim();
        if t.is_empty() {
            return None;
        }
        t.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// Case folding for hashing/equality keys.
    pub fn fold_case<'s>(&self, s: &'s str) -> Cow<'s, str> {
        match self.collation {
            Collation::CaseSensitive => Cow::Borrowed(s),
            Collation::CaseInsensitive => {
                if s.is_ascii() && !s.bytes().any(|b| b.is_ascii_uppercase()) {
                    Cow::Borrowed(s)
                } else {
                    Cow::Owned(s.to_lowercase())
                }
            }
        }
    }

    pub fn compare_text(&self, a: &str, b: &str) -> Ordering {
        match self.collation {
            Collation::CaseSensitive => a.cmp(b),
            Collation::CaseInsensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
        }
    }

    pub fn text_eq(&self, a: &str, b: &str) -> bool {
        self.compare_text(a, b) == Ordering::Equal
    }

    /// Single-character equality used by wildcard matching.
    pub fn char_eq(&self, a: char, b: char) -> bool {
        match self.collation {
            Collation::CaseSensitive => a == b,
            Collation::CaseInsensitive => a == b || a.to_lowercase().eq(b.to_lowercase()),
        }
    }
}
