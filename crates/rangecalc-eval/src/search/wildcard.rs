//! Spreadsheet wildcard patterns: `*` any run, `?` any one character, `~`
//! escapes the next character (`~*`, `~?`, `~~`). A trailing `~` is literal.

use crate::locale::Locale;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    AnySeq,
    AnyChar,
    Lit(char),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WildcardPattern {
    tokens: Vec<Token>,
}

/// True when `s` contains an unescaped `*` or `?`.
pub fn has_wildcards(s: &str) -> bool {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '~' => {
                chars.next();
            }
            '*' | '?' => return true,
            _ => {}
        }
    }
    false
}

/// True when `s` needs the pattern matcher: it has a wildcard or an escape.
pub fn is_pattern(s: &str) -> bool {
    s.contains('~') || has_wildcards(s)
}

impl WildcardPattern {
    pub fn compile(pattern: &str) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            let tok = match c {
                '~' => Token::Lit(chars.next().unwrap_or('~')),
                '*' => {
                    if tokens.last() == Some(&Token::AnySeq) {
                        continue;
                    }
                    Token::AnySeq
                }
                '?' => Token::AnyChar,
                other => Token::Lit(other),
            };
            tokens.push(tok);
        }
        WildcardPattern { tokens }
    }

    /// Whole-text match under the locale's character equality.
    pub fn matches(&self, text: &str, locale: &Locale) -> bool {
        let text: Vec<char> = text.chars().collect();
        let toks = &self.tokens;
        let (mut ti, mut si) = (0usize, 0usize);
        // Last `*` seen and the text position it currently absorbs up to.
        let mut star: Option<(usize, usize)> = None;
        while si < text.len() {
            match toks.get(ti) {
                Some(Token::AnyChar) => {
                    ti += 1;
                    si += 1;
                    continue;
                }
                Some(Token::Lit(c)) if locale.char_eq(*c, text[si]) => {
                    ti += 1;
                    si += 1;
                    continue;
                }
                Some(Token::AnySeq) => {
                    star = Some((ti, si));
                    ti += 1;
                    continue;
                }
                _ => {}
            }
            match star {
                Some((st, ss)) => {
                    ti = st + 1;
                    si = ss + 1;
                    star = Some((st, ss + 1));
                }
                None => return false,
            }
        }
        toks[ti..].iter().all(|t| *t == Token::AnySeq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(p: &str, t: &str) -> bool {
        WildcardPattern::compile(p).matches(t, &Locale::invariant())
    }

    #[test]
    fn star_and_question_mark() {
        assert!(m("a*c", "abbbc"));
        assert!(m("a*c", "ac"));
        assert!(!m("a*c", "abd"));
        assert!(m("?b?", "abc"));
        assert!(!m("?b?", "abcd"));
        assert!(m("*", ""));
        assert!(m("**x**", "yyx"));
    }

    #[test]
    fn case_folds_with_invariant_locale() {
        assert!(m("notach*", "NotACheater"));
        assert!(!WildcardPattern::compile("notach*").matches("NotACheater", &Locale::case_sensitive()));
    }

    #[test]
    fn tilde_escapes() {
        assert!(m("what~?", "what?"));
        assert!(!m("what~?", "whats"));
        assert!(m("5~*", "5*"));
        assert!(m("a~~b", "a~b"));
        assert!(m("end~", "end~"));
        assert!(!has_wildcards("what~?"));
        assert!(has_wildcards("wh*t"));
        assert!(is_pattern("what~?"));
        assert!(!is_pattern("what"));
    }

    #[test]
    fn question_mark_is_one_unicode_char() {
        assert!(m("caf?", "café"));
        assert!(m("?", "日"));
        assert!(m("É*", "éclair"));
    }
}
