//! String literal scanning.
//!
//! Strings accept `"` or `'` as delimiter; the closer must match. Escape
//! sequences `\n \t \r \\ \" \'` are decoded in place. Multi-line strings
//! are allowed (the cursor keeps line tracking). An unterminated string is
//! a lexer error at the opening quote.

use super::cursor::Cursor;
use crate::token::TokenKind;
use rill_core::{RillError, Span};

/// Scan a string literal. The opening quote has already been consumed.
pub(super) fn scan(
    cursor: &mut Cursor<'_>,
    quote: char,
    start: usize,
    line: u32,
    column: u32,
) -> Result<TokenKind, RillError> {
    let mut content = String::new();

    loop {
        match cursor.bump() {
            None => {
                return Err(RillError::lex(
                    "unterminated string literal",
                    Span::new(start as u32, start as u32 + 1),
                    line,
                    column,
                ));
            }
            Some(c) if c == quote => return Ok(TokenKind::Str(content)),
            Some('\\') => match cursor.bump() {
                Some('n') => content.push('\n'),
                Some('t') => content.push('\t'),
                Some('r') => content.push('\r'),
                Some('\\') => content.push('\\'),
                Some('"') => content.push('"'),
                Some('\'') => content.push('\''),
                Some(other) => {
                    // Unknown escapes keep the backslash verbatim.
                    content.push('\\');
                    content.push(other);
                }
                None => {
                    return Err(RillError::lex(
                        "unterminated string literal",
                        Span::new(start as u32, start as u32 + 1),
                        line,
                        column,
                    ));
                }
            },
            Some(c) => content.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(source: &str) -> String {
        let mut cursor = Cursor::new(source);
        let quote = cursor.bump().unwrap();
        match scan(&mut cursor, quote, 0, 1, 1).unwrap() {
            TokenKind::Str(text) => text,
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_double_and_single_quotes() {
        assert_eq!(scan_ok("\"hello\""), "hello");
        assert_eq!(scan_ok("'world'"), "world");
    }

    #[test]
    fn test_delimiters_do_not_cross() {
        // A single quote inside a double-quoted string is plain text.
        assert_eq!(scan_ok("\"it's\""), "it's");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(scan_ok(r#""a\tb\nc""#), "a\tb\nc");
        assert_eq!(scan_ok(r#""q\"q""#), "q\"q");
        assert_eq!(scan_ok(r#""b\\s""#), "b\\s");
    }

    #[test]
    fn test_unknown_escape_kept() {
        assert_eq!(scan_ok(r#""a\qb""#), "a\\qb");
    }

    #[test]
    fn test_multiline() {
        assert_eq!(scan_ok("\"a\nb\""), "a\nb");
    }

    #[test]
    fn test_unterminated() {
        let mut cursor = Cursor::new("\"abc");
        cursor.bump();
        let err = scan(&mut cursor, '"', 0, 1, 1).unwrap_err();
        assert!(matches!(err, RillError::Lex { line: 1, column: 1, .. }));
    }
}
