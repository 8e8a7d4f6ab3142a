//! Number literal scanning.
//!
//! Accepted forms: decimal digits, a single embedded `.`, an optional
//! exponent (`e`/`E` with optional sign), and `_` separators strictly
//! between digits. The returned token text has separators stripped; the
//! compiler decides between Int and Rational from the surviving form.

use super::cursor::Cursor;
use crate::token::TokenKind;

/// Scan a number literal. The cursor has already consumed the first
/// character, which is at `start`.
pub(super) fn scan(cursor: &mut Cursor<'_>, start: usize) -> TokenKind {
    let has_dot = cursor.slice_from(start).starts_with('.');

    eat_digits_and_separators(cursor);

    if !has_dot && cursor.first() == '.' && cursor.second() != '.' {
        cursor.bump();
        eat_digits_and_separators(cursor);
    }

    // Exponent part; roll back if no digits follow the marker.
    if cursor.first() == 'e' || cursor.first() == 'E' {
        let saved = cursor.clone();
        cursor.bump();
        if cursor.first() == '+' || cursor.first() == '-' {
            cursor.bump();
        }
        if cursor.first().is_ascii_digit() {
            eat_digits_and_separators(cursor);
        } else {
            *cursor = saved;
        }
    }

    let text: String = cursor
        .slice_from(start)
        .chars()
        .filter(|&c| c != '_')
        .collect();
    TokenKind::Number(text)
}

/// Eat digits, permitting `_` only between two digits.
fn eat_digits_and_separators(cursor: &mut Cursor<'_>) {
    loop {
        let c = cursor.first();
        if c.is_ascii_digit() {
            cursor.bump();
        } else if c == '_' && cursor.second().is_ascii_digit() {
            cursor.bump();
        } else {
            break;
        }
    }
}
