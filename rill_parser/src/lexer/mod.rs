//! The Rill lexer.
//!
//! A character-driven scanner turning source text into an ordered token
//! stream terminated by `Eof`. Whitespace (space, tab, CR) is skipped; a
//! newline yields an `EndOfLine` token unless the preceding token is a
//! backslash, in which case both are suppressed (line continuation).
//! Comments are `// ...` to end of line and non-nesting `/* ... */`.

mod cursor;
mod number;
mod string;

pub use cursor::Cursor;

use crate::token::{Keyword, Token, TokenKind};
use rill_core::{RillError, RillResult, Span};

/// The lexer: wraps a [`Cursor`] and accumulates tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    tokens: Vec<Token>,
}

/// Tokenize a complete source text.
pub fn tokenize(source: &str) -> RillResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
        }
    }

    /// Consume the source and produce the token stream.
    pub fn tokenize(mut self) -> RillResult<Vec<Token>> {
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\r');

            let start = self.cursor.pos();
            let line = self.cursor.line();
            let column = self.cursor.column();

            let Some(c) = self.cursor.bump() else {
                self.push(TokenKind::Eof, start, line, column);
                return Ok(self.tokens);
            };

            match c {
                '\n' => self.lex_newline(start, line, column),
                '/' => {
                    if self.cursor.eat('/') {
                        self.cursor.eat_while(|c| c != '\n');
                    } else if self.cursor.eat('*') {
                        self.lex_block_comment(start, line, column)?;
                    } else {
                        self.push(TokenKind::Slash, start, line, column);
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    self.cursor
                        .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    let text = self.cursor.slice_from(start);
                    let kind = match Keyword::from_str(text) {
                        Some(kw) => TokenKind::Keyword(kw),
                        None => TokenKind::Ident(text.to_string()),
                    };
                    self.push(kind, start, line, column);
                }
                c if c.is_ascii_digit() => {
                    let kind = number::scan(&mut self.cursor, start);
                    self.push(kind, start, line, column);
                }
                '.' => {
                    if self.cursor.first().is_ascii_digit() {
                        let kind = number::scan(&mut self.cursor, start);
                        self.push(kind, start, line, column);
                    } else if self.cursor.first() == '.' && self.cursor.second() == '.' {
                        self.cursor.bump();
                        self.cursor.bump();
                        self.push(TokenKind::Ellipsis, start, line, column);
                    } else {
                        self.push(TokenKind::Dot, start, line, column);
                    }
                }
                '"' | '\'' => {
                    let kind = string::scan(&mut self.cursor, c, start, line, column)?;
                    self.push(kind, start, line, column);
                }
                '=' => {
                    let kind = if self.cursor.eat('=') {
                        TokenKind::EqEq
                    } else if self.cursor.eat('>') {
                        TokenKind::FatArrow
                    } else {
                        TokenKind::Assign
                    };
                    self.push(kind, start, line, column);
                }
                '!' => {
                    let kind = if self.cursor.eat('=') {
                        TokenKind::NotEq
                    } else {
                        TokenKind::Bang
                    };
                    self.push(kind, start, line, column);
                }
                '<' => {
                    let kind = if self.cursor.eat('=') {
                        TokenKind::LessEq
                    } else {
                        TokenKind::Less
                    };
                    self.push(kind, start, line, column);
                }
                '>' => {
                    let kind = if self.cursor.eat('=') {
                        TokenKind::GreaterEq
                    } else {
                        TokenKind::Greater
                    };
                    self.push(kind, start, line, column);
                }
                '-' => {
                    let kind = if self.cursor.eat('>') {
                        TokenKind::Arrow
                    } else {
                        TokenKind::Minus
                    };
                    self.push(kind, start, line, column);
                }
                ':' => {
                    let kind = if self.cursor.eat(':') {
                        TokenKind::DoubleColon
                    } else {
                        TokenKind::Unknown(':')
                    };
                    self.push(kind, start, line, column);
                }
                '+' => self.push(TokenKind::Plus, start, line, column),
                '*' => self.push(TokenKind::Star, start, line, column),
                '\\' => self.push(TokenKind::Backslash, start, line, column),
                '%' => self.push(TokenKind::Percent, start, line, column),
                '^' => self.push(TokenKind::Caret, start, line, column),
                '|' => self.push(TokenKind::Pipe, start, line, column),
                '(' => self.push(TokenKind::LParen, start, line, column),
                ')' => self.push(TokenKind::RParen, start, line, column),
                '{' => self.push(TokenKind::LBrace, start, line, column),
                '}' => self.push(TokenKind::RBrace, start, line, column),
                '[' => self.push(TokenKind::LBracket, start, line, column),
                ']' => self.push(TokenKind::RBracket, start, line, column),
                ',' => self.push(TokenKind::Comma, start, line, column),
                ';' => self.push(TokenKind::Semicolon, start, line, column),
                other => self.push(TokenKind::Unknown(other), start, line, column),
            }
        }
    }

    /// Emit an `EndOfLine` token, unless the stream is empty or the
    /// previous token is a backslash (line continuation swallows both).
    fn lex_newline(&mut self, start: usize, line: u32, column: u32) {
        match self.tokens.last() {
            None => {}
            Some(prev) if prev.kind == TokenKind::Backslash => {
                self.tokens.pop();
            }
            Some(_) => self.push(TokenKind::Newline, start, line, column),
        }
    }

    /// Skip a `/* ... */` comment. Nesting is not supported; an
    /// unterminated comment reports the opening position.
    fn lex_block_comment(&mut self, start: usize, line: u32, column: u32) -> RillResult<()> {
        loop {
            match self.cursor.bump() {
                None => {
                    return Err(RillError::lex(
                        "unterminated block comment",
                        Span::new(start as u32, start as u32 + 2),
                        line,
                        column,
                    ));
                }
                Some('*') if self.cursor.first() == '/' => {
                    self.cursor.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: u32, column: u32) {
        let span = self.cursor.span_from(start);
        self.tokens.push(Token::new(kind, span, line, column));
    }
}
