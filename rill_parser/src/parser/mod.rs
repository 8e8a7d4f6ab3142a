//! The Rill parser.
//!
//! Recursive descent over the token list with precedence-layered
//! expression parsing. The parser owns a cursor into the tokens and
//! exposes the small set of primitives the statement and expression
//! layers are built from.

mod expr;
mod stmt;

use crate::ast::{Expr, ExprKind, Module, Stmt, StmtKind};
use crate::token::{Keyword, Token, TokenKind};
use rill_core::{RillError, RillResult, Span};

/// Parse a token stream into a module.
pub fn parse(tokens: Vec<Token>) -> RillResult<Module> {
    Parser::new(tokens).parse_module()
}

/// The Rill parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser over a token list. The list must be terminated by
    /// an `Eof` token, as the lexer guarantees.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.last().map(Token::is_eof).unwrap_or(false));
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token stream as a module.
    pub fn parse_module(mut self) -> RillResult<Module> {
        let start = self.current().span.start;
        let mut body = Vec::new();

        self.skip_newlines();
        while !self.at_end() {
            body.push(self.parse_statement()?);
            self.skip_newlines();
        }

        let end = self.current().span.end;
        Ok(Module::new(body, Span::new(start, end)))
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// The current token.
    #[inline]
    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// The token after the current one.
    #[inline]
    pub(crate) fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    /// The most recently consumed token.
    #[inline]
    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Advance past the current token.
    pub(crate) fn advance(&mut self) -> &Token {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        } else {
            // Park on the trailing Eof.
            self.pos = self.tokens.len();
        }
        self.previous()
    }

    /// Check the current token's kind, ignoring payloads.
    #[inline]
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    /// Check for a specific keyword.
    #[inline]
    pub(crate) fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.current().kind, TokenKind::Keyword(k) if *k == kw)
    }

    /// Consume the current token if its kind matches.
    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is the given keyword.
    pub(crate) fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect and consume a token kind, or error.
    pub(crate) fn expect(&mut self, kind: &TokenKind, msg: &str) -> RillResult<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Expect and consume an identifier, returning its name.
    pub(crate) fn expect_identifier(&mut self, msg: &str) -> RillResult<String> {
        if let TokenKind::Ident(name) = &self.current().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_at_current(msg))
        }
    }

    /// Skip any run of end-of-line tokens.
    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    /// Consume a statement terminator: `;`, end of line, or end of input.
    /// A closing brace also ends a statement without consuming anything.
    pub(crate) fn skip_terminator(&mut self) -> RillResult<()> {
        if self.match_token(&TokenKind::Semicolon) || self.match_token(&TokenKind::Newline) {
            return Ok(());
        }
        if self.check(&TokenKind::Eof) || self.check(&TokenKind::RBrace) {
            return Ok(());
        }
        Err(self.error_at_current("expected ';' or end of line"))
    }

    /// Check if all input has been consumed.
    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    // =========================================================================
    // Node Construction
    // =========================================================================

    /// Finish an expression started at `(start_span, start_line)`.
    pub(crate) fn finish_expr(&self, kind: ExprKind, start_span: u32, start_line: u32) -> Expr {
        Expr::new(
            kind,
            Span::new(start_span, self.previous().span.end),
            (start_line, self.previous().line),
        )
    }

    /// Finish a statement started at `(start_span, start_line)`.
    pub(crate) fn finish_stmt(&self, kind: StmtKind, start_span: u32, start_line: u32) -> Stmt {
        Stmt::new(
            kind,
            Span::new(start_span, self.previous().span.end),
            (start_line, self.previous().line),
        )
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Build a parse error pointing at the current token.
    pub(crate) fn error_at_current(&self, msg: &str) -> RillError {
        let token = self.current();
        let location = match &token.kind {
            TokenKind::Eof => "at end of input".to_string(),
            kind => format!("at '{}'", kind),
        };
        RillError::parse(
            format!("{}: {}", location, msg),
            token.span,
            token.line,
            token.column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> RillResult<Module> {
        parse(tokenize(source)?)
    }

    #[test]
    fn test_empty_module() {
        let module = parse_source("").unwrap();
        assert!(module.body.is_empty());

        let module = parse_source("\n\n\n").unwrap();
        assert!(module.body.is_empty());
    }

    #[test]
    fn test_statements_separated_by_newlines_and_semicolons() {
        let module = parse_source("var a = 1\nvar b = 2; var c = 3").unwrap();
        assert_eq!(module.body.len(), 3);
    }

    #[test]
    fn test_error_carries_position() {
        let err = parse_source("var = 1").unwrap_err();
        match err {
            RillError::Parse { line, column, message, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, 5);
                assert!(message.contains("variable name"));
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_else_errors_at_else() {
        let err = parse_source("else { 1; }").unwrap_err();
        match err {
            RillError::Parse { line, column, message, .. } => {
                assert_eq!((line, column), (1, 1));
                assert!(message.contains("else"));
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }
}
