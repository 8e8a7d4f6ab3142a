//! Expression parsing, layered by precedence (lowest first):
//! `or` → `and` → comparison → add/sub → mul/div/mod → power → unary →
//! postfix → primary. Power is right-associative; postfix chains member
//! access, indexing, and calls.

use super::Parser;
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::token::{Keyword, TokenKind};
use rill_core::RillResult;

impl Parser {
    /// Parse a full expression.
    pub(crate) fn parse_expression(&mut self) -> RillResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> RillResult<Expr> {
        let mut node = self.parse_and()?;
        while self.match_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            node = binary(BinaryOp::Or, node, right);
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> RillResult<Expr> {
        let mut node = self.parse_comparison()?;
        while self.match_keyword(Keyword::And) {
            let right = self.parse_comparison()?;
            node = binary(BinaryOp::And, node, right);
        }
        Ok(node)
    }

    fn parse_comparison(&mut self) -> RillResult<Expr> {
        let mut node = self.parse_add_sub()?;
        loop {
            let op = if self.match_token(&TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.match_token(&TokenKind::NotEq) {
                BinaryOp::NotEq
            } else if self.match_token(&TokenKind::Less) {
                BinaryOp::Lt
            } else if self.match_token(&TokenKind::LessEq) {
                BinaryOp::LtEq
            } else if self.match_token(&TokenKind::Greater) {
                BinaryOp::Gt
            } else if self.match_token(&TokenKind::GreaterEq) {
                BinaryOp::GtEq
            } else if self.match_keyword(Keyword::In) {
                BinaryOp::In
            } else if self.match_keyword(Keyword::Is) {
                BinaryOp::Is
            } else if self.check_keyword(Keyword::Not)
                && matches!(self.peek_next().kind, TokenKind::Keyword(Keyword::In))
            {
                self.advance();
                self.advance();
                BinaryOp::NotIn
            } else {
                break;
            };
            let right = self.parse_add_sub()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    fn parse_add_sub(&mut self) -> RillResult<Expr> {
        let mut node = self.parse_mul_div_mod()?;
        loop {
            let op = if self.match_token(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.match_token(&TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_mul_div_mod()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    fn parse_mul_div_mod(&mut self) -> RillResult<Expr> {
        let mut node = self.parse_power()?;
        loop {
            let op = if self.match_token(&TokenKind::Star) {
                BinaryOp::Mul
            } else if self.match_token(&TokenKind::Slash) {
                BinaryOp::Div
            } else if self.match_token(&TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_power()?;
            node = binary(op, node, right);
        }
        Ok(node)
    }

    // Right-associative: `a ^ b ^ c` is `a ^ (b ^ c)`.
    fn parse_power(&mut self) -> RillResult<Expr> {
        let node = self.parse_unary()?;
        if self.match_token(&TokenKind::Caret) {
            let right = self.parse_power()?;
            return Ok(binary(BinaryOp::Pow, node, right));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> RillResult<Expr> {
        let start_span = self.current().span.start;
        let start_line = self.current().line;

        let op = if self.match_keyword(Keyword::Not) || self.match_token(&TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else if self.match_token(&TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = self.parse_unary()?;
            return Ok(self.finish_expr(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                start_span,
                start_line,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> RillResult<Expr> {
        let start_span = self.current().span.start;
        let start_line = self.current().line;
        let mut node = self.parse_primary()?;

        loop {
            if self.match_token(&TokenKind::Dot) || self.match_token(&TokenKind::DoubleColon) {
                let name = self.expect_identifier("expected attribute name")?;
                node = self.finish_expr(
                    ExprKind::GetMember {
                        object: Box::new(node),
                        name,
                    },
                    start_span,
                    start_line,
                );
            } else if self.match_token(&TokenKind::LBracket) {
                let args = self.parse_args(&TokenKind::RBracket)?;
                self.expect(&TokenKind::RBracket, "expected ']' after index")?;
                node = self.finish_expr(
                    ExprKind::GetItem {
                        object: Box::new(node),
                        args,
                    },
                    start_span,
                    start_line,
                );
            } else if self.match_token(&TokenKind::LParen) {
                let args = self.parse_args(&TokenKind::RParen)?;
                self.expect(&TokenKind::RParen, "expected ')' after arguments")?;
                node = self.finish_expr(
                    ExprKind::Call {
                        callee: Box::new(node),
                        args,
                    },
                    start_span,
                    start_line,
                );
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> RillResult<Expr> {
        let start_span = self.current().span.start;
        let start_line = self.current().line;

        match &self.current().kind {
            TokenKind::Number(text) => {
                let text = text.clone();
                self.advance();
                Ok(self.finish_expr(ExprKind::Number(text), start_span, start_line))
            }
            TokenKind::Str(text) => {
                let text = text.clone();
                self.advance();
                Ok(self.finish_expr(ExprKind::Str(text), start_span, start_line))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(self.finish_expr(ExprKind::Ident(name), start_span, start_line))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(self.finish_expr(ExprKind::Bool(true), start_span, start_line))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(self.finish_expr(ExprKind::Bool(false), start_span, start_line))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(self.finish_expr(ExprKind::Nil, start_span, start_line))
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expression()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_args(&TokenKind::RBracket)?;
                self.expect(&TokenKind::RBracket, "expected ']' after list elements")?;
                Ok(self.finish_expr(ExprKind::List(elements), start_span, start_line))
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_dict_literal(start_span, start_line)
            }
            TokenKind::Keyword(Keyword::Dict) => {
                // `dict { ... }` is the same construct as a bare brace literal.
                self.advance();
                self.skip_newlines();
                self.expect(&TokenKind::LBrace, "expected '{' after 'dict'")?;
                self.parse_dict_literal(start_span, start_line)
            }
            TokenKind::Pipe => {
                self.advance();
                self.parse_lambda(start_span, start_line)
            }
            _ => Err(self.error_at_current("expected an expression")),
        }
    }

    /// Comma-separated expressions up to (but not consuming) `close`.
    pub(crate) fn parse_args(&mut self, close: &TokenKind) -> RillResult<Vec<Expr>> {
        let mut args = Vec::new();
        self.skip_newlines();
        while !self.check(close) && !self.at_end() {
            args.push(self.parse_expression()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Ok(args)
    }

    /// Dict entries after the opening brace: `IDENT = expression`,
    /// separated by commas or semicolons, closed by `}`.
    fn parse_dict_literal(&mut self, start_span: u32, start_line: u32) -> RillResult<Expr> {
        let mut entries = Vec::new();
        self.skip_newlines();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let key = self.expect_identifier("expected dict key")?;
            self.expect(&TokenKind::Assign, "expected '=' after dict key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            self.skip_newlines();
            if self.match_token(&TokenKind::Comma) || self.match_token(&TokenKind::Semicolon) {
                self.skip_newlines();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "expected '}' after dict entries")?;
        Ok(self.finish_expr(ExprKind::Dict(entries), start_span, start_line))
    }

    /// Lambda parameters and body after the opening `|`.
    fn parse_lambda(&mut self, start_span: u32, start_line: u32) -> RillResult<Expr> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::Pipe) {
            params.push(self.expect_identifier("expected lambda parameter")?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Pipe, "expected '|' after lambda parameters")?;
        let body = self.parse_expression()?;
        Ok(self.finish_expr(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            start_span,
            start_line,
        ))
    }
}

/// Build a binary node spanning both operands.
fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    let lines = (left.lines.0, right.lines.1);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
        lines,
    )
}
