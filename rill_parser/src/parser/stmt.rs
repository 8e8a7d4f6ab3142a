//! Statement parsing.

use super::Parser;
use crate::ast::{ExprKind, Stmt, StmtKind};
use crate::token::{Keyword, TokenKind};
use rill_core::RillResult;

impl Parser {
    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> RillResult<Stmt> {
        let start_span = self.current().span.start;
        let start_line = self.current().line;

        if let TokenKind::Keyword(kw) = self.current().kind {
            match kw {
                Keyword::Var => return self.parse_var_decl(start_span, start_line),
                Keyword::Func => return self.parse_func_def(start_span, start_line),
                Keyword::If => {
                    self.advance();
                    return self.parse_if(start_span, start_line);
                }
                Keyword::While => return self.parse_while(start_span, start_line),
                Keyword::Return => return self.parse_return(start_span, start_line),
                Keyword::Break => {
                    self.advance();
                    self.skip_terminator()?;
                    return Ok(self.finish_stmt(StmtKind::Break, start_span, start_line));
                }
                Keyword::Continue => {
                    self.advance();
                    self.skip_terminator()?;
                    return Ok(self.finish_stmt(StmtKind::Continue, start_span, start_line));
                }
                Keyword::Import => return self.parse_import(start_span, start_line),
                Keyword::Else => {
                    return Err(self.error_at_current("'else' without a matching 'if'"));
                }
                Keyword::End => {
                    return Err(self.error_at_current("unexpected 'end'"));
                }
                _ => {}
            }
        }

        self.parse_expr_statement(start_span, start_line)
    }

    /// `var IDENT = expression`
    fn parse_var_decl(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        self.advance();
        let name = self.expect_identifier("expected variable name after 'var'")?;
        self.expect(&TokenKind::Assign, "expected '=' in variable declaration")?;
        let value = self.parse_expression()?;
        self.skip_terminator()?;
        Ok(self.finish_stmt(
            StmtKind::VarDecl {
                name,
                value: Box::new(value),
            },
            start_span,
            start_line,
        ))
    }

    /// `func IDENT ( params? ) block`
    fn parse_func_def(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        self.advance();
        let name = self.expect_identifier("expected function name after 'func'")?;
        self.expect(&TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(StmtKind::FuncDef { name, params, body }, start_span, start_line))
    }

    /// The parameter list, after the opening parenthesis.
    pub(crate) fn parse_params(&mut self) -> RillResult<Vec<String>> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier("expected parameter name")?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "expected ')' after parameters")?;
        Ok(params)
    }

    /// An `if` statement; the `if` keyword is already consumed.
    fn parse_if(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        let test = self.parse_expression()?;
        let body = self.parse_block()?;

        let orelse = if self.match_keyword(Keyword::Else) {
            if self.check_keyword(Keyword::If) {
                let inner_span = self.current().span.start;
                let inner_line = self.current().line;
                self.advance();
                vec![self.parse_if(inner_span, inner_line)?]
            } else {
                self.parse_block()?
            }
        } else {
            Vec::new()
        };

        Ok(self.finish_stmt(
            StmtKind::If {
                test: Box::new(test),
                body,
                orelse,
            },
            start_span,
            start_line,
        ))
    }

    /// `while expression block`
    fn parse_while(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        self.advance();
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(self.finish_stmt(
            StmtKind::While {
                test: Box::new(test),
                body,
            },
            start_span,
            start_line,
        ))
    }

    /// `return expression?`
    fn parse_return(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        self.advance();
        let value = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::Newline)
            || self.check(&TokenKind::RBrace)
            || self.at_end()
        {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.skip_terminator()?;
        Ok(self.finish_stmt(StmtKind::Return(value), start_span, start_line))
    }

    /// `import name`
    fn parse_import(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        self.advance();
        let name = match &self.current().kind {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Str(name) => name.clone(),
            _ => return Err(self.error_at_current("expected module name after 'import'")),
        };
        self.advance();
        self.skip_terminator()?;
        Ok(self.finish_stmt(StmtKind::Import { name }, start_span, start_line))
    }

    /// A `{ ... }` block.
    pub(crate) fn parse_block(&mut self) -> RillResult<Vec<Stmt>> {
        self.skip_newlines();
        self.expect(&TokenKind::LBrace, "expected '{' to open a block")?;
        let mut body = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(&TokenKind::RBrace) || self.at_end() {
                break;
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace, "expected '}' to close the block")?;
        Ok(body)
    }

    /// Expression statement, with the member-assignment rewrite: an
    /// expression followed by `=` becomes an assignment when the left side
    /// is an identifier or a member access, and is a syntax error otherwise.
    fn parse_expr_statement(&mut self, start_span: u32, start_line: u32) -> RillResult<Stmt> {
        let expr = self.parse_expression()?;

        if self.check(&TokenKind::Assign) {
            return match expr.kind {
                ExprKind::Ident(name) => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.skip_terminator()?;
                    Ok(self.finish_stmt(
                        StmtKind::Assign {
                            name,
                            value: Box::new(value),
                        },
                        start_span,
                        start_line,
                    ))
                }
                ExprKind::GetMember { object, name } => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.skip_terminator()?;
                    Ok(self.finish_stmt(
                        StmtKind::SetMember {
                            object,
                            name,
                            value: Box::new(value),
                        },
                        start_span,
                        start_line,
                    ))
                }
                _ => Err(self.error_at_current(
                    "invalid assignment target: expected an identifier or member access",
                )),
            };
        }

        self.skip_terminator()?;
        Ok(self.finish_stmt(StmtKind::Expr(Box::new(expr)), start_span, start_line))
    }
}
