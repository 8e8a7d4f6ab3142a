//! Front end of the Rill toolchain: tokens, lexer, AST, and parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{BinaryOp, Expr, ExprKind, Module, Stmt, StmtKind, UnaryOp};
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, Parser};
pub use token::{Keyword, Token, TokenKind};
