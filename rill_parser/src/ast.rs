//! Abstract Syntax Tree definitions for Rill.

use rill_core::Span;

/// A parsed program: the top-level statement list.
#[derive(Debug, Clone)]
pub struct Module {
    /// The statements in the module.
    pub body: Vec<Stmt>,
    /// Source span of the whole module.
    pub span: Span,
}

impl Module {
    /// Create a new module.
    #[must_use]
    pub fn new(body: Vec<Stmt>, span: Span) -> Self {
        Self { body, span }
    }
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// The statement kind.
    pub kind: StmtKind,
    /// Source span.
    pub span: Span,
    /// First and last source line of the statement.
    pub lines: (u32, u32),
}

impl Stmt {
    /// Create a new statement.
    #[must_use]
    pub fn new(kind: StmtKind, span: Span, lines: (u32, u32)) -> Self {
        Self { kind, span, lines }
    }
}

/// Statement kinds.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `var name = value`
    VarDecl {
        /// Variable name.
        name: String,
        /// Initializer.
        value: Box<Expr>,
    },
    /// `name = value`
    Assign {
        /// Target name.
        name: String,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `object.name = value`
    SetMember {
        /// Receiver expression.
        object: Box<Expr>,
        /// Attribute name.
        name: String,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `func name(params) { body }`
    FuncDef {
        /// Function name.
        name: String,
        /// Parameter names.
        params: Vec<String>,
        /// Body statements.
        body: Vec<Stmt>,
    },
    /// `if test { body } else { orelse }`
    If {
        /// Condition.
        test: Box<Expr>,
        /// Then branch.
        body: Vec<Stmt>,
        /// Else branch; an `else if` chain nests another `If` here.
        orelse: Vec<Stmt>,
    },
    /// `while test { body }`
    While {
        /// Condition.
        test: Box<Expr>,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// `return` with optional value.
    Return(Option<Box<Expr>>),
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `import name`
    Import {
        /// Module name.
        name: String,
    },
    /// Expression statement.
    Expr(Box<Expr>),
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The expression kind.
    pub kind: ExprKind,
    /// Source span.
    pub span: Span,
    /// First and last source line of the expression.
    pub lines: (u32, u32),
}

impl Expr {
    /// Create a new expression.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span, lines: (u32, u32)) -> Self {
        Self { kind, span, lines }
    }
}

/// Expression kinds.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Number literal; raw text, separators already stripped.
    Number(String),
    /// String literal; escapes already decoded.
    Str(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Nil,
    /// Identifier read.
    Ident(String),
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Call: `callee(args)`
    Call {
        /// Callee expression.
        callee: Box<Expr>,
        /// Arguments in source order.
        args: Vec<Expr>,
    },
    /// Member read: `object.name` (also `object::name`).
    GetMember {
        /// Receiver.
        object: Box<Expr>,
        /// Attribute name.
        name: String,
    },
    /// Index read: `object[args]`.
    GetItem {
        /// Receiver.
        object: Box<Expr>,
        /// Index arguments.
        args: Vec<Expr>,
    },
    /// List literal.
    List(Vec<Expr>),
    /// Dict literal: ordered `key = value` entries.
    Dict(Vec<(String, Expr)>),
    /// Short lambda: `|params| body`.
    Lambda {
        /// Parameter names.
        params: Vec<String>,
        /// Body expression (implicitly returned).
        body: Box<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `^`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `and`
    And,
    /// `or`
    Or,
    /// `is`
    Is,
    /// `in`
    In,
    /// `not in`
    NotIn,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `not` / `!`
    Not,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_new() {
        let module = Module::new(Vec::new(), Span::new(0, 0));
        assert!(module.body.is_empty());
    }

    #[test]
    fn test_stmt_carries_lines() {
        let expr = Expr::new(ExprKind::Nil, Span::new(0, 4), (2, 2));
        let stmt = Stmt::new(StmtKind::Expr(Box::new(expr)), Span::new(0, 4), (2, 2));
        assert_eq!(stmt.lines, (2, 2));
    }
}
