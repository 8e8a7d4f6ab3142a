//! Error taxonomy for the whole pipeline.
//!
//! Every stage reports through [`RillError`]: the lexer and parser attach a
//! 1-based line/column, the compiler attaches the source line of the
//! offending node, and the virtual machine attaches the line resolved from
//! the active code object's line map (when one is available).

use crate::span::Span;
use thiserror::Error;

/// Convenience result alias used across all Rill crates.
pub type RillResult<T> = Result<T, RillError>;

/// Classification of runtime failures raised by the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Operator applied to incompatible types, non-callable called.
    Type,
    /// Load of an undefined name, nonlocal store with no enclosing binding.
    Name,
    /// Call with the wrong number of arguments.
    Arity,
    /// Attribute access on an object that lacks the attribute.
    Attr,
    /// Division or modulo by zero, unsupported exponent.
    Arith,
    /// Operand-stack underflow; unreachable given correct compilation.
    Stack,
}

impl RuntimeErrorKind {
    /// The header label shown to the user.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "TypeError",
            Self::Name => "NameError",
            Self::Arity => "ArityError",
            Self::Attr => "AttrError",
            Self::Arith => "ArithError",
            Self::Stack => "StackError",
        }
    }
}

/// An error from any stage of the Rill pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RillError {
    /// Lexical error: unknown character, unterminated string or comment.
    #[error("LexError: {message}")]
    Lex {
        /// What went wrong.
        message: String,
        /// Byte span of the offending text.
        span: Span,
        /// 1-based line of the error.
        line: u32,
        /// 1-based column of the error.
        column: u32,
    },

    /// Syntax error: unexpected token, missing terminator, bad target.
    #[error("ParseError: {message}")]
    Parse {
        /// What went wrong.
        message: String,
        /// Byte span of the offending token.
        span: Span,
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
    },

    /// Compilation error on a well-lexed, well-parsed program.
    #[error("IRError: {message}")]
    Ir {
        /// What went wrong.
        message: String,
        /// Source line of the offending node.
        line: u32,
    },

    /// Runtime error raised by the virtual machine.
    #[error("{}: {message}", .kind.as_str())]
    Runtime {
        /// The failure classification.
        kind: RuntimeErrorKind,
        /// Human-readable description.
        message: String,
        /// Source line resolved from the code object's line map.
        line: Option<u32>,
    },
}

impl RillError {
    /// Build a lexer error at a position.
    pub fn lex(message: impl Into<String>, span: Span, line: u32, column: u32) -> Self {
        Self::Lex {
            message: message.into(),
            span,
            line,
            column,
        }
    }

    /// Build a parser error at a position.
    pub fn parse(message: impl Into<String>, span: Span, line: u32, column: u32) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            line,
            column,
        }
    }

    /// Build a compiler error at a source line.
    pub fn ir(message: impl Into<String>, line: u32) -> Self {
        Self::Ir {
            message: message.into(),
            line,
        }
    }

    /// Build a runtime error without position information.
    pub fn runtime(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self::Runtime {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Build a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Type, message)
    }

    /// Build a `NameError`.
    pub fn name_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Name, message)
    }

    /// Build an `ArityError`.
    pub fn arity_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Arity, message)
    }

    /// Build an `AttrError`.
    pub fn attr_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Attr, message)
    }

    /// Build an `ArithError`.
    pub fn arith_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Arith, message)
    }

    /// Build a `StackError`.
    pub fn stack_error(message: impl Into<String>) -> Self {
        Self::runtime(RuntimeErrorKind::Stack, message)
    }

    /// Attach a source line to a runtime error that lacks one.
    #[must_use]
    pub fn with_line(self, at: u32) -> Self {
        match self {
            Self::Runtime {
                kind,
                message,
                line: None,
            } => Self::Runtime {
                kind,
                message,
                line: Some(at),
            },
            other => other,
        }
    }

    /// The line the error points at, if any stage recorded one.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Lex { line, .. } | Self::Parse { line, .. } | Self::Ir { line, .. } => {
                Some(*line)
            }
            Self::Runtime { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(RuntimeErrorKind::Type.as_str(), "TypeError");
        assert_eq!(RuntimeErrorKind::Name.as_str(), "NameError");
        assert_eq!(RuntimeErrorKind::Arity.as_str(), "ArityError");
        assert_eq!(RuntimeErrorKind::Attr.as_str(), "AttrError");
        assert_eq!(RuntimeErrorKind::Arith.as_str(), "ArithError");
        assert_eq!(RuntimeErrorKind::Stack.as_str(), "StackError");
    }

    #[test]
    fn test_display_includes_kind() {
        let err = RillError::type_error("unsupported operand");
        assert_eq!(err.to_string(), "TypeError: unsupported operand");

        let err = RillError::lex("unterminated string", Span::new(4, 5), 2, 5);
        assert_eq!(err.to_string(), "LexError: unterminated string");
    }

    #[test]
    fn test_with_line_only_fills_missing() {
        let err = RillError::arith_error("division by zero").with_line(7);
        assert_eq!(err.line(), Some(7));

        // A line already present is not overwritten.
        let err = err.with_line(99);
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn test_positions_survive() {
        let err = RillError::parse("unexpected token", Span::new(0, 1), 3, 14);
        assert_eq!(err.line(), Some(3));
    }
}
