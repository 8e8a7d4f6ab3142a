//! Core types shared by every stage of the Rill toolchain.
//!
//! This crate holds the pieces the lexer, compiler, and virtual machine all
//! agree on: source spans, the error taxonomy, the heap value model with its
//! magic-method dispatch tables, the bytecode definitions, and the host I/O
//! abstraction built-ins write through.

pub mod bytecode;
pub mod error;
pub mod host;
pub mod span;
pub mod value;

pub use bytecode::{CodeObject, Instruction, LineMapEntry, Opcode};
pub use error::{RillError, RillResult, RuntimeErrorKind};
pub use host::{BufferHost, Host, StdHost};
pub use span::Span;
pub use value::{Payload, Type, Value};

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
