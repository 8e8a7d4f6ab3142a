//! The Rill bytecode compiler: lowers the AST into code objects.

pub mod compiler;

pub use compiler::{compile_module, compile_source, Compiler};
