//! Call frames.

use rill_core::{CodeObject, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Maximum call-stack depth before a recursion error.
pub const MAX_CALL_DEPTH: usize = 1000;

/// A call frame: one function invocation (or the module itself).
///
/// The frame owns its locals; popping the frame releases every binding.
/// `return_to_pc` records the caller's resume position at call time.
#[derive(Debug)]
pub struct Frame {
    /// Frame name, for diagnostics: the function or module name.
    pub name: String,
    /// The code object being executed.
    pub code: Rc<CodeObject>,
    /// Program counter: index of the next instruction to fetch.
    pub pc: usize,
    /// The caller's program counter at the time of the call.
    pub return_to_pc: usize,
    /// Local bindings.
    pub locals: FxHashMap<String, Value>,
}

impl Frame {
    /// Create a frame starting at instruction 0.
    #[must_use]
    pub fn new(name: impl Into<String>, code: Rc<CodeObject>, return_to_pc: usize) -> Self {
        Self {
            name: name.into(),
            code,
            pc: 0,
            return_to_pc,
            locals: FxHashMap::default(),
        }
    }

    /// Whether the program counter has run off the instruction list.
    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pc >= self.code.instructions.len()
    }
}
