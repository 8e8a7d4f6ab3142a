//! Code objects: the unit of compilation and execution.

use super::instruction::Instruction;
use crate::value::Value;
use std::fmt::Write as _;

/// A line-map entry: the first instruction emitted for a source line.
///
/// Entries are strictly increasing in `pc`; the line for an arbitrary
/// instruction is the entry with the greatest `pc` not exceeding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMapEntry {
    /// Instruction index.
    pub pc: u32,
    /// 1-based source line.
    pub line: u32,
}

/// A compiled code object: instructions, constant pool, name table, and
/// line map. Constants are owned by the code object; indices in
/// instruction operands refer into `constants` and `names` by position.
#[derive(Debug, Clone, Default)]
pub struct CodeObject {
    /// Name of the function or module this code belongs to.
    pub name: String,
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
    /// Constant pool.
    pub constants: Vec<Value>,
    /// Identifier table: variables, attributes, parameters.
    pub names: Vec<String>,
    /// Instruction-index → source-line map, strictly increasing in index.
    pub line_map: Vec<LineMapEntry>,
}

impl CodeObject {
    /// Create an empty code object.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the code object has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The source line for an instruction index, from the line map.
    #[must_use]
    pub fn line_for_pc(&self, pc: u32) -> Option<u32> {
        match self.line_map.binary_search_by_key(&pc, |entry| entry.pc) {
            Ok(idx) => Some(self.line_map[idx].line),
            Err(0) => None,
            Err(idx) => Some(self.line_map[idx - 1].line),
        }
    }
}

/// Disassemble a code object to a human-readable listing.
pub fn disassemble(code: &CodeObject) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Code object: {}", code.name);

    if !code.constants.is_empty() {
        let _ = writeln!(output, "\nConstants:");
        for (i, constant) in code.constants.iter().enumerate() {
            let _ = writeln!(output, "  {:4}: {}", i, constant);
        }
    }

    if !code.names.is_empty() {
        let _ = writeln!(output, "\nNames:");
        for (i, name) in code.names.iter().enumerate() {
            let _ = writeln!(output, "  {:4}: {}", i, name);
        }
    }

    let _ = writeln!(output, "\nDisassembly:");
    for (i, inst) in code.instructions.iter().enumerate() {
        let line = code.line_for_pc(i as u32);
        let line_str = line.map_or("    ".to_string(), |l| format!("{:4}", l));
        let detail = annotate(code, inst);
        let _ = writeln!(output, "{} {:4}: {}{}", line_str, i, inst, detail);
    }

    output
}

/// Resolve an instruction's operand against the constant pool or name
/// table for the listing.
fn annotate(code: &CodeObject, inst: &Instruction) -> String {
    let Some(operand) = inst.operand(0) else {
        return String::new();
    };
    if inst.opcode.uses_const() {
        if let Some(constant) = code.constants.get(operand as usize) {
            return format!("  ({})", constant);
        }
    }
    if inst.opcode.uses_name() {
        if let Some(name) = code.names.get(operand as usize) {
            return format!("  ({})", name);
        }
    }
    String::new()
}
