//! Instruction records.

use super::opcode::Opcode;
use smallvec::SmallVec;
use std::fmt;

/// One bytecode instruction: opcode, operand list, and the source line
/// range it was emitted for.
///
/// Operands are unsigned indices whose interpretation depends on the
/// opcode. Almost every instruction carries zero or one operand, so the
/// list is stored inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode.
    pub opcode: Opcode,
    /// Operand list, interpreted per opcode.
    pub operands: SmallVec<[u32; 2]>,
    /// First source line this instruction was emitted for.
    pub line_start: u32,
    /// Last source line this instruction was emitted for.
    pub line_end: u32,
}

impl Instruction {
    /// Create an instruction with an explicit operand list.
    #[must_use]
    pub fn new(opcode: Opcode, operands: SmallVec<[u32; 2]>, lines: (u32, u32)) -> Self {
        Self {
            opcode,
            operands,
            line_start: lines.0,
            line_end: lines.1,
        }
    }

    /// Create an operand-less instruction.
    #[must_use]
    pub fn op(opcode: Opcode, lines: (u32, u32)) -> Self {
        Self::new(opcode, SmallVec::new(), lines)
    }

    /// Create a one-operand instruction.
    #[must_use]
    pub fn op1(opcode: Opcode, operand: u32, lines: (u32, u32)) -> Self {
        let mut operands = SmallVec::new();
        operands.push(operand);
        Self::new(opcode, operands, lines)
    }

    /// The operand at `idx`, if present.
    #[inline]
    #[must_use]
    pub fn operand(&self, idx: usize) -> Option<u32> {
        self.operands.get(idx).copied()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_shapes() {
        let ret = Instruction::op(Opcode::Ret, (3, 3));
        assert!(ret.operands.is_empty());
        assert_eq!(ret.operand(0), None);

        let load = Instruction::op1(Opcode::LoadConst, 7, (1, 1));
        assert_eq!(load.operand(0), Some(7));
        assert_eq!(load.line_start, 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::op(Opcode::Add, (1, 1)).to_string(), "OP_ADD");
        assert_eq!(
            Instruction::op1(Opcode::LoadVar, 2, (1, 1)).to_string(),
            "LOAD_VAR 2"
        );
    }

    #[test]
    fn test_equality_is_value_equality() {
        let a = Instruction::op1(Opcode::Jump, 5, (1, 1));
        let b = Instruction::op1(Opcode::Jump, 5, (1, 1));
        let c = Instruction::op1(Opcode::Jump, 6, (1, 1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
