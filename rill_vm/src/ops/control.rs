//! Jumps and stack manipulation.

use crate::vm::Vm;
use rill_core::{Instruction, RillError, RillResult};

impl Vm {
    /// `JUMP target-pc`: unconditional absolute jump.
    pub(crate) fn exec_jump(&mut self, inst: &Instruction) -> RillResult<()> {
        let target = self.operand(inst)? as usize;
        self.jump_to(target)
    }

    /// `JUMP_IF_FALSE target-pc`: pop and jump when falsy.
    pub(crate) fn exec_jump_if_false(&mut self, inst: &Instruction) -> RillResult<()> {
        let target = self.operand(inst)? as usize;
        let condition = self.pop_operand("JUMP_IF_FALSE")?;
        if !self.truthy(&condition)? {
            self.jump_to(target)?;
        }
        Ok(())
    }

    /// Move the active frame's program counter, bounds-checked. A target
    /// equal to the instruction count is the "fall off the end" position.
    fn jump_to(&mut self, target: usize) -> RillResult<()> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(RillError::stack_error("no active call frame"));
        };
        if target > frame.code.instructions.len() {
            return Err(RillError::stack_error(format!(
                "jump target {} out of range",
                target
            )));
        }
        frame.pc = target;
        Ok(())
    }

    /// `POP_TOP`: discard the top of the stack, remembering it for the
    /// interactive echo.
    pub(crate) fn exec_pop_top(&mut self) -> RillResult<()> {
        let value = self.pop_operand("POP_TOP")?;
        self.last_popped = Some(value);
        Ok(())
    }

    /// `SWAP`: exchange the top two stack entries.
    pub(crate) fn exec_swap(&mut self) -> RillResult<()> {
        let a = self.pop_operand("SWAP")?;
        let b = self.pop_operand("SWAP")?;
        self.push(a);
        self.push(b);
        Ok(())
    }

    /// `COPY_TOP`: duplicate the top stack entry.
    pub(crate) fn exec_copy_top(&mut self) -> RillResult<()> {
        let top = self.pop_operand("COPY_TOP")?;
        self.push(top.clone());
        self.push(top);
        Ok(())
    }
}
