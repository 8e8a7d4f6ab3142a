//! The virtual machine: state, drive loop, and load protocols.

use crate::builtins;
use crate::frame::Frame;
use crate::magic;
use crate::stdlib::ModuleRegistry;
use rill_core::value::magic::TypeTables;
use rill_core::{
    CodeObject, Host, Instruction, LineMapEntry, Opcode, RillError, RillResult, StdHost, Type,
    Value,
};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// The Rill virtual machine.
///
/// One VM executes one program at a time, single-threaded. In interactive
/// use the VM persists across inputs: each chunk appends to the module
/// frame's code object and execution resumes at the first new instruction.
pub struct Vm {
    /// Operand stack.
    pub(crate) stack: Vec<Value>,
    /// Call stack; the bottom entry is the module frame.
    pub(crate) frames: Vec<Frame>,
    /// Intrinsic callables, consulted after variable resolution fails.
    pub(crate) builtins: FxHashMap<String, Value>,
    /// Per-type magic-method tables.
    pub(crate) magic: TypeTables,
    /// Native-module registry for `import`.
    pub(crate) modules: ModuleRegistry,
    /// Host streams for `print` / `input`.
    pub(crate) host: Box<dyn Host>,
    /// Value most recently discarded by `POP_TOP`; the REPL echo.
    pub(crate) last_popped: Option<Value>,
}

impl Vm {
    /// Create a VM wired to the process's standard streams.
    #[must_use]
    pub fn new() -> Self {
        Self::with_host(Box::new(StdHost))
    }

    /// Create a VM with a custom host (tests, embeddings).
    #[must_use]
    pub fn with_host(host: Box<dyn Host>) -> Self {
        let mut vm_builtins = FxHashMap::default();
        builtins::install(&mut vm_builtins);
        Self {
            stack: Vec::new(),
            frames: Vec::new(),
            builtins: vm_builtins,
            magic: magic::standard_tables(),
            modules: ModuleRegistry::standard(),
            host,
            last_popped: None,
        }
    }

    /// The host, for embeddings that need direct stream access.
    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    /// The module registry, for registering embedder modules.
    pub fn modules_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.modules
    }

    /// Current operand-stack height.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Take the value most recently discarded by `POP_TOP`.
    pub fn take_last_popped(&mut self) -> Option<Value> {
        self.last_popped.take()
    }

    // =========================================================================
    // Load Protocols
    // =========================================================================

    /// Execute a program from scratch: replaces any previous module frame.
    pub fn load(&mut self, code: CodeObject) -> RillResult<()> {
        self.stack.clear();
        self.frames.clear();
        let end = code.instructions.len();
        let name = code.name.clone();
        self.frames.push(Frame::new(name, Rc::new(code), end));
        self.run()
    }

    /// Append a chunk to the module frame and resume execution at its
    /// first instruction. Constants de-duplicate into the existing pool by
    /// type tag plus rendered text, names de-duplicate by spelling, and
    /// operand indices (including jump targets) are rewritten to match.
    pub fn load_incremental(&mut self, chunk: CodeObject) -> RillResult<()> {
        if self.frames.is_empty() {
            return self.load(chunk);
        }

        let frame = &mut self.frames[0];
        let code = Rc::make_mut(&mut frame.code);
        let base = code.instructions.len() as u32;

        let name_remap: Vec<u32> = chunk
            .names
            .iter()
            .map(|name| match code.names.iter().position(|n| n == name) {
                Some(idx) => idx as u32,
                None => {
                    code.names.push(name.clone());
                    (code.names.len() - 1) as u32
                }
            })
            .collect();

        let const_remap: Vec<u32> = chunk
            .constants
            .into_iter()
            .map(|value| intern_incremental(&mut code.constants, value))
            .collect();

        for mut inst in chunk.instructions {
            if let Some(operand) = inst.operand(0) {
                if inst.opcode.uses_const() {
                    inst.operands[0] = const_remap[operand as usize];
                } else if inst.opcode.uses_name() {
                    inst.operands[0] = name_remap[operand as usize];
                } else if inst.opcode.uses_jump_target() {
                    inst.operands[0] = operand + base;
                }
            }
            code.instructions.push(inst);
        }

        for entry in chunk.line_map {
            code.line_map.push(LineMapEntry {
                pc: entry.pc + base,
                line: entry.line,
            });
        }

        frame.pc = base as usize;
        frame.return_to_pc = code.instructions.len();
        self.run()
    }

    /// Restore the module frame to a runnable state after a failed
    /// top-level statement: discard inner frames and pending operands.
    pub fn recover(&mut self) {
        self.frames.truncate(1);
        self.stack.clear();
        if let Some(frame) = self.frames.first_mut() {
            frame.pc = frame.code.instructions.len();
        }
    }

    // =========================================================================
    // Dispatch Loop
    // =========================================================================

    /// Fetch-decode-execute until the module frame finishes.
    pub fn run(&mut self) -> RillResult<()> {
        loop {
            let done = match self.frames.last() {
                None => return Ok(()),
                Some(frame) => frame.is_done(),
            };
            if done {
                if self.frames.len() == 1 {
                    return Ok(());
                }
                // A function body always ends in RET; running off the end
                // is recovered as an implicit nil return.
                self.frames.pop();
                self.stack.push(Value::nil());
                continue;
            }
            let inst = {
                let Some(frame) = self.frames.last_mut() else {
                    return Ok(());
                };
                let inst = frame.code.instructions[frame.pc].clone();
                frame.pc += 1;
                inst
            };
            self.exec(&inst)
                .map_err(|err| err.with_line(inst.line_start))?;
        }
    }

    /// Execute a single instruction.
    fn exec(&mut self, inst: &Instruction) -> RillResult<()> {
        use rill_core::value::magic::MagicOp;
        match inst.opcode {
            Opcode::LoadConst => self.exec_load_const(inst),
            Opcode::LoadVar => self.exec_load_var(inst),
            Opcode::SetLocal => self.exec_set_local(inst),
            Opcode::SetGlobal => self.exec_set_global(inst),
            Opcode::SetNonlocal => self.exec_set_nonlocal(inst),
            Opcode::GetAttr => self.exec_get_attr(inst),
            Opcode::SetAttr => self.exec_set_attr(inst),
            Opcode::MakeList => self.exec_make_list(inst),
            Opcode::MakeDict => self.exec_make_dict(inst),
            Opcode::Import => self.exec_import(inst),
            Opcode::Call => self.exec_call(),
            Opcode::Ret => self.exec_ret(),
            Opcode::Add => self.binary_magic(MagicOp::Add),
            Opcode::Sub => self.binary_magic(MagicOp::Sub),
            Opcode::Mul => self.binary_magic(MagicOp::Mul),
            Opcode::Div => self.binary_magic(MagicOp::Div),
            Opcode::Mod => self.binary_magic(MagicOp::Mod),
            Opcode::Pow => self.binary_magic(MagicOp::Pow),
            Opcode::Eq => self.binary_magic(MagicOp::Eq),
            Opcode::Lt => self.binary_magic(MagicOp::Lt),
            Opcode::Gt => self.binary_magic(MagicOp::Gt),
            Opcode::Neg => self.exec_neg(),
            Opcode::Not => self.exec_not(),
            Opcode::And => self.exec_and(),
            Opcode::Or => self.exec_or(),
            Opcode::Is => self.exec_is(),
            Opcode::In => self.exec_in(),
            Opcode::Jump => self.exec_jump(inst),
            Opcode::JumpIfFalse => self.exec_jump_if_false(inst),
            Opcode::PopTop => self.exec_pop_top(),
            Opcode::Swap => self.exec_swap(),
            Opcode::CopyTop => self.exec_copy_top(),
            Opcode::Throw => Err(RillError::stack_error("THROW is not implemented")),
        }
    }

    // =========================================================================
    // Shared Helpers
    // =========================================================================

    /// The active frame.
    pub(crate) fn frame(&self) -> RillResult<&Frame> {
        self.frames
            .last()
            .ok_or_else(|| RillError::stack_error("no active call frame"))
    }

    /// Push a value on the operand stack.
    #[inline]
    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pop the operand stack, failing with a `StackError` if empty.
    pub(crate) fn pop_operand(&mut self, context: &str) -> RillResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| RillError::stack_error(format!("operand stack underflow in {}", context)))
    }

    /// Resolve an instruction's single operand.
    pub(crate) fn operand(&self, inst: &Instruction) -> RillResult<u32> {
        inst.operand(0).ok_or_else(|| {
            RillError::stack_error(format!("{} is missing its operand", inst.opcode))
        })
    }

    /// Resolve a name-table index against the active frame's code.
    pub(crate) fn name_at(&self, idx: u32) -> RillResult<String> {
        let frame = self.frame()?;
        frame
            .code
            .names
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| RillError::stack_error(format!("name index {} out of range", idx)))
    }

    /// Truthiness with `bool` magic-slot override: nil is false, booleans
    /// unwrap, other values are true unless their type installs a handler.
    pub(crate) fn truthy(&self, value: &Value) -> RillResult<bool> {
        use rill_core::value::magic::MagicOp;
        match value.type_of() {
            Type::Nil | Type::Bool => Ok(value.is_truthy()),
            ty => match self.magic.lookup(ty, MagicOp::Bool) {
                None => Ok(true),
                Some(handler) => {
                    let result = handler(value, &[])?;
                    result.as_bool().ok_or_else(|| {
                        RillError::type_error(format!(
                            "bool handler for {} returned {}, expected Bool",
                            ty,
                            result.type_of()
                        ))
                    })
                }
            },
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

/// Intern a constant into an existing pool, de-duplicating scalars by
/// type tag plus rendered text.
fn intern_incremental(pool: &mut Vec<Value>, value: Value) -> u32 {
    let dedup = matches!(
        value.type_of(),
        Type::Nil | Type::Bool | Type::Int | Type::Rational | Type::Str
    );
    if dedup {
        let rendered = value.to_string();
        if let Some(idx) = pool
            .iter()
            .position(|v| v.type_of() == value.type_of() && v.to_string() == rendered)
        {
            return idx as u32;
        }
    }
    pool.push(value);
    (pool.len() - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::BufferHost;

    fn capture_vm() -> Vm {
        Vm::with_host(Box::new(BufferHost::new()))
    }

    fn run(vm: &mut Vm, source: &str) -> RillResult<()> {
        let code = rill_compiler::compile_source(source, "<test>").unwrap();
        vm.load(code)
    }

    fn run_incremental(vm: &mut Vm, source: &str) -> RillResult<()> {
        let code = rill_compiler::compile_source(source, "<repl>").unwrap();
        vm.load_incremental(code)
    }

    #[test]
    fn test_empty_program_is_a_noop() {
        let mut vm = capture_vm();
        run(&mut vm, "").unwrap();
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn test_stack_balances_after_program() {
        let mut vm = capture_vm();
        run(&mut vm, "var x = 1; x + 2; print(x);").unwrap();
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn test_last_popped_records_expression_results() {
        let mut vm = capture_vm();
        run(&mut vm, "1 + 2;").unwrap();
        let value = vm.take_last_popped().unwrap();
        assert_eq!(value.to_string(), "3");
        assert!(vm.take_last_popped().is_none());
    }

    #[test]
    fn test_incremental_load_preserves_bindings() {
        let mut vm = capture_vm();
        run_incremental(&mut vm, "var x = 40;").unwrap();
        run_incremental(&mut vm, "x + 2;").unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "42");
    }

    #[test]
    fn test_incremental_load_dedups_constants_and_names() {
        let mut vm = capture_vm();
        run_incremental(&mut vm, "var x = 42;").unwrap();
        run_incremental(&mut vm, "var y = 42;").unwrap();

        let code = &vm.frames[0].code;
        let forty_twos = code
            .constants
            .iter()
            .filter(|c| c.to_string() == "42")
            .count();
        assert_eq!(forty_twos, 1);
        assert_eq!(code.names.iter().filter(|n| *n == "x").count(), 1);
    }

    #[test]
    fn test_incremental_jump_targets_are_rebased() {
        let mut vm = capture_vm();
        run_incremental(&mut vm, "var x = 0;").unwrap();
        run_incremental(&mut vm, "if true { x = 1; } else { x = 2; }").unwrap();
        run_incremental(&mut vm, "x;").unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "1");
    }

    #[test]
    fn test_recover_after_error() {
        let mut vm = capture_vm();
        run_incremental(&mut vm, "var x = 1;").unwrap();
        assert!(run_incremental(&mut vm, "missing;").is_err());
        vm.recover();
        assert_eq!(vm.stack_depth(), 0);
        run_incremental(&mut vm, "x;").unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "1");
    }

    #[test]
    fn test_runtime_error_carries_line() {
        let mut vm = capture_vm();
        let err = run(&mut vm, "var a = 1;\nmissing;").unwrap_err();
        assert_eq!(err.line(), Some(2));
    }
}
