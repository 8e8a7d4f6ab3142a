//! Constant loads, variable resolution, attribute access, and imports.

use crate::vm::Vm;
use rill_core::{Instruction, RillError, RillResult};

impl Vm {
    /// `LOAD_CONST const-idx`: push a constant from the active pool.
    pub(crate) fn exec_load_const(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let frame = self.frame()?;
        let value = frame
            .code
            .constants
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| RillError::stack_error(format!("constant index {} out of range", idx)))?;
        self.push(value);
        Ok(())
    }

    /// `LOAD_VAR name-idx`: resolve a name against the active frame's
    /// locals, then the enclosing live frames down to the module frame,
    /// then the builtins map.
    pub(crate) fn exec_load_var(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;

        let resolved = self
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.locals.get(&name).cloned())
            .or_else(|| self.builtins.get(&name).cloned());
        match resolved {
            Some(value) => {
                self.push(value);
                Ok(())
            }
            None => Err(RillError::name_error(format!("undefined name '{}'", name))),
        }
    }

    /// `SET_LOCAL name-idx`: pop into the active frame's locals.
    pub(crate) fn exec_set_local(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        let value = self.pop_operand("SET_LOCAL")?;
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.insert(name, value);
        }
        Ok(())
    }

    /// `SET_GLOBAL name-idx`: pop into the module frame's locals.
    pub(crate) fn exec_set_global(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        let value = self.pop_operand("SET_GLOBAL")?;
        if let Some(frame) = self.frames.first_mut() {
            frame.locals.insert(name, value);
        }
        Ok(())
    }

    /// `SET_NONLOCAL name-idx`: pop into the nearest enclosing frame that
    /// already binds the name; error when none does.
    pub(crate) fn exec_set_nonlocal(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        let value = self.pop_operand("SET_NONLOCAL")?;

        let top = self.frames.len().saturating_sub(1);
        let target = self.frames[..top]
            .iter()
            .rposition(|frame| frame.locals.contains_key(&name));
        match target {
            Some(idx) => {
                self.frames[idx].locals.insert(name, value);
                Ok(())
            }
            None => Err(RillError::name_error(format!(
                "no enclosing binding for nonlocal '{}'",
                name
            ))),
        }
    }

    /// `GET_ATTR name-idx`: replace the top with one of its attributes.
    pub(crate) fn exec_get_attr(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        let object = self.pop_operand("GET_ATTR")?;
        match object.get_attr(&name) {
            Some(value) => {
                self.push(value);
                Ok(())
            }
            None => Err(RillError::attr_error(format!(
                "{} object has no attribute '{}'",
                object.type_of(),
                name
            ))),
        }
    }

    /// `SET_ATTR name-idx`: stack `[obj, val]`; store the attribute.
    pub(crate) fn exec_set_attr(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        let value = self.pop_operand("SET_ATTR")?;
        let object = self.pop_operand("SET_ATTR")?;
        object.set_attr(name, value);
        Ok(())
    }

    /// `IMPORT name-idx`: resolve a module in the registry and push it.
    pub(crate) fn exec_import(&mut self, inst: &Instruction) -> RillResult<()> {
        let idx = self.operand(inst)?;
        let name = self.name_at(idx)?;
        match self.modules.resolve(&name) {
            Some(module) => {
                self.push(module);
                Ok(())
            }
            None => Err(RillError::name_error(format!(
                "module '{}' is not registered",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::vm::Vm;
    use rill_core::{BufferHost, RillError, RillResult, RuntimeErrorKind};

    fn run_source(source: &str) -> (Vm, RillResult<()>) {
        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        let code = rill_compiler::compile_source(source, "<test>").unwrap();
        let result = vm.load(code);
        (vm, result)
    }

    fn kind_of(err: &RillError) -> RuntimeErrorKind {
        match err {
            RillError::Runtime { kind, .. } => *kind,
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_name() {
        let (_, result) = run_source("missing;");
        assert_eq!(kind_of(&result.unwrap_err()), RuntimeErrorKind::Name);
    }

    #[test]
    fn test_function_reads_module_binding() {
        let (mut vm, result) = run_source("var g = 10; func f() { return g + 1; } f();");
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "11");
    }

    #[test]
    fn test_locals_shadow_globals() {
        let (mut vm, result) =
            run_source("var x = 1; func f() { var x = 2; return x; } f();");
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "2");
    }

    #[test]
    fn test_attr_roundtrip() {
        let (mut vm, result) = run_source("var d = { a = 1 }; d.a = d.a + 1; d.a;");
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "2");
    }

    #[test]
    fn test_missing_attr() {
        let (_, result) = run_source("var d = { a = 1 }; d.b;");
        let err = result.unwrap_err();
        assert_eq!(kind_of(&err), RuntimeErrorKind::Attr);
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_import_math() {
        let (mut vm, result) = run_source("import math; math::pi;");
        result.unwrap();
        assert_eq!(vm.take_last_popped().unwrap().to_string(), "314159/100000");
    }

    #[test]
    fn test_unknown_module() {
        let (_, result) = run_source("import nosuch;");
        assert_eq!(kind_of(&result.unwrap_err()), RuntimeErrorKind::Name);
    }

    #[test]
    fn test_set_global_and_set_nonlocal() {
        use rill_core::bytecode::{CodeObject, Instruction, Opcode};
        use rill_core::{BufferHost, Value};
        use std::rc::Rc;

        // A function body that rebinds the enclosing `x` via SET_NONLOCAL
        // and defines `g` via SET_GLOBAL, then returns nil.
        let mut body = CodeObject::new("writer");
        body.names = vec!["x".to_string(), "g".to_string()];
        body.constants = vec![Value::int(99), Value::int(7), Value::nil()];
        body.instructions = vec![
            Instruction::op1(Opcode::LoadConst, 0, (1, 1)),
            Instruction::op1(Opcode::SetNonlocal, 0, (1, 1)),
            Instruction::op1(Opcode::LoadConst, 1, (1, 1)),
            Instruction::op1(Opcode::SetGlobal, 1, (1, 1)),
            Instruction::op1(Opcode::LoadConst, 2, (1, 1)),
            Instruction::op(Opcode::Ret, (1, 1)),
        ];

        let mut module = CodeObject::new("<module>");
        module.names = vec!["x".to_string()];
        module.constants = vec![
            Value::int(1),
            Value::function("writer", Rc::new(body), 0),
        ];
        module.instructions = vec![
            Instruction::op1(Opcode::LoadConst, 0, (1, 1)),
            Instruction::op1(Opcode::SetLocal, 0, (1, 1)),
            Instruction::op1(Opcode::MakeList, 0, (1, 1)),
            Instruction::op1(Opcode::LoadConst, 1, (1, 1)),
            Instruction::op(Opcode::Call, (1, 1)),
            Instruction::op(Opcode::PopTop, (1, 1)),
        ];

        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        vm.load(module).unwrap();
        let locals = &vm.frames[0].locals;
        assert_eq!(locals.get("x").unwrap().to_string(), "99");
        assert_eq!(locals.get("g").unwrap().to_string(), "7");
    }

    #[test]
    fn test_set_nonlocal_without_binding() {
        use rill_core::bytecode::{CodeObject, Instruction, Opcode};
        use rill_core::{BufferHost, Value};

        let mut module = CodeObject::new("<module>");
        module.names = vec!["ghost".to_string()];
        module.constants = vec![Value::int(1)];
        module.instructions = vec![
            Instruction::op1(Opcode::LoadConst, 0, (1, 1)),
            Instruction::op1(Opcode::SetNonlocal, 0, (1, 1)),
        ];

        let mut vm = Vm::with_host(Box::new(BufferHost::new()));
        let err = vm.load(module).unwrap_err();
        assert_eq!(kind_of(&err), RuntimeErrorKind::Name);
    }
}
