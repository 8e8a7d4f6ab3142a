//! AST → bytecode lowering.
//!
//! The compiler walks statements and expressions, appending instructions
//! to four growing tables: the instruction stream, the constant pool (with
//! de-duplication of scalar constants), the name table, and the line map.
//! Jumps are emitted with a placeholder operand and back-patched once the
//! target is known; `break` jumps collect on a per-loop context and are
//! patched at loop exit. Function bodies compile in a nested compiler
//! instance whose result is interned as a constant.

use num_bigint::BigInt;
use num_rational::BigRational;
use rill_core::bytecode::{CodeObject, Instruction, LineMapEntry, Opcode};
use rill_core::{RillError, RillResult, Type, Value};
use rill_parser::ast::{BinaryOp, Expr, ExprKind, Module, Stmt, StmtKind, UnaryOp};
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};
use std::rc::Rc;

/// Placeholder operand for a jump whose target is not yet known.
const UNPATCHED: u32 = u32::MAX;

/// Compile a parsed module into its top-level code object.
pub fn compile_module(module: &Module, name: &str) -> RillResult<CodeObject> {
    let mut compiler = Compiler::new(name);
    compiler.compile_body(&module.body)?;
    Ok(compiler.finish())
}

/// Convenience: run the whole front end over source text.
pub fn compile_source(source: &str, name: &str) -> RillResult<CodeObject> {
    let tokens = rill_parser::lexer::tokenize(source)?;
    let module = rill_parser::parser::parse(tokens)?;
    compile_module(&module, name)
}

/// Loop context: where `continue` jumps back to, and the `break` jumps
/// still waiting for the exit pc.
struct LoopContext {
    entry: u32,
    break_jumps: Vec<usize>,
}

/// The bytecode compiler for one code object.
pub struct Compiler {
    name: String,
    instructions: Vec<Instruction>,
    constants: Vec<Value>,
    constant_map: FxHashMap<(Type, String), u32>,
    names: Vec<String>,
    name_map: FxHashMap<String, u32>,
    line_map: Vec<LineMapEntry>,
    loops: Vec<LoopContext>,
}

impl Compiler {
    /// Create a compiler for a code object with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            constants: Vec::new(),
            constant_map: FxHashMap::default(),
            names: Vec::new(),
            name_map: FxHashMap::default(),
            line_map: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Finish compilation and produce the code object.
    #[must_use]
    pub fn finish(self) -> CodeObject {
        CodeObject {
            name: self.name,
            instructions: self.instructions,
            constants: self.constants,
            names: self.names,
            line_map: self.line_map,
        }
    }

    // =========================================================================
    // Interning
    // =========================================================================

    /// Intern an identifier, returning its index in the name table.
    pub fn intern_name(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.name_map.get(name) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.names.push(name.to_string());
        self.name_map.insert(name.to_string(), idx);
        idx
    }

    /// Intern a constant, returning its index in the constant pool.
    ///
    /// Scalar constants (nil, booleans, numbers, strings) de-duplicate by
    /// type tag plus rendered text; compound constants always append.
    pub fn intern_const(&mut self, value: Value) -> u32 {
        let dedup = matches!(
            value.type_of(),
            Type::Nil | Type::Bool | Type::Int | Type::Rational | Type::Str
        );
        if dedup {
            let key = (value.type_of(), value.to_string());
            if let Some(&idx) = self.constant_map.get(&key) {
                return idx;
            }
            let idx = self.constants.len() as u32;
            self.constants.push(value);
            self.constant_map.insert(key, idx);
            idx
        } else {
            let idx = self.constants.len() as u32;
            self.constants.push(value);
            idx
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Append an instruction, recording its line in the line map.
    fn emit(&mut self, opcode: Opcode, operands: SmallVec<[u32; 2]>, lines: (u32, u32)) -> usize {
        let pc = self.instructions.len();
        if self.line_map.last().map(|entry| entry.line) != Some(lines.0) {
            self.line_map.push(LineMapEntry {
                pc: pc as u32,
                line: lines.0,
            });
        }
        self.instructions.push(Instruction::new(opcode, operands, lines));
        pc
    }

    /// Append an operand-less instruction.
    fn emit_op(&mut self, opcode: Opcode, lines: (u32, u32)) -> usize {
        self.emit(opcode, SmallVec::new(), lines)
    }

    /// Append a jump with a placeholder target, to be patched later.
    fn emit_jump(&mut self, opcode: Opcode, lines: (u32, u32)) -> usize {
        self.emit(opcode, smallvec![UNPATCHED], lines)
    }

    /// Patch the jump at `at` to target the next instruction slot.
    fn patch_jump(&mut self, at: usize) {
        let target = self.instructions.len() as u32;
        self.instructions[at].operands[0] = target;
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Compile a statement list.
    pub fn compile_body(&mut self, body: &[Stmt]) -> RillResult<()> {
        for stmt in body {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> RillResult<()> {
        let lines = stmt.lines;
        match &stmt.kind {
            StmtKind::VarDecl { name, value } | StmtKind::Assign { name, value } => {
                self.compile_expr(value)?;
                let idx = self.intern_name(name);
                self.emit(Opcode::SetLocal, smallvec![idx], lines);
            }
            StmtKind::SetMember {
                object,
                name,
                value,
            } => {
                self.compile_expr(object)?;
                self.compile_expr(value)?;
                let idx = self.intern_name(name);
                self.emit(Opcode::SetAttr, smallvec![idx], lines);
            }
            StmtKind::FuncDef { name, params, body } => {
                let code = compile_function(name, params, body, lines)?;
                let func = Value::function(name.clone(), Rc::new(code), params.len());
                let const_idx = self.intern_const(func);
                self.emit(Opcode::LoadConst, smallvec![const_idx], lines);
                let name_idx = self.intern_name(name);
                self.emit(Opcode::SetLocal, smallvec![name_idx], lines);
            }
            StmtKind::If { test, body, orelse } => {
                self.compile_expr(test)?;
                let to_else = self.emit_jump(Opcode::JumpIfFalse, lines);
                self.compile_body(body)?;
                let to_end = self.emit_jump(Opcode::Jump, lines);
                self.patch_jump(to_else);
                self.compile_body(orelse)?;
                self.patch_jump(to_end);
            }
            StmtKind::While { test, body } => {
                let entry = self.instructions.len() as u32;
                self.loops.push(LoopContext {
                    entry,
                    break_jumps: Vec::new(),
                });
                self.compile_expr(test)?;
                let to_exit = self.emit_jump(Opcode::JumpIfFalse, lines);
                self.compile_body(body)?;
                self.emit(Opcode::Jump, smallvec![entry], lines);
                self.patch_jump(to_exit);
                if let Some(ctx) = self.loops.pop() {
                    for at in ctx.break_jumps {
                        self.patch_jump(at);
                    }
                }
            }
            StmtKind::Break => {
                if self.loops.is_empty() {
                    return Err(RillError::ir("'break' outside of a loop", lines.0));
                }
                let at = self.emit_jump(Opcode::Jump, lines);
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.break_jumps.push(at);
                }
            }
            StmtKind::Continue => {
                let Some(entry) = self.loops.last().map(|ctx| ctx.entry) else {
                    return Err(RillError::ir("'continue' outside of a loop", lines.0));
                };
                self.emit(Opcode::Jump, smallvec![entry], lines);
            }
            StmtKind::Return(value) => {
                match value {
                    Some(expr) => self.compile_expr(expr)?,
                    None => {
                        let idx = self.intern_const(Value::nil());
                        self.emit(Opcode::LoadConst, smallvec![idx], lines);
                    }
                }
                self.emit_op(Opcode::Ret, lines);
            }
            StmtKind::Import { name } => {
                let idx = self.intern_name(name);
                self.emit(Opcode::Import, smallvec![idx], lines);
                self.emit(Opcode::SetLocal, smallvec![idx], lines);
            }
            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                self.emit_op(Opcode::PopTop, lines);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn compile_expr(&mut self, expr: &Expr) -> RillResult<()> {
        let lines = expr.lines;
        match &expr.kind {
            ExprKind::Number(text) => {
                let value = number_value(text, lines.0)?;
                let idx = self.intern_const(value);
                self.emit(Opcode::LoadConst, smallvec![idx], lines);
            }
            ExprKind::Str(text) => {
                let idx = self.intern_const(Value::str(text.clone()));
                self.emit(Opcode::LoadConst, smallvec![idx], lines);
            }
            ExprKind::Bool(b) => {
                let idx = self.intern_const(Value::bool(*b));
                self.emit(Opcode::LoadConst, smallvec![idx], lines);
            }
            ExprKind::Nil => {
                let idx = self.intern_const(Value::nil());
                self.emit(Opcode::LoadConst, smallvec![idx], lines);
            }
            ExprKind::Ident(name) => {
                let idx = self.intern_name(name);
                self.emit(Opcode::LoadVar, smallvec![idx], lines);
            }
            ExprKind::Binary { op, left, right } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.compile_binary_op(*op, lines);
            }
            ExprKind::Unary { op, operand } => {
                self.compile_expr(operand)?;
                match op {
                    UnaryOp::Neg => self.emit_op(Opcode::Neg, lines),
                    UnaryOp::Not => self.emit_op(Opcode::Not, lines),
                };
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(Opcode::MakeList, smallvec![args.len() as u32], lines);
                self.compile_expr(callee)?;
                self.emit_op(Opcode::Call, lines);
            }
            ExprKind::GetMember { object, name } => {
                self.compile_expr(object)?;
                let idx = self.intern_name(name);
                self.emit(Opcode::GetAttr, smallvec![idx], lines);
            }
            ExprKind::GetItem { .. } => {
                return Err(RillError::ir(
                    "index expressions are not supported",
                    lines.0,
                ));
            }
            ExprKind::List(items) => {
                for item in items {
                    self.compile_expr(item)?;
                }
                self.emit(Opcode::MakeList, smallvec![items.len() as u32], lines);
            }
            ExprKind::Dict(entries) => {
                for (key, value) in entries {
                    let idx = self.intern_const(Value::str(key.clone()));
                    self.emit(Opcode::LoadConst, smallvec![idx], lines);
                    self.compile_expr(value)?;
                }
                self.emit(Opcode::MakeDict, smallvec![entries.len() as u32], lines);
            }
            ExprKind::Lambda { params, body } => {
                let code = compile_lambda(params, body, lines)?;
                let func = Value::function("<lambda>", Rc::new(code), params.len());
                let idx = self.intern_const(func);
                self.emit(Opcode::LoadConst, smallvec![idx], lines);
            }
        }
        Ok(())
    }

    /// Emit the opcode sequence for a binary operator. The compound
    /// comparisons lower onto the primitive ones plus `OP_NOT`.
    fn compile_binary_op(&mut self, op: BinaryOp, lines: (u32, u32)) {
        match op {
            BinaryOp::Add => self.emit_op(Opcode::Add, lines),
            BinaryOp::Sub => self.emit_op(Opcode::Sub, lines),
            BinaryOp::Mul => self.emit_op(Opcode::Mul, lines),
            BinaryOp::Div => self.emit_op(Opcode::Div, lines),
            BinaryOp::Mod => self.emit_op(Opcode::Mod, lines),
            BinaryOp::Pow => self.emit_op(Opcode::Pow, lines),
            BinaryOp::Eq => self.emit_op(Opcode::Eq, lines),
            BinaryOp::Lt => self.emit_op(Opcode::Lt, lines),
            BinaryOp::Gt => self.emit_op(Opcode::Gt, lines),
            BinaryOp::And => self.emit_op(Opcode::And, lines),
            BinaryOp::Or => self.emit_op(Opcode::Or, lines),
            BinaryOp::Is => self.emit_op(Opcode::Is, lines),
            BinaryOp::In => self.emit_op(Opcode::In, lines),
            BinaryOp::NotEq => {
                self.emit_op(Opcode::Eq, lines);
                self.emit_op(Opcode::Not, lines)
            }
            BinaryOp::LtEq => {
                self.emit_op(Opcode::Gt, lines);
                self.emit_op(Opcode::Not, lines)
            }
            BinaryOp::GtEq => {
                self.emit_op(Opcode::Lt, lines);
                self.emit_op(Opcode::Not, lines)
            }
            BinaryOp::NotIn => {
                self.emit_op(Opcode::In, lines);
                self.emit_op(Opcode::Not, lines)
            }
        };
    }

    /// Whether the last emitted opcode is a `RET`.
    fn ends_with_ret(&self) -> bool {
        matches!(
            self.instructions.last(),
            Some(inst) if inst.opcode == Opcode::Ret
        )
    }

    /// Guarantee the code object ends by returning: append
    /// `LOAD_CONST Nil; RET` unless the last instruction already returns.
    fn ensure_ret(&mut self, lines: (u32, u32)) {
        if !self.ends_with_ret() {
            let idx = self.intern_const(Value::nil());
            self.emit(Opcode::LoadConst, smallvec![idx], lines);
            self.emit_op(Opcode::Ret, lines);
        }
    }
}

/// Compile a named function body in a fresh compiler context. The
/// parameters intern first so the code object's leading names line up
/// with the call protocol's argument binding.
fn compile_function(
    name: &str,
    params: &[String],
    body: &[Stmt],
    lines: (u32, u32),
) -> RillResult<CodeObject> {
    let mut inner = Compiler::new(name);
    for param in params {
        inner.intern_name(param);
    }
    inner.compile_body(body)?;
    inner.ensure_ret((lines.1, lines.1));
    Ok(inner.finish())
}

/// Compile a lambda body expression: the value is implicitly returned.
fn compile_lambda(params: &[String], body: &Expr, lines: (u32, u32)) -> RillResult<CodeObject> {
    let mut inner = Compiler::new("<lambda>");
    for param in params {
        inner.intern_name(param);
    }
    inner.compile_expr(body)?;
    inner.emit_op(Opcode::Ret, lines);
    Ok(inner.finish())
}

/// Build the runtime value of a number literal.
///
/// Integer forms (including non-negative exponents) become Int; forms
/// with a fractional part or negative exponent become an exact Rational,
/// collapsing back to Int when the denominator divides away.
fn number_value(text: &str, line: u32) -> RillResult<Value> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => {
            let exp: i64 = text[at + 1..]
                .parse()
                .map_err(|_| RillError::ir(format!("invalid number literal '{}'", text), line))?;
            (&text[..at], exp)
        }
        None => (text, 0),
    };

    let (int_part, frac_part) = match mantissa.find('.') {
        Some(at) => (&mantissa[..at], &mantissa[at + 1..]),
        None => (mantissa, ""),
    };

    let mut digits = String::with_capacity(int_part.len() + frac_part.len());
    digits.push_str(int_part);
    digits.push_str(frac_part);
    if digits.is_empty() {
        return Err(RillError::ir(
            format!("invalid number literal '{}'", text),
            line,
        ));
    }

    let value = BigInt::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| RillError::ir(format!("invalid number literal '{}'", text), line))?;

    let scale = exponent - frac_part.len() as i64;
    if scale >= 0 {
        let factor = num_traits::pow(BigInt::from(10), scale as usize);
        Ok(Value::int(value * factor))
    } else {
        let denom = num_traits::pow(BigInt::from(10), (-scale) as usize);
        let ratio = BigRational::new(value, denom);
        if ratio.is_integer() {
            Ok(Value::int(ratio.to_integer()))
        } else {
            Ok(Value::rational(ratio))
        }
    }
}
