//! Operator opcodes: magic-method dispatch plus the direct (non-magic)
//! logical, identity, and unary operations.

use crate::vm::Vm;
use num_rational::BigRational;
use rill_core::value::magic::MagicOp;
use rill_core::{RillError, RillResult, Type, Value};

impl Vm {
    /// Binary operator via the magic-method protocol: pop `b` then `a`,
    /// dispatch on `a`'s type, push the result.
    pub(crate) fn binary_magic(&mut self, op: MagicOp) -> RillResult<()> {
        let b = self.pop_operand(op.symbol())?;
        let a = self.pop_operand(op.symbol())?;
        let result = self.dispatch_binary(op, a, b)?;
        self.push(result);
        Ok(())
    }

    /// Dispatch a binary magic operation, promoting mixed Int/Rational
    /// operands to Rational first.
    pub(crate) fn dispatch_binary(&self, op: MagicOp, a: Value, b: Value) -> RillResult<Value> {
        let (a, b) = promote_mixed(a, b);
        match self.magic.lookup(a.type_of(), op) {
            Some(handler) => handler(&a, &[b]),
            None => Err(RillError::type_error(format!(
                "unsupported operation '{}' between {} and {}",
                op.symbol(),
                a.type_of(),
                b.type_of()
            ))),
        }
    }

    /// `OP_IN`: with stack `[a, b]`, ask the container `b` whether it
    /// contains `a`.
    pub(crate) fn exec_in(&mut self) -> RillResult<()> {
        let container = self.pop_operand("in")?;
        let needle = self.pop_operand("in")?;
        match self.magic.lookup(container.type_of(), MagicOp::In) {
            Some(handler) => {
                let result = handler(&container, &[needle])?;
                self.push(result);
                Ok(())
            }
            None => Err(RillError::type_error(format!(
                "{} does not support membership tests",
                container.type_of()
            ))),
        }
    }

    /// `OP_NEG`: numeric negation.
    pub(crate) fn exec_neg(&mut self) -> RillResult<()> {
        let value = self.pop_operand("-")?;
        let negated = match value.type_of() {
            Type::Int => value.as_int().map(|i| Value::int(-i.clone())),
            Type::Rational => value.as_rational().map(|r| Value::rational(-r.clone())),
            _ => None,
        };
        match negated {
            Some(result) => {
                self.push(result);
                Ok(())
            }
            None => Err(RillError::type_error(format!(
                "cannot negate {}",
                value.type_of()
            ))),
        }
    }

    /// `OP_NOT`: boolean negation, Bool only.
    pub(crate) fn exec_not(&mut self) -> RillResult<()> {
        let value = self.pop_operand("not")?;
        match value.as_bool() {
            Some(b) => {
                self.push(Value::bool(!b));
                Ok(())
            }
            None => Err(RillError::type_error(format!(
                "'not' requires a Bool operand, got {}",
                value.type_of()
            ))),
        }
    }

    /// `OP_AND`: Bool conjunction, no short circuit.
    pub(crate) fn exec_and(&mut self) -> RillResult<()> {
        let (a, b) = self.pop_bool_pair("and")?;
        self.push(Value::bool(a && b));
        Ok(())
    }

    /// `OP_OR`: Bool disjunction, no short circuit.
    pub(crate) fn exec_or(&mut self) -> RillResult<()> {
        let (a, b) = self.pop_bool_pair("or")?;
        self.push(Value::bool(a || b));
        Ok(())
    }

    /// `OP_IS`: pointer identity.
    pub(crate) fn exec_is(&mut self) -> RillResult<()> {
        let b = self.pop_operand("is")?;
        let a = self.pop_operand("is")?;
        self.push(Value::bool(a.ptr_eq(&b)));
        Ok(())
    }

    fn pop_bool_pair(&mut self, op: &str) -> RillResult<(bool, bool)> {
        let rhs = self.pop_operand(op)?;
        let lhs = self.pop_operand(op)?;
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(RillError::type_error(format!(
                "'{}' requires Bool operands, got {} and {}",
                op,
                lhs.type_of(),
                rhs.type_of()
            ))),
        }
    }
}

/// When an Int and a Rational meet, promote the Int to `Rational(int, 1)`.
fn promote_mixed(a: Value, b: Value) -> (Value, Value) {
    match (a.type_of(), b.type_of()) {
        (Type::Int, Type::Rational) => (promote_int(&a), b),
        (Type::Rational, Type::Int) => (a, promote_int(&b)),
        _ => (a, b),
    }
}

fn promote_int(value: &Value) -> Value {
    match value.as_int() {
        Some(i) => Value::rational(BigRational::from_integer(i.clone())),
        None => value.clone(),
    }
}
