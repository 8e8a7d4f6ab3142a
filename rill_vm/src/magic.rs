//! Standard magic-method registration.
//!
//! Populates the per-type dispatch tables with the built-in operator
//! behavior: exact integer and rational arithmetic, string and list
//! concatenation/repetition/membership, dict merge and key membership,
//! and equality for booleans and nil. Mixed Int/Rational operands are
//! promoted before dispatch, so each handler sees its own numeric kind.

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use rill_core::value::magic::{MagicOp, TypeTables};
use rill_core::{RillError, RillResult, Type, Value};

/// Build the standard tables installed at VM construction.
#[must_use]
pub fn standard_tables() -> TypeTables {
    let mut tables = TypeTables::new();

    let int = tables.table_mut(Type::Int);
    int.set(MagicOp::Add, int_add);
    int.set(MagicOp::Sub, int_sub);
    int.set(MagicOp::Mul, int_mul);
    int.set(MagicOp::Div, int_div);
    int.set(MagicOp::Mod, int_mod);
    int.set(MagicOp::Pow, int_pow);
    int.set(MagicOp::Eq, int_eq);
    int.set(MagicOp::Lt, int_lt);
    int.set(MagicOp::Gt, int_gt);

    let rational = tables.table_mut(Type::Rational);
    rational.set(MagicOp::Add, rational_add);
    rational.set(MagicOp::Sub, rational_sub);
    rational.set(MagicOp::Mul, rational_mul);
    rational.set(MagicOp::Div, rational_div);
    rational.set(MagicOp::Eq, rational_eq);
    rational.set(MagicOp::Lt, rational_lt);
    rational.set(MagicOp::Gt, rational_gt);

    let string = tables.table_mut(Type::Str);
    string.set(MagicOp::Add, str_add);
    string.set(MagicOp::Mul, str_mul);
    string.set(MagicOp::In, str_in);
    string.set(MagicOp::Eq, str_eq);

    let list = tables.table_mut(Type::List);
    list.set(MagicOp::Add, list_add);
    list.set(MagicOp::Mul, list_mul);
    list.set(MagicOp::In, list_in);
    list.set(MagicOp::Eq, list_eq);

    let dict = tables.table_mut(Type::Dict);
    dict.set(MagicOp::Add, dict_add);
    dict.set(MagicOp::In, dict_in);

    tables.table_mut(Type::Bool).set(MagicOp::Eq, bool_eq);
    tables.table_mut(Type::Nil).set(MagicOp::Eq, nil_eq);

    tables
}

// =============================================================================
// Shared Helpers
// =============================================================================

fn one_arg<'a>(args: &'a [Value], what: &str) -> RillResult<&'a Value> {
    match args {
        [arg] => Ok(arg),
        _ => Err(RillError::type_error(format!(
            "{} takes exactly one operand, got {}",
            what,
            args.len()
        ))),
    }
}

fn unsupported(op: &str, lhs: Type, rhs: Type) -> RillError {
    RillError::type_error(format!(
        "unsupported operation '{}' between {} and {}",
        op, lhs, rhs
    ))
}

fn repeat_count(value: &Value, receiver: Type) -> RillResult<usize> {
    let Some(count) = value.as_int() else {
        return Err(unsupported("*", receiver, value.type_of()));
    };
    if count.sign() == Sign::Minus {
        return Err(RillError::arith_error(format!(
            "cannot repeat {} a negative number of times",
            receiver
        )));
    }
    count
        .to_usize()
        .ok_or_else(|| RillError::arith_error("repeat count too large"))
}

/// Structural equality used by list membership and list equality:
/// scalars compare by value (numbers across Int/Rational), lists
/// element-wise, everything else by identity.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.type_of(), b.type_of()) {
        (Type::Nil, Type::Nil) => true,
        (Type::Bool, Type::Bool) => a.as_bool() == b.as_bool(),
        (Type::Int, Type::Int) => a.as_int() == b.as_int(),
        (Type::Rational, Type::Rational) => a.as_rational() == b.as_rational(),
        (Type::Int, Type::Rational) => a
            .as_int()
            .zip(b.as_rational())
            .is_some_and(|(i, r)| &BigRational::from_integer(i.clone()) == r),
        (Type::Rational, Type::Int) => values_equal(b, a),
        (Type::Str, Type::Str) => a.as_str() == b.as_str(),
        (Type::List, Type::List) => match (a.list_items(), b.list_items()) {
            (Some(xs), Some(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| values_equal(x, y))
            }
            _ => false,
        },
        _ => a.ptr_eq(b),
    }
}

// =============================================================================
// Int
// =============================================================================

fn int_pair<'a>(receiver: &'a Value, args: &'a [Value], op: &str) -> RillResult<(&'a BigInt, &'a BigInt)> {
    let arg = one_arg(args, op)?;
    match (receiver.as_int(), arg.as_int()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(op, receiver.type_of(), arg.type_of())),
    }
}

fn int_add(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "+")?;
    Ok(Value::int(a + b))
}

fn int_sub(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "-")?;
    Ok(Value::int(a - b))
}

fn int_mul(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "*")?;
    Ok(Value::int(a * b))
}

/// Int division always produces a Rational; the pool keeps it exact.
fn int_div(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "/")?;
    if b.is_zero() {
        return Err(RillError::arith_error("division by zero"));
    }
    Ok(Value::rational(BigRational::new(a.clone(), b.clone())))
}

/// Modulo with the remainder taking the divisor's sign.
fn int_mod(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "%")?;
    if b.is_zero() {
        return Err(RillError::arith_error("modulo by zero"));
    }
    let mut remainder = a % b;
    if !remainder.is_zero() && remainder.sign() != b.sign() {
        remainder += b;
    }
    Ok(Value::int(remainder))
}

fn int_pow(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "^")?;
    if b.is_negative() {
        return Err(RillError::arith_error(
            "negative exponent in integer power",
        ));
    }
    let exponent = b
        .to_usize()
        .ok_or_else(|| RillError::arith_error("exponent too large"))?;
    Ok(Value::int(num_traits::pow(a.clone(), exponent)))
}

fn int_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(values_equal(receiver, arg)))
}

fn int_lt(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, "<")?;
    Ok(Value::bool(a < b))
}

fn int_gt(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = int_pair(receiver, args, ">")?;
    Ok(Value::bool(a > b))
}

// =============================================================================
// Rational
// =============================================================================

fn rational_pair<'a>(
    receiver: &'a Value,
    args: &'a [Value],
    op: &str,
) -> RillResult<(&'a BigRational, &'a BigRational)> {
    let arg = one_arg(args, op)?;
    match (receiver.as_rational(), arg.as_rational()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(unsupported(op, receiver.type_of(), arg.type_of())),
    }
}

fn rational_add(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, "+")?;
    Ok(Value::rational(a + b))
}

fn rational_sub(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, "-")?;
    Ok(Value::rational(a - b))
}

fn rational_mul(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, "*")?;
    Ok(Value::rational(a * b))
}

fn rational_div(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, "/")?;
    if b.is_zero() {
        return Err(RillError::arith_error("division by zero"));
    }
    Ok(Value::rational(a / b))
}

fn rational_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(values_equal(receiver, arg)))
}

fn rational_lt(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, "<")?;
    Ok(Value::bool(a < b))
}

fn rational_gt(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let (a, b) = rational_pair(receiver, args, ">")?;
    Ok(Value::bool(a > b))
}

// =============================================================================
// String
// =============================================================================

fn str_add(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "+")?;
    match (receiver.as_str(), arg.as_str()) {
        (Some(a), Some(b)) => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Ok(Value::str(out))
        }
        _ => Err(unsupported("+", receiver.type_of(), arg.type_of())),
    }
}

fn str_mul(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "*")?;
    let Some(text) = receiver.as_str() else {
        return Err(unsupported("*", receiver.type_of(), arg.type_of()));
    };
    let count = repeat_count(arg, Type::Str)?;
    Ok(Value::str(text.repeat(count)))
}

fn str_in(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "in")?;
    match (receiver.as_str(), arg.as_str()) {
        (Some(haystack), Some(needle)) => Ok(Value::bool(haystack.contains(needle))),
        _ => Err(RillError::type_error(format!(
            "String membership requires a String, got {}",
            arg.type_of()
        ))),
    }
}

fn str_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(values_equal(receiver, arg)))
}

// =============================================================================
// List
// =============================================================================

fn list_add(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "+")?;
    match (receiver.list_items(), arg.list_items()) {
        (Some(a), Some(b)) => {
            let mut items = Vec::with_capacity(a.len() + b.len());
            items.extend(a.iter().cloned());
            items.extend(b.iter().cloned());
            Ok(Value::list(items))
        }
        _ => Err(unsupported("+", receiver.type_of(), arg.type_of())),
    }
}

fn list_mul(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "*")?;
    let Some(items) = receiver.list_items() else {
        return Err(unsupported("*", receiver.type_of(), arg.type_of()));
    };
    let count = repeat_count(arg, Type::List)?;
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    Ok(Value::list(out))
}

fn list_in(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "in")?;
    let Some(items) = receiver.list_items() else {
        return Err(unsupported("in", receiver.type_of(), arg.type_of()));
    };
    Ok(Value::bool(items.iter().any(|item| values_equal(item, arg))))
}

fn list_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(values_equal(receiver, arg)))
}

// =============================================================================
// Dict
// =============================================================================

/// Merge two dicts into a new one; the right side wins on key clashes.
fn dict_add(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "+")?;
    if receiver.type_of() != Type::Dict || arg.type_of() != Type::Dict {
        return Err(unsupported("+", receiver.type_of(), arg.type_of()));
    }
    let merged = Value::dict();
    for (key, value) in receiver.attrs().iter() {
        merged.set_attr(key.clone(), value.clone());
    }
    for (key, value) in arg.attrs().iter() {
        merged.set_attr(key.clone(), value.clone());
    }
    Ok(merged)
}

fn dict_in(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "in")?;
    let Some(key) = arg.as_str() else {
        return Err(RillError::type_error(format!(
            "Dict membership requires a String key, got {}",
            arg.type_of()
        )));
    };
    Ok(Value::bool(receiver.get_attr(key).is_some()))
}

// =============================================================================
// Bool / Nil
// =============================================================================

fn bool_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(values_equal(receiver, arg)))
}

fn nil_eq(receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let arg = one_arg(args, "==")?;
    Ok(Value::bool(receiver.is_nil() && arg.is_nil()))
}
