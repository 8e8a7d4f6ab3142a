//! The `math` native module.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;
use rill_core::{Host, RillError, RillResult, Type, Value};

/// Build the `math` module object.
#[must_use]
pub fn init() -> Value {
    let module = Value::module("math");
    module.set_attr(
        "pi",
        Value::rational(BigRational::new(BigInt::from(314_159), BigInt::from(100_000))),
    );
    module.set_attr("abs", Value::native("abs", math_abs));
    module.set_attr("gcd", Value::native("gcd", math_gcd));
    module
}

/// `math.abs(x)`: absolute value of an Int or Rational.
fn math_abs(_host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let [value] = args else {
        return Err(RillError::arity_error(format!(
            "abs() takes 1 argument, got {}",
            args.len()
        )));
    };
    match value.type_of() {
        Type::Int => Ok(Value::int(value.as_int().map(|i| i.abs()).unwrap_or_default())),
        Type::Rational => match value.as_rational() {
            Some(r) => Ok(Value::rational(r.abs())),
            None => Err(RillError::type_error("abs() expects a number")),
        },
        other => Err(RillError::type_error(format!(
            "abs() expects a number, got {}",
            other
        ))),
    }
}

/// `math.gcd(a, b)`: greatest common divisor of two Ints; gcd(0, 0) = 0.
fn math_gcd(_host: &mut dyn Host, _receiver: &Value, args: &[Value]) -> RillResult<Value> {
    let [a, b] = args else {
        return Err(RillError::arity_error(format!(
            "gcd() takes 2 arguments, got {}",
            args.len()
        )));
    };
    let (Some(a), Some(b)) = (a.as_int(), b.as_int()) else {
        return Err(RillError::type_error("gcd() expects two Ints"));
    };

    let mut x = a.abs();
    let mut y = b.abs();
    while !num_traits::Zero::is_zero(&y) {
        let r = &x % &y;
        x = y;
        y = r;
    }
    Ok(Value::int(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_shape() {
        let module = init();
        assert_eq!(module.to_string(), "<module \"math\">");
        assert_eq!(module.get_attr("pi").unwrap().to_string(), "314159/100000");
        assert!(module.get_attr("abs").is_some());
        assert!(module.get_attr("gcd").is_some());
    }

    #[test]
    fn test_abs() {
        let mut host = rill_core::BufferHost::new();
        let result = math_abs(&mut host, &Value::nil(), &[Value::int(-5)]).unwrap();
        assert_eq!(result.to_string(), "5");

        let r = Value::rational(BigRational::new(BigInt::from(-1), BigInt::from(2)));
        let result = math_abs(&mut host, &Value::nil(), &[r]).unwrap();
        assert_eq!(result.to_string(), "1/2");
    }

    #[test]
    fn test_gcd() {
        let gcd = |a: i64, b: i64| {
            let mut host = rill_core::BufferHost::new();
            math_gcd(&mut host, &Value::nil(), &[Value::int(a), Value::int(b)])
                .unwrap()
                .to_string()
        };
        assert_eq!(gcd(12, 18), "6");
        assert_eq!(gcd(-12, 18), "6");
        assert_eq!(gcd(0, 0), "0");
        assert_eq!(gcd(7, 13), "1");
    }
}
