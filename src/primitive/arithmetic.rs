//! Arithmetic primitives.
//!
//! Integer arithmetic is checked: overflow is an evaluation fault rather than
//! a wrapped result. Results follow the type established by the checker, so
//! `(+ 1 2)` stays an integer and `(+ 1 2.0)` is a real.

use super::{
    first_result, int_result, numeric_result, real_result, Arity, EvalRule, Primitive,
    RuleViolation, ANY, INTEGER, NUMERIC,
};
use crate::expression::error::EvalFault;
use crate::expression::types::{Type, TypeSet};
use crate::value::Value;

pub(crate) fn primitives() -> Vec<Primitive> {
    vec![
        Primitive::new("+", Arity::AtLeast(1), &[NUMERIC], numeric_result, EvalRule::Row(add))
            .doc("Sum of the arguments"),
        Primitive::new("-", Arity::AtLeast(1), &[NUMERIC], numeric_result, EvalRule::Row(sub))
            .doc("Negation of one argument, or the first minus the rest"),
        Primitive::new("*", Arity::AtLeast(1), &[NUMERIC], numeric_result, EvalRule::Row(mul))
            .doc("Product of the arguments"),
        Primitive::new("/", Arity::Exact(2), &[NUMERIC], real_result, EvalRule::Row(div))
            .doc("Real division; a zero divisor yields missing"),
        Primitive::new("mod", Arity::Exact(2), &[INTEGER], int_result, EvalRule::Row(modulo))
            .doc("Euclidean remainder; a zero divisor is an evaluation error"),
        Primitive::new("abs", Arity::Exact(1), &[NUMERIC], first_result, EvalRule::Row(abs))
            .doc("Absolute value"),
        Primitive::new("round", Arity::Exact(1), &[NUMERIC], int_result, EvalRule::Row(round))
            .doc("Nearest integer, halves away from zero"),
        Primitive::new("floor", Arity::Exact(1), &[NUMERIC], int_result, EvalRule::Row(floor))
            .doc("Largest integer not above the argument"),
        Primitive::new("ceil", Arity::Exact(1), &[NUMERIC], int_result, EvalRule::Row(ceil))
            .doc("Smallest integer not below the argument"),
        Primitive::new("sqrt", Arity::Exact(1), &[NUMERIC], real_result, EvalRule::Row(sqrt))
            .doc("Square root; negative arguments yield missing"),
        Primitive::new("max", Arity::AtLeast(1), &[NUMERIC], numeric_result, EvalRule::Row(max))
            .doc("Largest argument"),
        Primitive::new("min", Arity::AtLeast(1), &[NUMERIC], numeric_result, EvalRule::Row(min))
            .doc("Smallest argument"),
        Primitive::new("real", Arity::Exact(1), &[ANY], to_real_result, EvalRule::Row(real))
            .doc("Conversion to real; unparsable text yields missing"),
        Primitive::new(
            "integer",
            Arity::Exact(1),
            &[ANY],
            to_int_result,
            EvalRule::Row(integer),
        )
        .doc("Conversion to integer, truncating reals; unparsable text yields missing"),
    ]
}

fn to_real_result(types: &[Type]) -> Result<Type, RuleViolation> {
    convert_rule(types, Type::Real)
}

fn to_int_result(types: &[Type]) -> Result<Type, RuleViolation> {
    convert_rule(types, Type::Int)
}

/// Conversions accept numbers and text
fn convert_rule(types: &[Type], target: Type) -> Result<Type, RuleViolation> {
    match types[0] {
        Type::Int | Type::Real | Type::Text | Type::Null => Ok(target),
        _ => Err(RuleViolation {
            position: 0,
            expected: TypeSet::Numeric,
        }),
    }
}

fn ints(args: &[Value]) -> Result<Vec<i64>, EvalFault> {
    args.iter().map(Value::as_i64).collect()
}

fn reals(args: &[Value]) -> Result<Vec<f64>, EvalFault> {
    args.iter().map(Value::as_f64).collect()
}

fn add(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        ints(args)?
            .into_iter()
            .try_fold(0i64, |acc, n| acc.checked_add(n))
            .map(Value::Int)
            .ok_or(EvalFault::Overflow { operation: "+" })
    } else {
        Ok(Value::Real(reals(args)?.into_iter().sum()))
    }
}

fn sub(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        let ns = ints(args)?;
        let result = match ns.split_first() {
            Some((first, [])) => first.checked_neg(),
            Some((first, rest)) => rest
                .iter()
                .try_fold(*first, |acc, n| acc.checked_sub(*n)),
            None => Some(0),
        };
        result
            .map(Value::Int)
            .ok_or(EvalFault::Overflow { operation: "-" })
    } else {
        let xs = reals(args)?;
        let result = match xs.split_first() {
            Some((first, [])) => -first,
            Some((first, rest)) => rest.iter().fold(*first, |acc, x| acc - x),
            None => 0.0,
        };
        Ok(Value::Real(result))
    }
}

fn mul(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        ints(args)?
            .into_iter()
            .try_fold(1i64, |acc, n| acc.checked_mul(n))
            .map(Value::Int)
            .ok_or(EvalFault::Overflow { operation: "*" })
    } else {
        Ok(Value::Real(reals(args)?.into_iter().product()))
    }
}

fn div(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let num = args[0].as_f64()?;
    let den = args[1].as_f64()?;
    if den == 0.0 {
        return Ok(Value::Missing);
    }
    Ok(Value::Real(num / den))
}

fn modulo(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let a = args[0].as_i64()?;
    let b = args[1].as_i64()?;
    if b == 0 {
        return Err(EvalFault::DivisionByZero);
    }
    a.checked_rem_euclid(b)
        .map(Value::Int)
        .ok_or(EvalFault::Overflow { operation: "mod" })
}

fn abs(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        args[0]
            .as_i64()?
            .checked_abs()
            .map(Value::Int)
            .ok_or(EvalFault::Overflow { operation: "abs" })
    } else {
        Ok(Value::Real(args[0].as_f64()?.abs()))
    }
}

/// Integral real to integer, faulting outside the i64 range
fn to_int(x: f64, operation: &'static str) -> Result<Value, EvalFault> {
    if x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Ok(Value::Int(x as i64))
    } else {
        Err(EvalFault::Overflow { operation })
    }
}

fn rounded(value: &Value, f: fn(f64) -> f64, operation: &'static str) -> Result<Value, EvalFault> {
    match value {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => to_int(f(other.as_f64()?), operation),
    }
}

fn round(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    rounded(&args[0], f64::round, "round")
}

fn floor(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    rounded(&args[0], f64::floor, "floor")
}

fn ceil(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    rounded(&args[0], f64::ceil, "ceil")
}

fn sqrt(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let x = args[0].as_f64()?;
    if x < 0.0 {
        return Ok(Value::Missing);
    }
    Ok(Value::Real(x.sqrt()))
}

fn max(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    extreme(args, ty, true)
}

fn min(args: &[Value], ty: Type) -> Result<Value, EvalFault> {
    extreme(args, ty, false)
}

fn extreme(args: &[Value], ty: Type, largest: bool) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        let best = ints(args)?
            .into_iter()
            .reduce(|a, b| if largest { a.max(b) } else { a.min(b) });
        Ok(best.map(Value::Int).unwrap_or(Value::Missing))
    } else {
        let best = reals(args)?
            .into_iter()
            .reduce(|a, b| if largest { a.max(b) } else { a.min(b) });
        Ok(best.map(Value::Real).unwrap_or(Value::Missing))
    }
}

fn real(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    match &args[0] {
        Value::Text(s) => Ok(s
            .trim()
            .parse::<f64>()
            .map(Value::Real)
            .unwrap_or(Value::Missing)),
        other => Ok(Value::Real(other.as_f64()?)),
    }
}

fn integer(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::Int(n));
            }
            match s.parse::<f64>() {
                Ok(x) => to_int(x.trunc(), "integer").or(Ok(Value::Missing)),
                Err(_) => Ok(Value::Missing),
            }
        }
        other => to_int(other.as_f64()?.trunc(), "integer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: crate::primitive::RowFn, args: &[Value], ty: Type) -> Result<Value, EvalFault> {
        f(args, ty)
    }

    #[test]
    fn test_int_and_real_arithmetic() {
        assert_eq!(
            call(add, &[Value::Int(1), Value::Int(2)], Type::Int).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(add, &[Value::Int(1), Value::Real(0.5)], Type::Real).unwrap(),
            Value::Real(1.5)
        );
        assert_eq!(call(sub, &[Value::Int(4)], Type::Int).unwrap(), Value::Int(-4));
        assert_eq!(
            call(sub, &[Value::Int(10), Value::Int(3), Value::Int(2)], Type::Int).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            call(mul, &[Value::Int(6), Value::Real(0.5)], Type::Real).unwrap(),
            Value::Real(3.0)
        );
    }

    #[test]
    fn test_overflow_is_a_fault() {
        assert_eq!(
            call(add, &[Value::Int(i64::MAX), Value::Int(1)], Type::Int),
            Err(EvalFault::Overflow { operation: "+" })
        );
        assert!(call(round, &[Value::Real(1e300)], Type::Int).is_err());
    }

    #[test]
    fn test_division_policies() {
        assert_eq!(
            call(div, &[Value::Int(1), Value::Int(4)], Type::Real).unwrap(),
            Value::Real(0.25)
        );
        assert_eq!(
            call(div, &[Value::Int(1), Value::Int(0)], Type::Real).unwrap(),
            Value::Missing
        );
        assert_eq!(
            call(modulo, &[Value::Int(-7), Value::Int(2)], Type::Int).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            call(modulo, &[Value::Int(1), Value::Int(0)], Type::Int),
            Err(EvalFault::DivisionByZero)
        );
    }

    #[test]
    fn test_rounding_and_conversions() {
        assert_eq!(call(round, &[Value::Real(2.5)], Type::Int).unwrap(), Value::Int(3));
        assert_eq!(call(floor, &[Value::Real(-1.5)], Type::Int).unwrap(), Value::Int(-2));
        assert_eq!(call(ceil, &[Value::Int(7)], Type::Int).unwrap(), Value::Int(7));
        assert_eq!(call(sqrt, &[Value::Int(-1)], Type::Real).unwrap(), Value::Missing);
        assert_eq!(
            call(integer, &[Value::text(" 12 ")], Type::Int).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            call(integer, &[Value::text("3.9")], Type::Int).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            call(integer, &[Value::text("abc")], Type::Int).unwrap(),
            Value::Missing
        );
        assert_eq!(call(real, &[Value::Int(2)], Type::Real).unwrap(), Value::Real(2.0));
    }

    #[test]
    fn test_extremes() {
        assert_eq!(
            call(max, &[Value::Int(3), Value::Int(9), Value::Int(4)], Type::Int).unwrap(),
            Value::Int(9)
        );
        assert_eq!(
            call(min, &[Value::Int(3), Value::Real(-0.5)], Type::Real).unwrap(),
            Value::Real(-0.5)
        );
    }

    #[test]
    fn test_runtime_type_disagreement() {
        assert_eq!(
            call(add, &[Value::text("x"), Value::Int(1)], Type::Int),
            Err(EvalFault::NotInteger { actual: "text" })
        );
    }
}
