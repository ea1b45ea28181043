//! Comparison primitives.

use std::cmp::Ordering;

use super::{set_of, Arity, EvalRule, Primitive, RuleViolation, ANY};
use crate::expression::error::EvalFault;
use crate::expression::types::{Type, TypeSet};
use crate::value::Value;

pub(crate) fn primitives() -> Vec<Primitive> {
    vec![
        Primitive::new("=", Arity::Exact(2), &[ANY], equality_result, EvalRule::Row(eq))
            .doc("Equality; integers and reals compare by value"),
        Primitive::new("!=", Arity::Exact(2), &[ANY], equality_result, EvalRule::Row(ne))
            .doc("Inequality"),
        Primitive::new("<", Arity::Exact(2), &[ANY], ordering_result, EvalRule::Row(lt))
            .doc("Less than; numbers compare with numbers, text with text"),
        Primitive::new("<=", Arity::Exact(2), &[ANY], ordering_result, EvalRule::Row(le))
            .doc("Less than or equal"),
        Primitive::new(">", Arity::Exact(2), &[ANY], ordering_result, EvalRule::Row(gt))
            .doc("Greater than"),
        Primitive::new(">=", Arity::Exact(2), &[ANY], ordering_result, EvalRule::Row(ge))
            .doc("Greater than or equal"),
    ]
}

/// Both sides must unify: numbers with numbers, otherwise the same type
fn equality_result(types: &[Type]) -> Result<Type, RuleViolation> {
    match types[0].unify(types[1]) {
        Some(_) => Ok(Type::Boolean),
        None => Err(RuleViolation {
            position: 1,
            expected: set_of(types[0]),
        }),
    }
}

/// Ordering is defined on numbers and on text
fn ordering_result(types: &[Type]) -> Result<Type, RuleViolation> {
    let left = types[0];
    if !matches!(left, Type::Int | Type::Real | Type::Text | Type::Null) {
        return Err(RuleViolation {
            position: 0,
            expected: TypeSet::Numeric,
        });
    }
    match left.unify(types[1]) {
        Some(Type::Int | Type::Real | Type::Text | Type::Null) => Ok(Type::Boolean),
        _ => Err(RuleViolation {
            position: 1,
            expected: if left == Type::Null {
                TypeSet::Numeric
            } else {
                set_of(left)
            },
        }),
    }
}

/// Values of different runtime kinds never compare equal, except numbers
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Real(b)) | (Value::Real(b), Value::Int(a)) => (*a as f64) == *b,
        _ => left == right,
    }
}

/// Order two values; `None` when the comparison is undefined (NaN)
fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>, EvalFault> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Text(a), Value::Text(b)) => Ok(Some(a.cmp(b))),
        (Value::Text(_), other) => Err(EvalFault::NotText {
            actual: other.kind_name(),
        }),
        _ => Ok(left.as_f64()?.partial_cmp(&right.as_f64()?)),
    }
}

fn ordered(args: &[Value], accept: fn(Ordering) -> bool) -> Result<Value, EvalFault> {
    Ok(compare_values(&args[0], &args[1])?
        .map(|ord| Value::Boolean(accept(ord)))
        .unwrap_or(Value::Missing))
}

fn eq(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Boolean(values_equal(&args[0], &args[1])))
}

fn ne(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Boolean(!values_equal(&args[0], &args[1])))
}

fn lt(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    ordered(args, |o| o == Ordering::Less)
}

fn le(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    ordered(args, |o| o != Ordering::Greater)
}

fn gt(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    ordered(args, |o| o == Ordering::Greater)
}

fn ge(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    ordered(args, |o| o != Ordering::Less)
}
