//! Field-referencing reductions: dataset-wide aggregates and sliding windows.
//!
//! Reducers receive the referenced field's values, missing ones included, and
//! decide themselves how to treat them.

use super::{
    first_result, int_result, real_result, Arity, EvalRule, Primitive, ANY_FIELD, INTEGER,
    NUMERIC_FIELD,
};
use crate::expression::error::EvalFault;
use crate::expression::types::Type;
use crate::value::Value;

pub(crate) fn primitives() -> Vec<Primitive> {
    vec![
        Primitive::new(
            "mean",
            Arity::Exact(1),
            &[NUMERIC_FIELD],
            real_result,
            EvalRule::Aggregate(mean),
        )
        .handles_missing()
        .doc("Mean of the non-missing values of a field"),
        Primitive::new(
            "sum",
            Arity::Exact(1),
            &[NUMERIC_FIELD],
            first_result,
            EvalRule::Aggregate(sum),
        )
        .handles_missing()
        .doc("Sum of the non-missing values of a field; 0 when there are none"),
        Primitive::new(
            "maximum",
            Arity::Exact(1),
            &[NUMERIC_FIELD],
            first_result,
            EvalRule::Aggregate(maximum),
        )
        .handles_missing()
        .doc("Largest non-missing value of a field"),
        Primitive::new(
            "minimum",
            Arity::Exact(1),
            &[NUMERIC_FIELD],
            first_result,
            EvalRule::Aggregate(minimum),
        )
        .handles_missing()
        .doc("Smallest non-missing value of a field"),
        Primitive::new(
            "population",
            Arity::Exact(1),
            &[ANY_FIELD],
            int_result,
            EvalRule::Aggregate(population),
        )
        .handles_missing()
        .doc("Number of rows"),
        Primitive::new(
            "missing-count",
            Arity::Exact(1),
            &[ANY_FIELD],
            int_result,
            EvalRule::Aggregate(missing_count),
        )
        .handles_missing()
        .doc("Number of rows where the field is missing"),
        Primitive::new(
            "avg-window",
            Arity::Exact(3),
            &[NUMERIC_FIELD, INTEGER, INTEGER],
            real_result,
            EvalRule::Window(mean),
        )
        .handles_missing()
        .doc("(avg-window field start end): mean over rows i+start..=i+end"),
        Primitive::new(
            "sum-window",
            Arity::Exact(3),
            &[NUMERIC_FIELD, INTEGER, INTEGER],
            first_result,
            EvalRule::Window(sum),
        )
        .handles_missing()
        .doc("(sum-window field start end): sum over rows i+start..=i+end"),
    ]
}

fn present<'a>(values: &'a [&'a Value]) -> impl Iterator<Item = &'a Value> + 'a {
    values.iter().copied().filter(|v| !v.is_missing())
}

fn mean(values: &[&Value], _: Type) -> Result<Value, EvalFault> {
    let mut total = 0.0;
    let mut count = 0usize;
    for value in present(values) {
        total += value.as_f64()?;
        count += 1;
    }
    if count == 0 {
        return Ok(Value::Missing);
    }
    Ok(Value::Real(total / count as f64))
}

fn sum(values: &[&Value], ty: Type) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        let mut total: i64 = 0;
        for value in present(values) {
            total = total
                .checked_add(value.as_i64()?)
                .ok_or(EvalFault::Overflow { operation: "sum" })?;
        }
        return Ok(Value::Int(total));
    }
    let mut total = 0.0;
    for value in present(values) {
        total += value.as_f64()?;
    }
    Ok(Value::Real(total))
}

fn maximum(values: &[&Value], ty: Type) -> Result<Value, EvalFault> {
    extreme(values, ty, true)
}

fn minimum(values: &[&Value], ty: Type) -> Result<Value, EvalFault> {
    extreme(values, ty, false)
}

fn extreme(values: &[&Value], ty: Type, largest: bool) -> Result<Value, EvalFault> {
    if ty == Type::Int {
        let mut best: Option<i64> = None;
        for value in present(values) {
            let n = value.as_i64()?;
            best = Some(match best {
                Some(b) if largest => b.max(n),
                Some(b) => b.min(n),
                None => n,
            });
        }
        return Ok(best.map(Value::Int).unwrap_or(Value::Missing));
    }
    let mut best: Option<f64> = None;
    for value in present(values) {
        let x = value.as_f64()?;
        best = Some(match best {
            Some(b) if largest => b.max(x),
            Some(b) => b.min(x),
            None => x,
        });
    }
    Ok(best.map(Value::Real).unwrap_or(Value::Missing))
}

fn population(values: &[&Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Int(values.len() as i64))
}

fn missing_count(values: &[&Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Int(values.iter().filter(|v| v.is_missing()).count() as i64))
}
