//! Expression evaluation implementation.

use log::{debug, trace};
use std::collections::HashMap;

use crate::expression::error::EvalFault;
use crate::expression::type_checker::CheckedExpr;
use crate::expression::types::Type;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::primitive::{Control, EvalRule, MissingPolicy, Primitive};
use crate::value::{Row, Value};

static MISSING: Value = Value::Missing;

/// Evaluator for checked expressions over one row set.
///
/// Aggregates are computed on first use and cached for the lifetime of the
/// evaluator, which is one evaluation call.
pub(crate) struct Evaluator<'a> {
    rows: &'a [Row],
    aggregates: HashMap<(usize, usize), Value>,
    locals: Vec<Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(rows: &'a [Row]) -> Self {
        Self {
            rows,
            aggregates: HashMap::new(),
            locals: Vec::new(),
        }
    }

    /// Evaluate an expression for every row, in row order
    pub fn evaluate_all(&mut self, expr: &CheckedExpr<'_>) -> ExpressionResult<Vec<Value>> {
        let mut results = Vec::with_capacity(self.rows.len());
        for row in 0..self.rows.len() {
            let value = self
                .evaluate(expr, row)
                .map_err(|source| ExpressionError::Evaluation { row, source })?;
            trace!("row {} -> {:?}", row, value);
            results.push(value);
        }
        Ok(results)
    }

    /// Evaluate an expression against the row at `row`
    pub fn evaluate(&mut self, expr: &CheckedExpr<'_>, row: usize) -> Result<Value, EvalFault> {
        match expr {
            CheckedExpr::Const(value) => Ok(value.clone()),

            CheckedExpr::Field { position, shift } => {
                Ok(self.cell(row, *shift, *position).clone())
            }

            CheckedExpr::Local(slot) => {
                Ok(self.locals.get(*slot).cloned().unwrap_or(Value::Missing))
            }

            CheckedExpr::Let { bindings, body } => {
                let depth = self.locals.len();
                let result = self.evaluate_let(bindings, body, row);
                self.locals.truncate(depth);
                result
            }

            CheckedExpr::Call { prim, args, ty } => match prim.rule {
                EvalRule::Row(apply) => {
                    let values = args
                        .iter()
                        .map(|arg| self.evaluate(arg, row))
                        .collect::<Result<Vec<_>, _>>()?;
                    if prim.missing == MissingPolicy::Propagate
                        && values.iter().any(Value::is_missing)
                    {
                        return Ok(Value::Missing);
                    }
                    apply(&values, *ty)
                }
                EvalRule::Control(control) => {
                    let value = self.evaluate_control(prim, control, args, row)?;
                    Ok(conform(value, *ty))
                }
                // Reductions are lowered to their own nodes by the type checker
                EvalRule::Aggregate(_) | EvalRule::Window(_) => Ok(Value::Missing),
            },

            CheckedExpr::Aggregate {
                key,
                reduce,
                position,
                ty,
            } => {
                if let Some(value) = self.aggregates.get(key) {
                    return Ok(value.clone());
                }
                let column: Vec<&Value> = self
                    .rows
                    .iter()
                    .map(|r| r.get(*position).unwrap_or(&MISSING))
                    .collect();
                let value = reduce(&column, *ty)?;
                debug!("aggregate {:?} over {} rows = {:?}", key, column.len(), value);
                self.aggregates.insert(*key, value.clone());
                Ok(value)
            }

            CheckedExpr::Window {
                reduce,
                position,
                start,
                end,
                ty,
            } => {
                let start = self.evaluate(start, row)?;
                let end = self.evaluate(end, row)?;
                if start.is_missing() || end.is_missing() {
                    return Ok(Value::Missing);
                }
                let here = row as i64;
                let (Some(first), Some(last)) = (
                    here.checked_add(start.as_i64()?),
                    here.checked_add(end.as_i64()?),
                ) else {
                    return Ok(Value::Missing);
                };
                let len = self.rows.len() as i64;
                if !(0..len).contains(&first) || !(0..len).contains(&last) {
                    return Ok(Value::Missing);
                }
                let frame: Vec<&Value> = (first..=last)
                    .map(|i| self.rows[i as usize].get(*position).unwrap_or(&MISSING))
                    .collect();
                reduce(&frame, *ty)
            }
        }
    }

    fn evaluate_let(
        &mut self,
        bindings: &[CheckedExpr<'_>],
        body: &CheckedExpr<'_>,
        row: usize,
    ) -> Result<Value, EvalFault> {
        for binding in bindings {
            let value = self.evaluate(binding, row)?;
            self.locals.push(value);
        }
        self.evaluate(body, row)
    }

    /// Lazy forms: arguments are evaluated only as far as needed
    fn evaluate_control(
        &mut self,
        prim: &Primitive,
        control: Control,
        args: &[CheckedExpr<'_>],
        row: usize,
    ) -> Result<Value, EvalFault> {
        trace!("control form {}", prim.name);
        match control {
            Control::If => {
                let condition = self.evaluate(&args[0], row)?;
                if condition.is_missing() {
                    return Ok(Value::Missing);
                }
                if condition.as_bool()? {
                    self.evaluate(&args[1], row)
                } else {
                    match args.get(2) {
                        Some(otherwise) => self.evaluate(otherwise, row),
                        None => Ok(Value::Missing),
                    }
                }
            }

            Control::Cond => {
                let mut rest = args;
                while rest.len() >= 2 {
                    let condition = self.evaluate(&rest[0], row)?;
                    // A missing condition counts as false
                    if !condition.is_missing() && condition.as_bool()? {
                        return self.evaluate(&rest[1], row);
                    }
                    rest = &rest[2..];
                }
                match rest.first() {
                    Some(default) => self.evaluate(default, row),
                    None => Ok(Value::Missing),
                }
            }

            Control::And | Control::Or => {
                // The value that decides the result on its own
                let decisive = control == Control::Or;
                let mut saw_missing = false;
                for arg in args {
                    let value = self.evaluate(arg, row)?;
                    if value.is_missing() {
                        saw_missing = true;
                    } else if value.as_bool()? == decisive {
                        return Ok(Value::Boolean(decisive));
                    }
                }
                if saw_missing {
                    Ok(Value::Missing)
                } else {
                    Ok(Value::Boolean(!decisive))
                }
            }

            Control::Coalesce => {
                for arg in args {
                    let value = self.evaluate(arg, row)?;
                    if !value.is_missing() {
                        return Ok(value);
                    }
                }
                Ok(Value::Missing)
            }
        }
    }

    /// Value of the field at `position` in the row `shift` away from `row`
    fn cell(&self, row: usize, shift: i64, position: usize) -> &'a Value {
        let target = match (row as i64).checked_add(shift) {
            Some(target) if target >= 0 => target as usize,
            _ => return &MISSING,
        };
        self.rows
            .get(target)
            .and_then(|r| r.get(position))
            .unwrap_or(&MISSING)
    }
}

/// Widen an integer to real where the checked type says real
fn conform(value: Value, ty: Type) -> Value {
    match (value, ty) {
        (Value::Int(n), Type::Real) => Value::Real(n as f64),
        (value, _) => value,
    }
}
