//! Boolean connectives and conditional forms.
//!
//! `and`, `or`, `if`, `cond` and `coalesce` are control forms: the evaluator
//! walks their arguments lazily, so only their typing lives here.

use super::{
    bool_result, unify_at, Arity, Control, EvalRule, Primitive, RuleViolation, ANY, BOOLEAN,
};
use crate::expression::error::EvalFault;
use crate::expression::types::{Type, TypeSet};
use crate::value::Value;

pub(crate) fn primitives() -> Vec<Primitive> {
    vec![
        Primitive::new(
            "and",
            Arity::AtLeast(1),
            &[BOOLEAN],
            bool_result,
            EvalRule::Control(Control::And),
        )
        .handles_missing()
        .doc("Logical conjunction; false wins over missing"),
        Primitive::new(
            "or",
            Arity::AtLeast(1),
            &[BOOLEAN],
            bool_result,
            EvalRule::Control(Control::Or),
        )
        .handles_missing()
        .doc("Logical disjunction; true wins over missing"),
        Primitive::new("not", Arity::Exact(1), &[BOOLEAN], bool_result, EvalRule::Row(not))
            .doc("Logical negation"),
        Primitive::new(
            "if",
            Arity::Between(2, 3),
            &[BOOLEAN, ANY, ANY],
            if_result,
            EvalRule::Control(Control::If),
        )
        .handles_missing()
        .doc("(if condition then [else]); a missing condition yields missing"),
        Primitive::new(
            "cond",
            Arity::AtLeast(2),
            &[ANY],
            cond_result,
            EvalRule::Control(Control::Cond),
        )
        .handles_missing()
        .doc("(cond c1 v1 c2 v2 ... [default]); first true condition wins"),
        Primitive::new(
            "coalesce",
            Arity::AtLeast(1),
            &[ANY],
            coalesce_result,
            EvalRule::Control(Control::Coalesce),
        )
        .handles_missing()
        .doc("First non-missing argument"),
        Primitive::new(
            "missing?",
            Arity::Exact(1),
            &[ANY],
            bool_result,
            EvalRule::Row(is_missing),
        )
        .handles_missing()
        .doc("Whether the argument is missing"),
    ]
}

fn if_result(types: &[Type]) -> Result<Type, RuleViolation> {
    let branches: Vec<usize> = (1..types.len()).collect();
    unify_at(types, &branches)
}

/// Conditions sit at even positions; a trailing odd argument is the default
fn cond_result(types: &[Type]) -> Result<Type, RuleViolation> {
    let mut values = Vec::new();
    for (position, ty) in types.iter().enumerate() {
        let is_condition = position % 2 == 0 && position + 1 < types.len();
        if is_condition {
            if !TypeSet::Boolean.accepts(*ty) {
                return Err(RuleViolation {
                    position,
                    expected: TypeSet::Boolean,
                });
            }
        } else {
            values.push(position);
        }
    }
    unify_at(types, &values)
}

fn coalesce_result(types: &[Type]) -> Result<Type, RuleViolation> {
    let all: Vec<usize> = (0..types.len()).collect();
    unify_at(types, &all)
}

fn not(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Boolean(!args[0].as_bool()?))
}

fn is_missing(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Boolean(args[0].is_missing()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_typing() {
        assert_eq!(
            if_result(&[Type::Boolean, Type::Int, Type::Real]),
            Ok(Type::Real)
        );
        assert_eq!(if_result(&[Type::Boolean, Type::Text]), Ok(Type::Text));
        assert_eq!(
            if_result(&[Type::Boolean, Type::Text, Type::Int]),
            Err(RuleViolation {
                position: 2,
                expected: TypeSet::Text
            })
        );
    }

    #[test]
    fn test_cond_typing() {
        assert_eq!(
            cond_result(&[Type::Boolean, Type::Int, Type::Boolean, Type::Int, Type::Real]),
            Ok(Type::Real)
        );
        assert_eq!(
            cond_result(&[Type::Int, Type::Int]),
            Err(RuleViolation {
                position: 0,
                expected: TypeSet::Boolean
            })
        );
        assert_eq!(
            cond_result(&[Type::Boolean, Type::Int, Type::Text]),
            Err(RuleViolation {
                position: 2,
                expected: TypeSet::Numeric
            })
        );
    }

    #[test]
    fn test_coalesce_typing() {
        assert_eq!(coalesce_result(&[Type::Null, Type::Int]), Ok(Type::Int));
        assert!(coalesce_result(&[Type::Int, Type::Boolean]).is_err());
    }

    #[test]
    fn test_row_rules() {
        assert_eq!(
            not(&[Value::Boolean(true)], Type::Boolean).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            is_missing(&[Value::Missing], Type::Boolean).unwrap(),
            Value::Boolean(true)
        );
    }
}
