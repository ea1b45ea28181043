//! Text and items primitives.

use super::{
    bool_result, int_result, text_result, Arity, EvalRule, Primitive, ANY, ITEMS, SEQUENCE, TEXT,
};
use crate::expression::error::EvalFault;
use crate::expression::types::Type;
use crate::value::Value;

pub(crate) fn primitives() -> Vec<Primitive> {
    vec![
        Primitive::new("str", Arity::AtLeast(1), &[ANY], text_result, EvalRule::Row(concat))
            .handles_missing()
            .doc("Concatenates the printed arguments; missing prints as empty"),
        Primitive::new("length", Arity::Exact(1), &[SEQUENCE], int_result, EvalRule::Row(length))
            .doc("Number of characters in text, or of elements in a list"),
        Primitive::new("upper", Arity::Exact(1), &[TEXT], text_result, EvalRule::Row(upper))
            .doc("Upper-cased text"),
        Primitive::new("lower", Arity::Exact(1), &[TEXT], text_result, EvalRule::Row(lower))
            .doc("Lower-cased text"),
        Primitive::new(
            "contains-items?",
            Arity::AtLeast(2),
            &[ITEMS, TEXT],
            bool_result,
            EvalRule::Row(contains_items),
        )
        .doc("Whether an items value holds any of the given items"),
    ]
}

fn concat(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let joined: String = args.iter().map(|v| v.to_string()).collect();
    Ok(Value::Text(joined))
}

fn length(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let n = match &args[0] {
        Value::Text(s) => s.chars().count(),
        Value::List(items) => items.len(),
        other => {
            return Err(EvalFault::NotText {
                actual: other.kind_name(),
            })
        }
    };
    Ok(Value::Int(n as i64))
}

fn upper(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Text(args[0].as_str()?.to_uppercase()))
}

fn lower(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    Ok(Value::Text(args[0].as_str()?.to_lowercase()))
}

/// A plain text cell counts as a single item
fn contains_items(args: &[Value], _: Type) -> Result<Value, EvalFault> {
    let items: Vec<&str> = match &args[0] {
        Value::List(items) => items.iter().filter_map(|v| v.as_str().ok()).collect(),
        other => vec![other.as_str()?],
    };
    for wanted in &args[1..] {
        if items.contains(&wanted.as_str()?) {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat() {
        let args = [
            Value::text("x="),
            Value::Int(3),
            Value::Missing,
            Value::Real(0.5),
            Value::Boolean(true),
        ];
        assert_eq!(concat(&args, Type::Text).unwrap(), Value::text("x=30.5true"));
    }

    #[test]
    fn test_length_and_case() {
        assert_eq!(
            length(&[Value::text("héllo")], Type::Int).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            length(&[Value::List(vec![Value::text("a"), Value::text("b")])], Type::Int).unwrap(),
            Value::Int(2)
        );
        assert!(length(&[Value::Int(1)], Type::Int).is_err());
        assert_eq!(
            upper(&[Value::text("abc")], Type::Text).unwrap(),
            Value::text("ABC")
        );
        assert_eq!(
            lower(&[Value::text("AbC")], Type::Text).unwrap(),
            Value::text("abc")
        );
    }

    #[test]
    fn test_contains_items() {
        let basket = Value::List(vec![Value::text("milk"), Value::text("bread")]);
        assert_eq!(
            contains_items(&[basket.clone(), Value::text("eggs"), Value::text("bread")], Type::Boolean)
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            contains_items(&[basket, Value::text("eggs")], Type::Boolean).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            contains_items(&[Value::text("milk"), Value::text("milk")], Type::Boolean).unwrap(),
            Value::Boolean(true)
        );
    }
}
