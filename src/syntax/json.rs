// JSON-tree syntax: each list's head is the primitive name, literals are
// native JSON scalars, `["f", key]` references a field.

use serde_json::{json, Value as Json};

use super::token::{is_symbol, is_variable_name};
use super::{FIELD_HEAD, LET_HEAD, VAR_HEAD};
use crate::expression::{
    Expression, ExpressionError, ExpressionResult, FieldKey, FieldRef, Literal,
};

/// Convert an expression into its JSON tree
pub fn to_json_tree(expr: &Expression) -> Json {
    match expr {
        Expression::Literal(lit) => match lit {
            Literal::Nil => Json::Null,
            Literal::Boolean(b) => Json::Bool(*b),
            Literal::Int(n) => json!(n),
            Literal::Real(x) => json!(x),
            Literal::Text(s) => Json::String(s.clone()),
        },
        Expression::Field(FieldRef { key, shift }) => {
            let mut items = vec![Json::String(FIELD_HEAD.to_string())];
            items.push(match key {
                FieldKey::Column(c) => json!(c),
                FieldKey::Id(id) => Json::String(id.clone()),
            });
            if let Some(shift) = shift {
                items.push(json!(shift));
            }
            Json::Array(items)
        }
        Expression::Var(name) => json!([VAR_HEAD, name]),
        Expression::Call { name, args } => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Json::String(name.clone()));
            items.extend(args.iter().map(to_json_tree));
            Json::Array(items)
        }
        Expression::Let { bindings, body } => {
            let flat = bindings
                .iter()
                .flat_map(|(name, value)| [Json::String(name.clone()), to_json_tree(value)])
                .collect();
            json!([LET_HEAD, Json::Array(flat), to_json_tree(body)])
        }
    }
}

/// Convert a JSON tree into an expression
pub fn from_json_tree(json: &Json) -> ExpressionResult<Expression> {
    match json {
        Json::Null => Ok(Expression::nil()),
        Json::Bool(b) => Ok(Expression::bool(*b)),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Expression::int(i))
            } else if n.is_u64() {
                Err(ExpressionError::syntax(format!(
                    "integer literal {} out of range",
                    n
                )))
            } else {
                n.as_f64()
                    .map(Expression::real)
                    .ok_or_else(|| ExpressionError::syntax(format!("malformed number {}", n)))
            }
        }
        Json::String(s) => Ok(Expression::text(s.clone())),
        Json::Array(items) => from_json_list(items),
        Json::Object(_) => Err(ExpressionError::syntax(
            "JSON objects are not expressions",
        )),
    }
}

fn from_json_list(items: &[Json]) -> ExpressionResult<Expression> {
    let (head, rest) = items
        .split_first()
        .ok_or_else(|| ExpressionError::syntax("empty list"))?;
    let head = match head {
        Json::String(s) if is_symbol(s) => s.as_str(),
        Json::String(s) => {
            return Err(ExpressionError::syntax(format!(
                "list head {:?} is not a valid symbol",
                s
            )))
        }
        other => {
            return Err(ExpressionError::syntax(format!(
                "list head must be a string, found {}",
                other
            )))
        }
    };

    match head {
        FIELD_HEAD => field_from_json(rest),
        VAR_HEAD => match rest {
            [Json::String(name)] if is_variable_name(name) => Ok(Expression::Var(name.clone())),
            _ => Err(ExpressionError::syntax(
                "variable reference needs exactly one name",
            )),
        },
        LET_HEAD => let_from_json(rest),
        _ => Ok(Expression::Call {
            name: head.to_string(),
            args: rest
                .iter()
                .map(from_json_tree)
                .collect::<ExpressionResult<Vec<_>>>()?,
        }),
    }
}

fn field_from_json(rest: &[Json]) -> ExpressionResult<Expression> {
    let (key, shift) = match rest {
        [key] => (key, None),
        [key, shift] => (key, Some(shift)),
        _ => {
            return Err(ExpressionError::syntax(
                "field reference takes a key and an optional shift",
            ))
        }
    };

    let key = match key {
        Json::String(id) => FieldKey::Id(id.clone()),
        Json::Number(n) => match n.as_u64() {
            Some(c) => FieldKey::Column(c as usize),
            None => {
                return Err(ExpressionError::syntax(format!(
                    "invalid column number {}",
                    n
                )))
            }
        },
        other => {
            return Err(ExpressionError::syntax(format!(
                "invalid field key {}",
                other
            )))
        }
    };

    let shift = match shift {
        None => None,
        Some(Json::Number(n)) if n.as_i64().is_some() => n.as_i64(),
        Some(other) => {
            return Err(ExpressionError::syntax(format!(
                "field shift must be an integer, found {}",
                other
            )))
        }
    };

    Ok(Expression::Field(FieldRef { key, shift }))
}

fn let_from_json(rest: &[Json]) -> ExpressionResult<Expression> {
    let (flat, body) = match rest {
        [Json::Array(flat), body] => (flat, body),
        _ => {
            return Err(ExpressionError::syntax(
                "let takes a binding list and a body",
            ))
        }
    };
    if flat.len() % 2 != 0 {
        return Err(ExpressionError::syntax(
            "let bindings must come in name/value pairs",
        ));
    }

    let bindings = flat
        .chunks(2)
        .map(|pair| match &pair[0] {
            Json::String(name) if is_variable_name(name) => {
                Ok((name.clone(), from_json_tree(&pair[1])?))
            }
            other => Err(ExpressionError::syntax(format!(
                "invalid binding name {}",
                other
            ))),
        })
        .collect::<ExpressionResult<Vec<_>>>()?;

    Ok(Expression::Let {
        bindings,
        body: Box::new(from_json_tree(body)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ErrorKind;

    #[test]
    fn test_to_json() {
        let expr = Expression::call(
            "+",
            vec![
                Expression::column(0),
                Expression::field("000001"),
                Expression::real(1.5),
                Expression::nil(),
            ],
        );
        assert_eq!(
            to_json_tree(&expr),
            json!(["+", ["f", 0], ["f", "000001"], 1.5, null])
        );

        let expr = Expression::let_in(
            vec![("x", Expression::int(1))],
            Expression::var("x"),
        );
        assert_eq!(to_json_tree(&expr), json!(["let", ["x", 1], ["var", "x"]]));
    }

    #[test]
    fn test_from_json() {
        let expr = from_json_tree(&json!(["if", [">", ["f", "a", -1], 2], "big", "small"])).unwrap();
        assert_eq!(
            expr,
            Expression::call(
                "if",
                vec![
                    Expression::call(
                        ">",
                        vec![
                            Expression::Field(FieldRef::id("a").shifted(-1)),
                            Expression::int(2)
                        ]
                    ),
                    Expression::text("big"),
                    Expression::text("small"),
                ]
            )
        );
    }

    #[test]
    fn test_json_idempotent() {
        let tree = json!(["let", ["x", ["f", 0], "y", 2.5], ["max", ["var", "x"], ["var", "y"], 3]]);
        let once = to_json_tree(&from_json_tree(&tree).unwrap());
        assert_eq!(once, tree);
        let twice = to_json_tree(&from_json_tree(&once).unwrap());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_malformed_json() {
        let bad = [
            json!([]),
            json!([1, 2]),
            json!([["f", 0], 1]),
            json!(["a b", 1]),
            json!({"op": "+"}),
            json!(["f"]),
            json!(["f", -1]),
            json!(["f", 0, 1.5]),
            json!(["let", ["x"], 1]),
            json!(["let", [1, 2], 1]),
            json!(["var", "nil"]),
            json!(18446744073709551615u64),
        ];
        for tree in bad {
            let err = from_json_tree(&tree).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Syntax, "tree {}", tree);
        }
    }
}
