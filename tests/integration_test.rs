use flatline::expression::ErrorKind;
use flatline::primitive::{Arity, EvalRule, MissingPolicy};
use flatline::schema::{DataType, OpType};
use flatline::{
    from_json_tree, infer_schema, parse_symbolic, to_json_tree, Expression, Interpreter, Row,
    Schema, Value,
};
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn letters() -> Vec<Row> {
    vec![
        vec![Value::Int(1), Value::text("x")],
        vec![Value::Int(2), Value::text("y")],
    ]
}

#[test]
fn test_infer_schema_example() {
    let schema = infer_schema(&[Value::Int(1), Value::text("a"), Value::Real(2.5)]);
    let fields: Vec<_> = schema
        .fields()
        .iter()
        .map(|f| (f.id.as_str(), f.optype, f.datatype, f.column_number))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("000000", OpType::Numeric, DataType::Int64, 0),
            ("000001", OpType::Categorical, DataType::String, 1),
            ("000002", OpType::Numeric, DataType::Float64, 2),
        ]
    );
}

#[test]
fn test_constant_expression() {
    let interp = Interpreter::new();
    let expr = parse_symbolic("(+ 1 2)").unwrap();

    let desc = interp.check(&expr, None).unwrap();
    assert_eq!(desc.optype, OpType::Numeric);
    assert_eq!(desc.datatype, DataType::Int64);
    assert_eq!(desc.value, Some(Value::Int(3)));
    assert!(desc.fields.is_empty());

    let values = interp.evaluate(&expr, None, &[vec![]]).unwrap();
    assert_eq!(values, vec![Value::Int(3)]);
}

#[test]
fn test_field_selection_with_inferred_schema() {
    let interp = Interpreter::new();
    let values = interp.apply_lisp("(f 0)", None, &letters()).unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);

    let values = interp
        .apply_json(&json!(["f", "000001"]), None, &letters())
        .unwrap();
    assert_eq!(values, vec![Value::text("x"), Value::text("y")]);
}

#[test]
fn test_unknown_field() {
    let interp = Interpreter::new();
    let schema = infer_schema(&letters()[0]);
    let err = interp.check_lisp("(f \"999999\")", Some(&schema)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
    assert!(err.to_string().contains("999999"));

    let diagnostic = serde_json::to_value(&err).unwrap();
    assert_eq!(diagnostic["kind"], "unknown_field");
    assert_eq!(diagnostic["field"], "999999");
}

#[test]
fn test_check_rejects_before_evaluate() {
    let interp = Interpreter::new();
    let rows = letters();
    for text in [
        "(f \"999999\")",
        "(frobnicate (f 0))",
        "(abs 1 2)",
        "(+ (f 1) 1)",
        "(mean 3)",
        "y",
    ] {
        let expr = parse_symbolic(text).unwrap();
        let checked = interp.check_with_rows(&expr, None, &rows).unwrap_err();
        let evaluated = interp.evaluate(&expr, None, &rows).unwrap_err();
        assert_eq!(checked.kind(), evaluated.kind(), "{}", text);
        assert_eq!(checked, evaluated);
    }
}

#[test]
fn test_arity_law() {
    let interp = Interpreter::new();
    for prim in interp.registry().iter() {
        let Some(count) = prim.arity.rejected_count() else {
            continue;
        };
        let expr = Expression::call(prim.name, vec![Expression::int(1); count]);
        let err = interp.check(&expr, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArityMismatch, "{}", prim.name);

        // Below the minimum as well
        let minimum = match prim.arity {
            Arity::Exact(n) | Arity::AtLeast(n) | Arity::Between(n, _) => n,
        };
        if minimum > 0 {
            let expr = Expression::call(prim.name, vec![Expression::int(1); minimum - 1]);
            let err = interp.check(&expr, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArityMismatch, "{}", prim.name);
        }
    }
}

#[test]
fn test_missing_propagation() {
    let interp = Interpreter::new();
    let rows: Vec<Row> = (0..3).map(|_| vec![Value::Missing, Value::Missing]).collect();
    for prim in interp.registry().iter() {
        if prim.missing != MissingPolicy::Propagate || !matches!(prim.rule, EvalRule::Row(_)) {
            continue;
        }
        let count = match prim.arity {
            Arity::Exact(n) | Arity::AtLeast(n) | Arity::Between(n, _) => n,
        };
        let expr = Expression::call(prim.name, vec![Expression::nil(); count]);
        let values = interp.evaluate(&expr, None, &rows).unwrap();
        assert_eq!(values, vec![Value::Missing; 3], "{}", prim.name);
    }
}

#[test]
fn test_round_trip_and_idempotence() {
    for text in [
        "(+ 1 2)",
        "(f 0)",
        "(if (missing? (f \"000001\")) \"none\" (upper (f \"000001\")))",
        "(let (m (mean (f 0))) (- (f 0) m))",
        "(cond (< (f 0) 0) -1 (> (f 0) 0) 1 0)",
        "(sum-window (f 0 -1) -2 0)",
        "(str 1.5 true nil \"q\\\"uote\")",
    ] {
        let expr = parse_symbolic(text).unwrap();
        let tree = to_json_tree(&expr);
        assert_eq!(from_json_tree(&tree).unwrap(), expr);
        assert_eq!(parse_symbolic(&expr.to_string()).unwrap(), expr);

        // Converting an already converted tree changes nothing
        let again = to_json_tree(&from_json_tree(&tree).unwrap());
        assert_eq!(again, tree);
    }
}

#[test]
fn test_aggregates_windows_and_lag() {
    let interp = Interpreter::new();
    let rows: Vec<Row> = [3, 5, 7, 9].iter().map(|&n| vec![Value::Int(n)]).collect();

    assert_eq!(
        interp.apply_lisp("(- (f 0) (f 0 -1))", None, &rows).unwrap(),
        vec![Value::Missing, Value::Int(2), Value::Int(2), Value::Int(2)]
    );
    assert_eq!(
        interp.apply_lisp("(avg-window (f 0) -1 1)", None, &rows).unwrap(),
        vec![Value::Missing, Value::Real(5.0), Value::Real(7.0), Value::Missing]
    );
    assert_eq!(
        interp.apply_lisp("(> (f 0) (mean (f 0)))", None, &rows).unwrap(),
        vec![
            Value::Boolean(false),
            Value::Boolean(false),
            Value::Boolean(true),
            Value::Boolean(true)
        ]
    );
    let expr = parse_symbolic("(/ (maximum (f 0)) (population (f 0)))").unwrap();
    assert_eq!(
        interp.summarize(&expr, None, &rows).unwrap(),
        Some(Value::Real(2.25))
    );
}

#[test]
fn test_generate_column() {
    let interp = Interpreter::new();
    let schema: Schema = serde_json::from_value(json!({
        "fields": [
            {"id": "000000", "name": "price", "optype": "numeric", "datatype": "double", "column_number": 0},
            {"id": "000001", "name": "qty", "optype": "numeric", "datatype": "int32", "column_number": 1}
        ]
    }))
    .unwrap();
    let rows = vec![
        vec![Value::Real(2.5), Value::Int(4)],
        vec![Value::Real(1.0), Value::Missing],
    ];

    let expr = parse_symbolic("(* (f \"price\") (f \"qty\"))").unwrap();
    let generated = interp
        .generate(&expr, Some(&schema), &rows, Some("total"))
        .unwrap();
    assert_eq!(generated.schema.len(), 3);
    assert_eq!(generated.schema.resolve("total").unwrap().datatype, DataType::Float64);
    assert_eq!(generated.rows[0][2], Value::Real(10.0));
    assert_eq!(generated.rows[1][2], Value::Missing);

    // The generated field can be referenced by the next expression
    let values = interp
        .apply_lisp("(round (f \"total\"))", Some(&generated.schema), &generated.rows)
        .unwrap();
    assert_eq!(values, vec![Value::Int(10), Value::Missing]);
}

#[test]
fn test_evaluation_error_is_reported_whole() {
    let interp = Interpreter::new();
    let rows: Vec<Row> = [4, 0, 2].iter().map(|&n| vec![Value::Int(n)]).collect();
    let err = interp.apply_lisp("(mod 10 (f 0))", None, &rows).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Evaluation);
    assert!(err.to_string().contains("row 1"));

    // Real division treats a zero divisor as missing instead
    assert_eq!(
        interp.apply_lisp("(/ 10 (f 0))", None, &rows).unwrap(),
        vec![Value::Real(2.5), Value::Missing, Value::Real(5.0)]
    );
}

#[test]
fn test_concurrent_evaluation() {
    let interp = Arc::new(Interpreter::new());
    let mut handles = vec![];

    for i in 0..4i64 {
        let interp = interp.clone();
        let handle = thread::spawn(move || {
            let rows: Vec<Row> = (0..50).map(|n| vec![Value::Int(n * (i + 1))]).collect();
            let values = interp
                .apply_lisp("(- (f 0) (mean (f 0)))", None, &rows)
                .unwrap();
            let expected_mean = 24.5 * (i + 1) as f64;
            assert_eq!(values[0], Value::Real(-expected_mean));
            values.len()
        });
        handles.push(handle);
    }

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 50);
    }
}

#[test]
fn test_list_primitives() {
    let interp = Interpreter::new();
    let names = interp.list_primitives();
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    for name in ["+", "if", "coalesce", "mean", "avg-window", "missing?"] {
        assert!(names.contains(&name), "{}", name);
    }

    // Listings show every primitive with its documentation, in name order
    let primitives = interp.primitives();
    let listed: Vec<_> = primitives.iter().map(|p| p.name).collect();
    assert_eq!(listed, names);
    for prim in primitives {
        assert!(!prim.doc.is_empty(), "{} is undocumented", prim.name);
    }
}

#[test]
fn test_positions_follow_column_numbers() {
    let interp = Interpreter::new();
    let schema: Schema = serde_json::from_value(json!({
        "fields": [
            {"id": "b", "optype": "numeric", "datatype": "int64", "column_number": 1},
            {"id": "a", "optype": "numeric", "datatype": "int64", "column_number": 0}
        ]
    }))
    .unwrap();
    let rows = vec![vec![Value::Int(10), Value::Int(20)]];

    assert_eq!(
        interp.apply_lisp("(f 0)", Some(&schema), &rows).unwrap(),
        vec![Value::Int(10)]
    );
    assert_eq!(
        interp.apply_lisp("(f \"a\")", Some(&schema), &rows).unwrap(),
        vec![Value::Int(10)]
    );
    assert_eq!(
        interp.apply_lisp("(- (f \"b\") (f 0))", Some(&schema), &rows).unwrap(),
        vec![Value::Int(10)]
    );

    // The generated field lands at the column it is declared with
    let expr = parse_symbolic("(* (f \"b\") 2)").unwrap();
    let generated = interp.generate(&expr, Some(&schema), &rows, None).unwrap();
    let field = generated.schema.field_by_column(2).unwrap();
    assert_eq!(generated.rows[0][field.column_number], Value::Int(40));
    assert_eq!(
        interp
            .apply_lisp("(f 2)", Some(&generated.schema), &generated.rows)
            .unwrap(),
        vec![Value::Int(40)]
    );
}

#[test]
fn test_extreme_offsets_are_out_of_range() {
    let interp = Interpreter::new();
    let rows: Vec<Row> = [1, 2].iter().map(|&n| vec![Value::Int(n)]).collect();
    for text in [
        "(f 0 9223372036854775807)",
        "(f 0 -9223372036854775807)",
        "(sum-window (f 0) 9223372036854775807 0)",
        "(avg-window (f 0) 0 9223372036854775807)",
    ] {
        assert_eq!(
            interp.apply_lisp(text, None, &rows).unwrap(),
            vec![Value::Missing, Value::Missing],
            "{}",
            text
        );
    }
}
