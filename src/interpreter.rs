//! High-level interpreter interface tying syntax, checking and evaluation
//! together.
//!
//! An [`Interpreter`] owns an immutable primitive registry and is otherwise
//! stateless: every call receives its schema and rows explicitly, and all
//! evaluation state (aggregate caches, local bindings) lives for one call.

use log::debug;
use serde::Serialize;

use crate::expression::eval::Evaluator;
use crate::expression::type_checker::{Checked, TypeChecker};
use crate::expression::{Expression, ExpressionError, ExpressionResult};
use crate::primitive::{Primitive, Registry};
use crate::schema::{self, field_id, DataType, Field, OpType, Schema};
use crate::syntax;
use crate::value::{Row, Value};

/// What a successful check reports about an expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    pub optype: OpType,
    pub datatype: DataType,
    /// Constant value, present when the expression reads no fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Referenced field ids, in order of first appearance
    pub fields: Vec<String>,
}

/// A dataset extended with a generated column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// Schema an evaluation runs against
enum Binding<'s> {
    Supplied(&'s Schema),
    Inferred(Schema),
}

impl Binding<'_> {
    fn schema(&self) -> &Schema {
        match self {
            Binding::Supplied(schema) => schema,
            Binding::Inferred(schema) => schema,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    registry: Registry,
}

impl Interpreter {
    /// Create an interpreter over the built-in primitive library
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Names of all registered primitives, sorted
    pub fn list_primitives(&self) -> Vec<&'static str> {
        self.registry.all_names()
    }

    /// Registered primitives in name order, for listings that show their docs
    pub fn primitives(&self) -> Vec<&Primitive> {
        let mut primitives: Vec<&Primitive> = self.registry.iter().collect();
        primitives.sort_unstable_by_key(|p| p.name);
        primitives
    }

    pub fn parse_symbolic(&self, text: &str) -> ExpressionResult<Expression> {
        syntax::parse_symbolic(text)
    }

    pub fn lisp_to_json(&self, text: &str) -> ExpressionResult<serde_json::Value> {
        syntax::lisp_to_json(text)
    }

    pub fn json_to_lisp(&self, tree: &serde_json::Value) -> ExpressionResult<String> {
        syntax::json_to_lisp(tree)
    }

    /// Schema synthesized from a single row
    pub fn infer_schema(&self, row: &[Value]) -> Schema {
        schema::infer_schema(row)
    }

    /// Type check against a schema. An absent schema declares no fields, so
    /// any field reference is unknown; use [`Interpreter::check_with_rows`]
    /// to infer one from data.
    pub fn check(
        &self,
        expr: &Expression,
        schema: Option<&Schema>,
    ) -> ExpressionResult<TypeDescriptor> {
        let empty = Schema::default();
        let schema = schema.unwrap_or(&empty);
        let checked = TypeChecker::new(&self.registry, schema).resolve(expr)?;
        Ok(self.describe(expr, checked))
    }

    /// Type check, inferring the schema from the first row when none is given
    pub fn check_with_rows(
        &self,
        expr: &Expression,
        schema: Option<&Schema>,
        rows: &[Row],
    ) -> ExpressionResult<TypeDescriptor> {
        let binding = self.bind(schema, rows);
        let checked = TypeChecker::new(&self.registry, binding.schema()).resolve(expr)?;
        Ok(self.describe(expr, checked))
    }

    /// Evaluate an expression for every row. Nothing is evaluated unless the
    /// expression checks, and a failure on any row fails the whole call.
    pub fn evaluate(
        &self,
        expr: &Expression,
        schema: Option<&Schema>,
        rows: &[Row],
    ) -> ExpressionResult<Vec<Value>> {
        let binding = self.bind(schema, rows);
        let checked = TypeChecker::new(&self.registry, binding.schema()).resolve(expr)?;
        if let Binding::Supplied(schema) = binding {
            validate_rows(schema, rows)?;
        }

        debug!("evaluating {} over {} rows", expr, rows.len());
        Evaluator::new(rows).evaluate_all(&checked.expr)
    }

    /// Evaluate an expression that does not vary by row, such as a ratio of
    /// aggregates, to a single value. Returns `None` when the expression
    /// reads fields row by row.
    pub fn summarize(
        &self,
        expr: &Expression,
        schema: Option<&Schema>,
        rows: &[Row],
    ) -> ExpressionResult<Option<Value>> {
        let binding = self.bind(schema, rows);
        let checked = TypeChecker::new(&self.registry, binding.schema()).resolve(expr)?;
        if let Binding::Supplied(schema) = binding {
            validate_rows(schema, rows)?;
        }
        if !checked.expr.is_row_independent() {
            return Ok(None);
        }

        Evaluator::new(rows)
            .evaluate(&checked.expr, 0)
            .map(Some)
            .map_err(|source| ExpressionError::Evaluation { row: 0, source })
    }

    /// Evaluate an expression and append the results as a new field
    pub fn generate(
        &self,
        expr: &Expression,
        schema: Option<&Schema>,
        rows: &[Row],
        name: Option<&str>,
    ) -> ExpressionResult<Generated> {
        let binding = self.bind(schema, rows);
        let base = binding.schema();
        let checked = TypeChecker::new(&self.registry, base).resolve(expr)?;
        if let Binding::Supplied(schema) = &binding {
            validate_rows(schema, rows)?;
        }
        let values = Evaluator::new(rows).evaluate_all(&checked.expr)?;

        let column = base.next_column();
        let (optype, datatype) = checked.ty.descriptor();
        let mut field = Field::new(field_id(column), optype, datatype, column);
        if let Some(name) = name {
            field = field.with_name(name);
        }
        let schema = base.with_field(field)?;

        let width = base.width();
        let rows = rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.resize(width, Value::Missing);
                row.push(value);
                row
            })
            .collect();

        debug!("generated field {} from {}", field_id(column), expr);
        Ok(Generated { schema, rows })
    }

    pub fn check_lisp(
        &self,
        text: &str,
        schema: Option<&Schema>,
    ) -> ExpressionResult<TypeDescriptor> {
        self.check(&syntax::parse_symbolic(text)?, schema)
    }

    pub fn check_json(
        &self,
        tree: &serde_json::Value,
        schema: Option<&Schema>,
    ) -> ExpressionResult<TypeDescriptor> {
        self.check(&syntax::from_json_tree(tree)?, schema)
    }

    pub fn apply_lisp(
        &self,
        text: &str,
        schema: Option<&Schema>,
        rows: &[Row],
    ) -> ExpressionResult<Vec<Value>> {
        self.evaluate(&syntax::parse_symbolic(text)?, schema, rows)
    }

    pub fn apply_json(
        &self,
        tree: &serde_json::Value,
        schema: Option<&Schema>,
        rows: &[Row],
    ) -> ExpressionResult<Vec<Value>> {
        self.evaluate(&syntax::from_json_tree(tree)?, schema, rows)
    }

    /// A supplied schema is used as is, even when empty; an absent one is
    /// inferred from the first row
    fn bind<'s>(&self, schema: Option<&'s Schema>, rows: &[Row]) -> Binding<'s> {
        match (schema, rows.first()) {
            (Some(schema), _) => Binding::Supplied(schema),
            (None, Some(first)) => Binding::Inferred(self.infer_schema(first)),
            (None, None) => Binding::Inferred(Schema::default()),
        }
    }

    fn describe(&self, expr: &Expression, checked: Checked<'_>) -> TypeDescriptor {
        let (optype, datatype) = checked.ty.descriptor();
        let value = if checked.fields.is_empty() && !checked.uses_aggregates {
            // Fold failures are left to evaluation to report
            Evaluator::new(&[]).evaluate(&checked.expr, 0).ok()
        } else {
            None
        };
        debug!("{} checks as {} ({:?})", expr, checked.ty, datatype);
        TypeDescriptor {
            optype,
            datatype,
            value,
            fields: checked.fields,
        }
    }
}

fn validate_rows(schema: &Schema, rows: &[Row]) -> ExpressionResult<()> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != schema.width() {
            return Err(ExpressionError::InvalidRow {
                row: i,
                expected: schema.width(),
                actual: row.len(),
            });
        }
    }
    Ok(())
}
