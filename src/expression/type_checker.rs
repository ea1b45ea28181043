//! Type checking for expressions.
//!
//! Checking resolves every name once: field references become row positions,
//! variables become local slots and applications carry their primitive. The
//! resulting [`CheckedExpr`] is what the evaluator walks.

use log::trace;

use crate::expression::error::ExprPath;
use crate::expression::types::Type;
use crate::expression::{Expression, ExpressionError, ExpressionResult, FieldKey, FieldRef};
use crate::primitive::{EvalRule, Primitive, Reducer, Registry};
use crate::schema::Schema;
use crate::value::Value;

/// An expression with every name resolved against a registry and a schema
#[derive(Debug, Clone)]
pub(crate) enum CheckedExpr<'r> {
    Const(Value),
    Field {
        position: usize,
        shift: i64,
    },
    /// Slot in the evaluator's local stack, counted from the bottom
    Local(usize),
    Let {
        bindings: Vec<CheckedExpr<'r>>,
        body: Box<CheckedExpr<'r>>,
    },
    Call {
        prim: &'r Primitive,
        args: Vec<CheckedExpr<'r>>,
        ty: Type,
    },
    /// Whole-column reduction, cached per evaluation call under `key`
    Aggregate {
        key: (usize, usize),
        reduce: Reducer,
        position: usize,
        ty: Type,
    },
    Window {
        reduce: Reducer,
        position: usize,
        start: Box<CheckedExpr<'r>>,
        end: Box<CheckedExpr<'r>>,
        ty: Type,
    },
}

impl CheckedExpr<'_> {
    /// Whether the value is the same for every row: fields are only read
    /// through whole-column aggregates
    pub fn is_row_independent(&self) -> bool {
        match self {
            CheckedExpr::Const(_) | CheckedExpr::Local(_) | CheckedExpr::Aggregate { .. } => true,
            CheckedExpr::Field { .. } | CheckedExpr::Window { .. } => false,
            CheckedExpr::Let { bindings, body } => {
                bindings.iter().all(|b| b.is_row_independent()) && body.is_row_independent()
            }
            CheckedExpr::Call { args, .. } => args.iter().all(|a| a.is_row_independent()),
        }
    }
}

/// Result of a successful check
#[derive(Debug, Clone)]
pub(crate) struct Checked<'r> {
    pub expr: CheckedExpr<'r>,
    pub ty: Type,
    /// Referenced field ids, in order of first appearance
    pub fields: Vec<String>,
    pub uses_aggregates: bool,
}

/// Type checker for expressions
pub struct TypeChecker<'r, 's> {
    registry: &'r Registry,
    schema: &'s Schema,
    /// Names bound by enclosing `let` forms, innermost last
    scope: Vec<(String, Type)>,
    path: ExprPath,
    fields: Vec<String>,
    uses_aggregates: bool,
}

impl<'r, 's> TypeChecker<'r, 's> {
    pub fn new(registry: &'r Registry, schema: &'s Schema) -> Self {
        Self {
            registry,
            schema,
            scope: Vec::new(),
            path: ExprPath::root(),
            fields: Vec::new(),
            uses_aggregates: false,
        }
    }

    /// Type check an expression and return its result type
    pub fn check(self, expr: &Expression) -> ExpressionResult<Type> {
        Ok(self.resolve(expr)?.ty)
    }

    pub(crate) fn resolve(mut self, expr: &Expression) -> ExpressionResult<Checked<'r>> {
        let (checked, ty) = self.check_node(expr)?;
        Ok(Checked {
            expr: checked,
            ty,
            fields: self.fields,
            uses_aggregates: self.uses_aggregates,
        })
    }

    fn check_node(&mut self, expr: &Expression) -> ExpressionResult<(CheckedExpr<'r>, Type)> {
        match expr {
            Expression::Literal(lit) => Ok((CheckedExpr::Const(lit.value()), lit.data_type())),

            Expression::Field(field) => self.check_field(field),

            Expression::Var(name) => {
                let slot = self.scope.iter().rposition(|(bound, _)| bound == name);
                match slot {
                    Some(slot) => Ok((CheckedExpr::Local(slot), self.scope[slot].1)),
                    None => Err(ExpressionError::UnboundVariable {
                        name: name.clone(),
                        path: self.path.clone(),
                    }),
                }
            }

            Expression::Let { bindings, body } => {
                let depth = self.scope.len();
                let mut checked = Vec::with_capacity(bindings.len());
                for (i, (name, value)) in bindings.iter().enumerate() {
                    let (value, ty) = self.child(i, value)?;
                    checked.push(value);
                    self.scope.push((name.clone(), ty));
                }
                let body = self.child(bindings.len(), body);
                self.scope.truncate(depth);
                let (body, ty) = body?;
                Ok((
                    CheckedExpr::Let {
                        bindings: checked,
                        body: Box::new(body),
                    },
                    ty,
                ))
            }

            Expression::Call { name, args } => self.check_call(name, args),
        }
    }

    /// Check the `index`-th child, keeping the path in step
    fn child(
        &mut self,
        index: usize,
        expr: &Expression,
    ) -> ExpressionResult<(CheckedExpr<'r>, Type)> {
        self.path.push(index);
        let result = self.check_node(expr);
        self.path.pop();
        result
    }

    fn check_field(&mut self, field: &FieldRef) -> ExpressionResult<(CheckedExpr<'r>, Type)> {
        let schema = self.schema;
        let resolved = match &field.key {
            FieldKey::Column(column) => schema.field_by_column(*column),
            FieldKey::Id(key) => schema.resolve(key),
        };
        let Some(resolved) = resolved else {
            let field = match &field.key {
                FieldKey::Column(column) => column.to_string(),
                FieldKey::Id(key) => key.clone(),
            };
            return Err(ExpressionError::UnknownField {
                field,
                path: self.path.clone(),
            });
        };
        let position = schema
            .position(&resolved.id)
            .ok_or_else(|| ExpressionError::UnknownField {
                field: resolved.id.clone(),
                path: self.path.clone(),
            })?;

        if !self.fields.contains(&resolved.id) {
            self.fields.push(resolved.id.clone());
        }
        trace!("field {} resolved to position {}", resolved.id, position);

        Ok((
            CheckedExpr::Field {
                position,
                shift: field.shift.unwrap_or(0),
            },
            resolved.value_type(),
        ))
    }

    fn check_call(
        &mut self,
        name: &str,
        args: &[Expression],
    ) -> ExpressionResult<(CheckedExpr<'r>, Type)> {
        let mut checked = Vec::with_capacity(args.len());
        let mut types = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let (arg, ty) = self.child(i, arg)?;
            checked.push(arg);
            types.push(ty);
        }

        let registry = self.registry;
        let (id, prim) =
            registry
                .lookup(name)
                .ok_or_else(|| ExpressionError::UnknownPrimitive {
                    name: name.to_string(),
                    path: self.path.clone(),
                })?;

        if !prim.arity.accepts(args.len()) {
            return Err(ExpressionError::ArityMismatch {
                primitive: prim.name.to_string(),
                expected: prim.arity,
                actual: args.len(),
                path: self.path.clone(),
            });
        }

        for (position, (arg, ty)) in checked.iter().zip(&types).enumerate() {
            let Some(spec) = prim.arg_spec(position) else {
                continue;
            };
            let is_field = matches!(arg, CheckedExpr::Field { .. });
            if !spec.types.accepts(*ty) || (spec.field && !is_field) {
                return Err(ExpressionError::TypeMismatch {
                    primitive: prim.name.to_string(),
                    position,
                    expected: spec.types,
                    field_required: spec.field,
                    actual: *ty,
                    path: self.path.clone(),
                });
            }
        }

        let ty = (prim.result)(&types).map_err(|violation| ExpressionError::TypeMismatch {
            primitive: prim.name.to_string(),
            position: violation.position,
            expected: violation.expected,
            field_required: false,
            actual: types[violation.position],
            path: self.path.clone(),
        })?;

        let checked = match prim.rule {
            EvalRule::Aggregate(reduce) => {
                self.uses_aggregates = true;
                let position = field_position(&checked[0]);
                CheckedExpr::Aggregate {
                    key: (id, position),
                    reduce,
                    position,
                    ty,
                }
            }
            EvalRule::Window(reduce) => {
                let position = field_position(&checked[0]);
                let mut rest = checked.into_iter().skip(1);
                match (rest.next(), rest.next()) {
                    (Some(start), Some(end)) => CheckedExpr::Window {
                        reduce,
                        position,
                        start: Box::new(start),
                        end: Box::new(end),
                        ty,
                    },
                    _ => {
                        return Err(ExpressionError::ArityMismatch {
                            primitive: prim.name.to_string(),
                            expected: prim.arity,
                            actual: args.len(),
                            path: self.path.clone(),
                        })
                    }
                }
            }
            EvalRule::Row(_) | EvalRule::Control(_) => CheckedExpr::Call {
                prim,
                args: checked,
                ty,
            },
        };
        Ok((checked, ty))
    }
}

/// Row position of a field argument; argument constraints guarantee one
fn field_position(arg: &CheckedExpr<'_>) -> usize {
    match arg {
        CheckedExpr::Field { position, .. } => *position,
        _ => 0,
    }
}

/// Helper function to type check an expression
pub fn type_check_expression(
    expr: &Expression,
    registry: &Registry,
    schema: &Schema,
) -> ExpressionResult<Type> {
    TypeChecker::new(registry, schema).check(expr)
}
