//! Expression AST definitions.

use crate::expression::types::Type;
use crate::value::Value;

/// Literal constant in an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Boolean(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl Literal {
    pub fn value(&self) -> Value {
        match self {
            Literal::Nil => Value::Missing,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Real(x) => Value::Real(*x),
            Literal::Text(s) => Value::Text(s.clone()),
        }
    }

    pub fn data_type(&self) -> Type {
        match self {
            Literal::Nil => Type::Null,
            Literal::Boolean(_) => Type::Boolean,
            Literal::Int(_) => Type::Int,
            Literal::Real(_) => Type::Real,
            Literal::Text(_) => Type::Text,
        }
    }
}

/// How a field reference names its field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Column position in the row
    Column(usize),
    /// Field id, or field name when no id matches
    Id(String),
}

/// `(f key)` or `(f key shift)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub key: FieldKey,
    /// Row offset relative to the current row; negative looks back
    pub shift: Option<i64>,
}

impl FieldRef {
    pub fn column(column: usize) -> Self {
        Self {
            key: FieldKey::Column(column),
            shift: None,
        }
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self {
            key: FieldKey::Id(id.into()),
            shift: None,
        }
    }

    pub fn shifted(mut self, shift: i64) -> Self {
        self.shift = Some(shift);
        self
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Literal),

    /// Reference to a dataset field
    Field(FieldRef),

    /// Reference to a `let`-bound name
    Var(String),

    /// Application of a registered primitive
    Call { name: String, args: Vec<Expression> },

    /// Local bindings, each visible to the following bindings and the body
    Let {
        bindings: Vec<(String, Expression)>,
        body: Box<Expression>,
    },
}

impl Expression {
    pub fn nil() -> Self {
        Expression::Literal(Literal::Nil)
    }

    pub fn bool(b: bool) -> Self {
        Expression::Literal(Literal::Boolean(b))
    }

    pub fn int(n: i64) -> Self {
        Expression::Literal(Literal::Int(n))
    }

    pub fn real(x: f64) -> Self {
        Expression::Literal(Literal::Real(x))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Expression::Literal(Literal::Text(s.into()))
    }

    pub fn column(column: usize) -> Self {
        Expression::Field(FieldRef::column(column))
    }

    pub fn field(id: impl Into<String>) -> Self {
        Expression::Field(FieldRef::id(id))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expression::Var(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            args,
        }
    }

    pub fn let_in(bindings: Vec<(&str, Expression)>, body: Expression) -> Self {
        Expression::Let {
            bindings: bindings
                .into_iter()
                .map(|(name, e)| (name.to_string(), e))
                .collect(),
            body: Box::new(body),
        }
    }

    /// Direct children, in path order (bindings first, then the body)
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal(_) | Expression::Field(_) | Expression::Var(_) => Vec::new(),
            Expression::Call { args, .. } => args.iter().collect(),
            Expression::Let { bindings, body } => bindings
                .iter()
                .map(|(_, e)| e)
                .chain(std::iter::once(body.as_ref()))
                .collect(),
        }
    }

    /// Check if this expression references no dataset fields
    pub fn is_field_free(&self) -> bool {
        match self {
            Expression::Field(_) => false,
            _ => self.children().iter().all(|c| c.is_field_free()),
        }
    }
}
