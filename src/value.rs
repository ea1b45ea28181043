//! Runtime values flowing through rows and expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expression::error::EvalFault;

/// A single cell of a dataset row, or the result of evaluating an expression.
///
/// The JSON mapping is direct: `null` is the missing marker, JSON integers are
/// `Int`, JSON numbers with a fraction or exponent are `Real`, arrays are
/// multi-valued (items) cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Boolean(bool),
    Int(i64),
    Real(f64),
    Text(String),
    List(Vec<Value>),
}

/// An ordered sequence of values, positionally matching a schema.
pub type Row = Vec<Value>;

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Short name of the runtime kind, used in evaluation faults
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }

    pub fn as_f64(&self) -> Result<f64, EvalFault> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Real(x) => Ok(*x),
            other => Err(EvalFault::NotNumeric {
                actual: other.kind_name(),
            }),
        }
    }

    /// Integer view of a value. Reals are accepted only when integral, so an
    /// int-typed expression never silently absorbs a fraction.
    pub fn as_i64(&self) -> Result<i64, EvalFault> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Real(x) if x.fract() == 0.0 && x.is_finite() => Ok(*x as i64),
            other => Err(EvalFault::NotInteger {
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalFault> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(EvalFault::NotBoolean {
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalFault> {
        match self {
            Value::Text(s) => Ok(s),
            other => Err(EvalFault::NotText {
                actual: other.kind_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}
