//! Error types for parsing, checking and evaluating expressions.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::expression::types::{Type, TypeSet};
use crate::primitive::Arity;
use crate::schema::SchemaError;

/// Location of a sub-expression: argument indices walked from the root.
/// `let` bindings count first, the body last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExprPath(pub Vec<usize>);

impl ExprPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for ExprPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Runtime failures raised by primitive evaluation rules
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum EvalFault {
    #[error("division by zero")]
    DivisionByZero,

    #[error("expected a number, got {actual}")]
    NotNumeric { actual: &'static str },

    #[error("expected an integer, got {actual}")]
    NotInteger { actual: &'static str },

    #[error("expected a boolean, got {actual}")]
    NotBoolean { actual: &'static str },

    #[error("expected text, got {actual}")]
    NotText { actual: &'static str },

    #[error("integer overflow in {operation}")]
    Overflow { operation: &'static str },
}

/// Errors that can occur while handling an expression.
///
/// Check-time variants name the offending sub-expression by path.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpressionError {
    #[error("syntax error: {message}{}", offset.map(|o| format!(" (at offset {})", o)).unwrap_or_default())]
    Syntax {
        message: String,
        offset: Option<usize>,
    },

    #[error("unknown field {field} at {path}")]
    UnknownField { field: String, path: ExprPath },

    #[error("unbound variable {name} at {path}")]
    UnboundVariable { name: String, path: ExprPath },

    #[error("unknown primitive {name} at {path}")]
    UnknownPrimitive { name: String, path: ExprPath },

    #[error("{primitive} expects {expected} arguments, got {actual} at {path}")]
    ArityMismatch {
        primitive: String,
        expected: Arity,
        actual: usize,
        path: ExprPath,
    },

    #[error(
        "argument {position} of {primitive} expects {}{expected}, got {actual} at {path}",
        if *field_required { "a field reference of type " } else { "" }
    )]
    TypeMismatch {
        primitive: String,
        position: usize,
        expected: TypeSet,
        field_required: bool,
        actual: Type,
        path: ExprPath,
    },

    #[error("row {row} has {actual} values but the schema expects {expected}")]
    InvalidRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("evaluation failed at row {row}: {source}")]
    Evaluation { row: usize, source: EvalFault },
}

/// Discriminant of an [`ExpressionError`], for callers that only care
/// about the category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Syntax,
    UnknownField,
    UnboundVariable,
    UnknownPrimitive,
    ArityMismatch,
    TypeMismatch,
    InvalidRow,
    Schema,
    Evaluation,
}

impl ExpressionError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ExpressionError::Syntax {
            message: message.into(),
            offset: None,
        }
    }

    pub(crate) fn syntax_at(message: impl Into<String>, offset: usize) -> Self {
        ExpressionError::Syntax {
            message: message.into(),
            offset: Some(offset),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpressionError::Syntax { .. } => ErrorKind::Syntax,
            ExpressionError::UnknownField { .. } => ErrorKind::UnknownField,
            ExpressionError::UnboundVariable { .. } => ErrorKind::UnboundVariable,
            ExpressionError::UnknownPrimitive { .. } => ErrorKind::UnknownPrimitive,
            ExpressionError::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            ExpressionError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ExpressionError::InvalidRow { .. } => ErrorKind::InvalidRow,
            ExpressionError::Schema(_) => ErrorKind::Schema,
            ExpressionError::Evaluation { .. } => ErrorKind::Evaluation,
        }
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::syntax_at("unbalanced parentheses", 7);
        assert_eq!(
            err.to_string(),
            "syntax error: unbalanced parentheses (at offset 7)"
        );

        let err = ExpressionError::UnknownField {
            field: "999999".to_string(),
            path: ExprPath(vec![1]),
        };
        assert_eq!(err.to_string(), "unknown field 999999 at 1");

        let err = ExpressionError::ArityMismatch {
            primitive: "abs".to_string(),
            expected: Arity::Exact(1),
            actual: 2,
            path: ExprPath::root(),
        };
        assert_eq!(err.to_string(), "abs expects 1 arguments, got 2 at root");

        let err = ExpressionError::TypeMismatch {
            primitive: "mean".to_string(),
            position: 0,
            expected: TypeSet::Numeric,
            field_required: true,
            actual: Type::Int,
            path: ExprPath(vec![0, 2]),
        };
        assert_eq!(
            err.to_string(),
            "argument 0 of mean expects a field reference of type numeric, got integer at 0.2"
        );

        let err = ExpressionError::Evaluation {
            row: 3,
            source: EvalFault::DivisionByZero,
        };
        assert_eq!(err.to_string(), "evaluation failed at row 3: division by zero");
        assert_eq!(err.kind(), ErrorKind::Evaluation);
    }

    #[test]
    fn test_serialized_diagnostic() {
        let err = ExpressionError::UnknownPrimitive {
            name: "frob".to_string(),
            path: ExprPath(vec![0]),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "unknown_primitive");
        assert_eq!(json["name"], "frob");
        assert_eq!(json["path"], serde_json::json!([0]));
    }
}
