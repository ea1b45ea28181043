//! Expression representation, type checking and evaluation.
//!
//! This module provides:
//! - The expression AST shared by both surface syntaxes
//! - Static types and the constraint lattice
//! - Type checking against a registry and a schema
//! - Evaluation of checked expressions over row sets

pub mod error;
pub mod eval;
pub mod expr;
pub mod type_checker;
pub mod types;

pub use error::{ErrorKind, EvalFault, ExprPath, ExpressionError, ExpressionResult};
pub use expr::{Expression, FieldKey, FieldRef, Literal};
pub use type_checker::{type_check_expression, TypeChecker};
pub use types::{Type, TypeSet};
