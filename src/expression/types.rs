//! Static types and the constraint lattice used by primitive signatures.

use serde::Serialize;
use std::fmt;

use crate::schema::{DataType, OpType};

/// Static type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Real,
    Boolean,
    Text,
    Items,
    /// Type of the `nil` literal; accepted by every constraint
    Null,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Real)
    }

    /// Operation type and data type reported for a result of this type
    pub fn descriptor(&self) -> (OpType, DataType) {
        match self {
            Type::Int => (OpType::Numeric, DataType::Int64),
            Type::Real => (OpType::Numeric, DataType::Float64),
            Type::Boolean => (OpType::Categorical, DataType::Boolean),
            Type::Text | Type::Null => (OpType::Categorical, DataType::String),
            Type::Items => (OpType::Items, DataType::String),
        }
    }

    /// Common type of two branches, if any. Integers widen to reals, `Null`
    /// gives way to anything.
    pub fn unify(self, other: Type) -> Option<Type> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Type::Null, t) | (t, Type::Null) => Some(t),
            (Type::Int, Type::Real) | (Type::Real, Type::Int) => Some(Type::Real),
            _ => None,
        }
    }

    /// Result of numeric-numeric arithmetic: real if any operand is real
    pub fn numeric_join(types: &[Type]) -> Type {
        if types.contains(&Type::Real) {
            Type::Real
        } else {
            Type::Int
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Int => "integer",
            Type::Real => "real",
            Type::Boolean => "boolean",
            Type::Text => "text",
            Type::Items => "items",
            Type::Null => "nil",
        };
        f.write_str(s)
    }
}

/// A set of accepted argument types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSet {
    /// `{integer, real}`
    Numeric,
    Integer,
    Boolean,
    /// Categorical and text values
    Text,
    Items,
    /// Text or items, anything with a length
    Sequence,
    Any,
}

impl TypeSet {
    pub fn accepts(&self, ty: Type) -> bool {
        if ty == Type::Null {
            return true;
        }
        match self {
            TypeSet::Numeric => ty.is_numeric(),
            TypeSet::Integer => ty == Type::Int,
            TypeSet::Boolean => ty == Type::Boolean,
            TypeSet::Text => ty == Type::Text,
            TypeSet::Items => ty == Type::Items,
            TypeSet::Sequence => matches!(ty, Type::Text | Type::Items),
            TypeSet::Any => true,
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeSet::Numeric => "numeric",
            TypeSet::Integer => "integer",
            TypeSet::Boolean => "boolean",
            TypeSet::Text => "text",
            TypeSet::Items => "items",
            TypeSet::Sequence => "text or items",
            TypeSet::Any => "any",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice() {
        assert!(TypeSet::Numeric.accepts(Type::Int));
        assert!(TypeSet::Numeric.accepts(Type::Real));
        assert!(!TypeSet::Numeric.accepts(Type::Text));
        assert!(!TypeSet::Integer.accepts(Type::Real));
        assert!(TypeSet::Sequence.accepts(Type::Items));
        assert!(TypeSet::Any.accepts(Type::Boolean));

        // nil fits everywhere, it is resolved at runtime
        assert!(TypeSet::Boolean.accepts(Type::Null));
    }

    #[test]
    fn test_unify_and_join() {
        assert_eq!(Type::Int.unify(Type::Real), Some(Type::Real));
        assert_eq!(Type::Null.unify(Type::Text), Some(Type::Text));
        assert_eq!(Type::Text.unify(Type::Int), None);

        assert_eq!(Type::numeric_join(&[Type::Int, Type::Int]), Type::Int);
        assert_eq!(Type::numeric_join(&[Type::Int, Type::Real]), Type::Real);
        assert_eq!(Type::numeric_join(&[Type::Null, Type::Int]), Type::Int);
    }
}
