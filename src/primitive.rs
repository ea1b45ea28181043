//! Primitives: named, typed operators usable inside expressions.
//!
//! A primitive declares its arity, one constraint per argument position (the
//! last constraint repeats for variadic primitives), a rule computing its
//! result type from the argument types, and an evaluation rule.

pub mod aggregate;
pub mod arithmetic;
pub mod comparison;
pub mod logic;
pub mod registry;
pub mod text;

pub use registry::{Registry, RegistryBuilder, RegistryError};

use serde::Serialize;
use std::fmt;

use crate::expression::error::EvalFault;
use crate::expression::types::{Type, TypeSet};
use crate::value::Value;

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(lo, hi) => lo <= count && count <= hi,
        }
    }

    /// A count this arity rejects, if any
    pub fn rejected_count(&self) -> Option<usize> {
        match *self {
            Arity::Exact(n) => Some(n + 1),
            Arity::AtLeast(0) => None,
            Arity::AtLeast(n) => Some(n - 1),
            Arity::Between(_, hi) => Some(hi + 1),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(lo, hi) => write!(f, "{} to {}", lo, hi),
        }
    }
}

/// Constraint on one argument position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub types: TypeSet,
    /// The argument must be a field reference, not a computed value
    pub field: bool,
}

pub const ANY: ArgSpec = ArgSpec {
    types: TypeSet::Any,
    field: false,
};
pub const NUMERIC: ArgSpec = ArgSpec {
    types: TypeSet::Numeric,
    field: false,
};
pub const INTEGER: ArgSpec = ArgSpec {
    types: TypeSet::Integer,
    field: false,
};
pub const BOOLEAN: ArgSpec = ArgSpec {
    types: TypeSet::Boolean,
    field: false,
};
pub const TEXT: ArgSpec = ArgSpec {
    types: TypeSet::Text,
    field: false,
};
pub const ITEMS: ArgSpec = ArgSpec {
    types: TypeSet::Items,
    field: false,
};
pub const SEQUENCE: ArgSpec = ArgSpec {
    types: TypeSet::Sequence,
    field: false,
};
pub const NUMERIC_FIELD: ArgSpec = ArgSpec {
    types: TypeSet::Numeric,
    field: true,
};
pub const ANY_FIELD: ArgSpec = ArgSpec {
    types: TypeSet::Any,
    field: true,
};

/// Reason a result rule rejects otherwise acceptable argument types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleViolation {
    pub position: usize,
    pub expected: TypeSet,
}

/// Computes a primitive's result type from its argument types
pub type ResultRule = fn(&[Type]) -> Result<Type, RuleViolation>;

/// Per-row evaluation over already evaluated arguments. The second parameter
/// is the result type established by the type checker.
pub type RowFn = fn(&[Value], Type) -> Result<Value, EvalFault>;

/// Reduction over a sequence of field values (whole column or window)
pub type Reducer = fn(&[&Value], Type) -> Result<Value, EvalFault>;

/// Control forms evaluate their arguments lazily
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    If,
    Cond,
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, Copy)]
pub enum EvalRule {
    Row(RowFn),
    Control(Control),
    /// Reduction over the referenced field across all rows, computed once
    /// per evaluation call
    Aggregate(Reducer),
    /// Reduction over the referenced field in rows `[i + start, i + end]`;
    /// arguments are `(field start end)`
    Window(Reducer),
}

/// What happens when an argument evaluates to missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Any missing argument makes the result missing, without invoking the rule
    Propagate,
    /// The rule sees missing arguments and decides itself
    Handles,
}

#[derive(Debug, Clone)]
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
    pub args: &'static [ArgSpec],
    pub result: ResultRule,
    pub rule: EvalRule,
    pub missing: MissingPolicy,
    pub doc: &'static str,
}

impl Primitive {
    pub fn new(
        name: &'static str,
        arity: Arity,
        args: &'static [ArgSpec],
        result: ResultRule,
        rule: EvalRule,
    ) -> Self {
        Self {
            name,
            arity,
            args,
            result,
            rule,
            missing: MissingPolicy::Propagate,
            doc: "",
        }
    }

    pub fn handles_missing(mut self) -> Self {
        self.missing = MissingPolicy::Handles;
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    /// Constraint for an argument position; the last one repeats
    pub fn arg_spec(&self, position: usize) -> Option<&ArgSpec> {
        self.args.get(position).or_else(|| self.args.last())
    }
}

// Result rules shared across primitive families

pub(crate) fn numeric_result(types: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::numeric_join(types))
}

pub(crate) fn real_result(_: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::Real)
}

pub(crate) fn int_result(_: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::Int)
}

pub(crate) fn bool_result(_: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::Boolean)
}

pub(crate) fn text_result(_: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::Text)
}

/// Numeric type of the first argument
pub(crate) fn first_result(types: &[Type]) -> Result<Type, RuleViolation> {
    Ok(Type::numeric_join(&types[..1.min(types.len())]))
}

/// The narrowest constraint admitting a type
pub(crate) fn set_of(ty: Type) -> TypeSet {
    match ty {
        Type::Int | Type::Real => TypeSet::Numeric,
        Type::Boolean => TypeSet::Boolean,
        Type::Text => TypeSet::Text,
        Type::Items => TypeSet::Items,
        Type::Null => TypeSet::Any,
    }
}

/// Unify the types at the given positions, reporting the first that clashes
pub(crate) fn unify_at(types: &[Type], positions: &[usize]) -> Result<Type, RuleViolation> {
    let mut acc = Type::Null;
    for &position in positions {
        acc = acc.unify(types[position]).ok_or(RuleViolation {
            position,
            expected: set_of(acc),
        })?;
    }
    Ok(acc)
}
