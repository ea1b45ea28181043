pub mod expression;
pub mod interpreter;
pub mod primitive;
pub mod schema;
pub mod source;
pub mod syntax;
pub mod value;

pub use expression::{ErrorKind, Expression, ExpressionError, ExpressionResult, Type};
pub use interpreter::{Generated, Interpreter, TypeDescriptor};
pub use primitive::Registry;
pub use schema::{infer_schema, Field, Schema};
pub use syntax::{from_json_tree, parse_symbolic, to_json_tree};
pub use value::{Row, Value};
