//! Schema inference from a sample row.

use log::debug;

use crate::schema::field::{field_id, DataType, Field, OpType};
use crate::schema::Schema;
use crate::value::Value;

/// Build a schema from one row by classifying each value's runtime kind:
/// integers become numeric int64 fields, reals numeric float64 fields, and
/// everything else (booleans included) categorical strings.
pub fn infer_schema(row: &[Value]) -> Schema {
    let fields = row
        .iter()
        .enumerate()
        .map(|(column, value)| {
            let (optype, datatype) = match value {
                Value::Int(_) => (OpType::Numeric, DataType::Int64),
                Value::Real(_) => (OpType::Numeric, DataType::Float64),
                _ => (OpType::Categorical, DataType::String),
            };
            Field::new(field_id(column), optype, datatype, column)
        })
        .collect::<Vec<_>>();
    debug!("inferred schema with {} fields", fields.len());
    Schema::from_positional(fields)
}
