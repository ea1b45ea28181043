//! Field descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expression::types::Type;

/// Coarse semantic category of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Numeric,
    Categorical,
    Text,
    Datetime,
    Items,
}

/// Storage type of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Double,
    String,
    Boolean,
    Datetime,
}

impl DataType {
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpType::Numeric => "numeric",
            OpType::Categorical => "categorical",
            OpType::Text => "text",
            OpType::Datetime => "datetime",
            OpType::Items => "items",
        };
        f.write_str(s)
    }
}

/// A declared column of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub optype: OpType,
    pub datatype: DataType,
    pub column_number: usize,
}

impl Field {
    pub fn new(
        id: impl Into<String>,
        optype: OpType,
        datatype: DataType,
        column_number: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            optype,
            datatype,
            column_number,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The expression type a reference to this field produces: the data type
    /// lifted through the operation type.
    pub fn value_type(&self) -> Type {
        match self.optype {
            OpType::Numeric if self.datatype.is_integral() => Type::Int,
            OpType::Numeric => Type::Real,
            OpType::Items => Type::Items,
            OpType::Categorical | OpType::Text | OpType::Datetime => {
                if self.datatype == DataType::Boolean {
                    Type::Boolean
                } else {
                    Type::Text
                }
            }
        }
    }
}

/// Field ids are the zero-padded hexadecimal column index
pub fn field_id(index: usize) -> String {
    format!("{:06x}", index)
}
