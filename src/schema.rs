//! Dataset schema: the declared fields an expression may reference.

pub mod field;
pub mod infer;

pub use field::{field_id, DataType, Field, OpType};
pub use infer::infer_schema;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Errors raised while assembling a schema
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum SchemaError {
    #[error("duplicate field id {id}")]
    DuplicateId { id: String },

    #[error("duplicate column number {column} (fields {first} and {second})")]
    DuplicateColumn {
        column: usize,
        first: String,
        second: String,
    },
}

/// Ordered fields indexed by id, name and column number.
///
/// Immutable once built; the type checker and evaluator only borrow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaInput", into = "SchemaOutput")]
pub struct Schema {
    fields: Vec<Field>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_column: HashMap<usize, usize>,
}

impl Schema {
    /// Build a schema, rejecting duplicate ids or column numbers
    pub fn new(fields: Vec<Field>) -> Result<Self, SchemaError> {
        let mut by_id = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::new();
        let mut by_column = HashMap::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            if by_id.insert(field.id.clone(), i).is_some() {
                return Err(SchemaError::DuplicateId {
                    id: field.id.clone(),
                });
            }
            if let Some(prev) = by_column.insert(field.column_number, i) {
                return Err(SchemaError::DuplicateColumn {
                    column: field.column_number,
                    first: fields[prev].id.clone(),
                    second: field.id.clone(),
                });
            }
            if let Some(name) = &field.name {
                by_name.entry(name.clone()).or_insert(i);
            }
        }

        Ok(Self {
            fields,
            by_id,
            by_name,
            by_column,
        })
    }

    /// Fields whose ids and columns are unique by construction
    pub(crate) fn from_positional(fields: Vec<Field>) -> Self {
        let by_id = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
        let by_column = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.column_number, i))
            .collect();
        Self {
            fields,
            by_id,
            by_name: HashMap::new(),
            by_column,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_by_id(&self, id: &str) -> Option<&Field> {
        self.by_id.get(id).map(|&i| &self.fields[i])
    }

    pub fn field_by_column(&self, column: usize) -> Option<&Field> {
        self.by_column.get(&column).map(|&i| &self.fields[i])
    }

    /// Resolve a textual reference: ids take precedence over names
    pub fn resolve(&self, key: &str) -> Option<&Field> {
        self.field_by_id(key)
            .or_else(|| self.by_name.get(key).map(|&i| &self.fields[i]))
    }

    /// Index of a field within rows bound to this schema
    pub fn position(&self, id: &str) -> Option<usize> {
        self.field_by_id(id).map(|f| f.column_number)
    }

    /// Number of values a row bound to this schema carries
    pub fn width(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.column_number + 1)
            .max()
            .unwrap_or(0)
    }

    /// Next free column number, used when appending a generated field
    pub fn next_column(&self) -> usize {
        self.width()
    }

    /// Copy of this schema with one more field
    pub fn with_field(&self, field: Field) -> Result<Self, SchemaError> {
        let mut fields = self.fields.clone();
        fields.push(field);
        Self::new(fields)
    }
}

/// Accepted JSON shapes: a list of fields, or a BigML-style map keyed by id
#[derive(Deserialize)]
struct SchemaInput {
    fields: FieldsInput,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldsInput {
    List(Vec<Field>),
    Map(BTreeMap<String, FieldEntry>),
}

#[derive(Deserialize)]
struct FieldEntry {
    #[serde(default)]
    name: Option<String>,
    optype: OpType,
    datatype: DataType,
    column_number: usize,
}

#[derive(Serialize)]
struct SchemaOutput {
    fields: Vec<Field>,
}

impl TryFrom<SchemaInput> for Schema {
    type Error = SchemaError;

    fn try_from(input: SchemaInput) -> Result<Self, Self::Error> {
        let fields = match input.fields {
            FieldsInput::List(fields) => fields,
            FieldsInput::Map(entries) => {
                let mut fields: Vec<Field> = entries
                    .into_iter()
                    .map(|(id, e)| Field {
                        id,
                        name: e.name,
                        optype: e.optype,
                        datatype: e.datatype,
                        column_number: e.column_number,
                    })
                    .collect();
                fields.sort_by_key(|f| f.column_number);
                fields
            }
        };
        Schema::new(fields)
    }
}

impl From<Schema> for SchemaOutput {
    fn from(schema: Schema) -> Self {
        SchemaOutput {
            fields: schema.fields,
        }
    }
}
