//! Data sources that hand the interpreter fully materialized rows, and a
//! sampler applying expressions to what they return.

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::expression::ExpressionResult;
use crate::interpreter::{Interpreter, TypeDescriptor};
use crate::schema::Schema;
use crate::value::{Row, Value};

/// Rows taken when no sample size is given
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Rows fetched from a dataset, with the schema when the source knows it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub schema: Option<Schema>,
    pub rows: Vec<Row>,
}

/// Anything able to produce rows for a dataset reference
pub trait DataSource {
    fn fetch_rows(&self, dataset: &str, row_limit: usize) -> Result<Sample>;
}

/// Fixture source keeping samples in memory
#[derive(Debug, Default)]
pub struct InMemorySource {
    datasets: HashMap<String, Sample>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: impl Into<String>, sample: Sample) {
        self.datasets.insert(dataset.into(), sample);
    }
}

impl DataSource for InMemorySource {
    fn fetch_rows(&self, dataset: &str, row_limit: usize) -> Result<Sample> {
        let Some(sample) = self.datasets.get(dataset) else {
            bail!("Dataset '{}' does not exist", dataset);
        };
        Ok(Sample {
            schema: sample.schema.clone(),
            rows: sample.rows.iter().take(row_limit).cloned().collect(),
        })
    }
}

/// Reads datasets from `<root>/<dataset>.json` files holding
/// `{"fields": ..., "rows": [...]}`; `fields` is optional
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, dataset: &str) -> PathBuf {
        let mut path = self.root.join(dataset);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        path
    }
}

impl DataSource for JsonFileSource {
    fn fetch_rows(&self, dataset: &str, row_limit: usize) -> Result<Sample> {
        read_sample(&self.path_for(dataset), row_limit)
    }
}

#[derive(Deserialize)]
struct SampleFile {
    #[serde(default)]
    rows: Vec<Row>,
}

/// Load a sample file, keeping at most `row_limit` rows
pub fn read_sample(path: &Path, row_limit: usize) -> Result<Sample> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample file {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Sample file {} is not valid JSON", path.display()))?;

    let schema = match document.get("fields") {
        Some(_) => Some(
            serde_json::from_value::<Schema>(document.clone())
                .with_context(|| format!("Invalid fields in {}", path.display()))?,
        ),
        None => None,
    };
    let SampleFile { mut rows } = serde_json::from_value(document)
        .with_context(|| format!("Invalid rows in {}", path.display()))?;
    rows.truncate(row_limit);

    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(Sample { schema, rows })
}

/// Applies expressions to a sample taken from a data source
pub struct Sampler<S> {
    source: S,
    interpreter: Interpreter,
    sample: Sample,
}

impl<S: DataSource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self::with_interpreter(source, Interpreter::new())
    }

    pub fn with_interpreter(source: S, interpreter: Interpreter) -> Self {
        Self {
            source,
            interpreter,
            sample: Sample::default(),
        }
    }

    /// Replace the current sample with at most `size` rows of `dataset`
    pub fn take_sample(&mut self, dataset: &str, size: usize) -> Result<&Sample> {
        let sample = self
            .source
            .fetch_rows(dataset, size)
            .with_context(|| format!("Failed to sample dataset '{}'", dataset))?;
        info!("sampled {} rows from {}", sample.rows.len(), dataset);
        self.sample = sample;
        Ok(&self.sample)
    }

    pub fn rows(&self) -> &[Row] {
        &self.sample.rows
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.sample.schema.as_ref()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn check_lisp(&self, text: &str) -> ExpressionResult<TypeDescriptor> {
        let expr = self.interpreter.parse_symbolic(text)?;
        self.interpreter.check_with_rows(&expr, self.schema(), self.rows())
    }

    pub fn apply_lisp(&self, text: &str) -> ExpressionResult<Vec<Value>> {
        self.interpreter.apply_lisp(text, self.schema(), self.rows())
    }

    pub fn apply_json(&self, tree: &serde_json::Value) -> ExpressionResult<Vec<Value>> {
        self.interpreter.apply_json(tree, self.schema(), self.rows())
    }
}
