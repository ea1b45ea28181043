//! Immutable table of primitives, built once and shared by reference.

use std::collections::HashMap;
use thiserror::Error;

use super::{aggregate, arithmetic, comparison, logic, text, Primitive};
use crate::syntax::is_reserved;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("primitive {0} is already registered")]
    Duplicate(String),

    #[error("{0} is a reserved form and cannot name a primitive")]
    Reserved(String),
}

/// Named primitives, read-only once built. Lookups hand out a stable index
/// alongside the primitive so evaluators can key per-call caches by it.
#[derive(Debug, Clone)]
pub struct Registry {
    primitives: Vec<Primitive>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in primitive library
    pub fn with_builtins() -> Self {
        let mut builder = RegistryBuilder::default();
        let families = [
            arithmetic::primitives(),
            comparison::primitives(),
            logic::primitives(),
            text::primitives(),
            aggregate::primitives(),
        ];
        for primitive in families.into_iter().flatten() {
            // Built-in names are distinct and unreserved
            builder.insert(primitive);
        }
        builder.build()
    }

    pub fn lookup(&self, name: &str) -> Option<(usize, &Primitive)> {
        self.index
            .get(name)
            .map(|&id| (id, &self.primitives[id]))
    }

    pub fn get(&self, id: usize) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    /// Registered names in alphabetical order
    pub fn all_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.primitives.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.iter()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    primitives: Vec<Primitive>,
    index: HashMap<&'static str, usize>,
}

impl RegistryBuilder {
    pub fn register(mut self, primitive: Primitive) -> Result<Self, RegistryError> {
        if is_reserved(primitive.name) {
            return Err(RegistryError::Reserved(primitive.name.to_string()));
        }
        if self.index.contains_key(primitive.name) {
            return Err(RegistryError::Duplicate(primitive.name.to_string()));
        }
        self.insert(primitive);
        Ok(self)
    }

    fn insert(&mut self, primitive: Primitive) {
        self.index.insert(primitive.name, self.primitives.len());
        self.primitives.push(primitive);
    }

    pub fn build(self) -> Registry {
        Registry {
            primitives: self.primitives,
            index: self.index,
        }
    }
}
