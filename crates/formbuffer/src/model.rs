#![forbid(unsafe_code)]

//! The canonical reactive data object being edited.
//!
//! A [`Model<V>`] is an ordered set of named reactive cells. It is the
//! external side of the edit buffer: the application (or anything else)
//! owns it, mutates it, and subscribes to it; a [`ViewModel`](crate::ViewModel)
//! only holds handles to its cells and writes them during commit.
//!
//! # Invariants
//!
//! 1. Field order is capture (insertion) order and is the iteration order of
//!    every aggregate operation built on top.
//! 2. Cloning a `Model` clones handles: a clone is the *same* model as far
//!    as reactivity is concerned.
//! 3. `insert` with an existing name overwrites the value in place; it never
//!    creates a second cell or changes the field order.

use ahash::AHashMap;
use serde_json::Value;
use std::fmt;

use crate::error::{Result, ViewModelError};
use crate::reactive::Observable;

/// An ordered collection of named reactive cells.
pub struct Model<V> {
    names: Vec<String>,
    cells: AHashMap<String, Observable<V>>,
}

impl<V> Clone for Model<V> {
    fn clone(&self) -> Self {
        Self {
            names: self.names.clone(),
            cells: self.cells.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Model<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in &self.names {
            if let Some(cell) = self.cells.get(name) {
                map.entry(name, cell);
            }
        }
        map.finish()
    }
}

impl<V: Clone + PartialEq + 'static> Default for Model<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + PartialEq + 'static> Model<V> {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            cells: AHashMap::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a field, or overwrite the value of an existing one.
    pub fn insert(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        if let Some(cell) = self.cells.get(&name) {
            cell.set(value);
        } else {
            self.names.push(name.clone());
            self.cells.insert(name, Observable::new(value));
        }
    }

    /// Current value of a field, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<V> {
        self.cells.get(name).map(Observable::get)
    }

    /// Write a field's value. Returns false for unknown names. Writing the
    /// current value is a no-op (no notification).
    pub fn set(&self, name: &str, value: V) -> bool {
        match self.cells.get(name) {
            Some(cell) => {
                cell.set(value);
                true
            }
            None => false,
        }
    }

    /// The underlying cell for a field, if present.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<&Observable<V>> {
        self.cells.get(name)
    }

    /// Field names in capture order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }
}

impl Model<Value> {
    /// Build a model from a JSON object, one field per key.
    ///
    /// Fails with [`ViewModelError::InvalidModel`] for any non-object value
    /// (including `null`).
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut model = Self::new();
                for (name, value) in map {
                    model.insert(name, value);
                }
                Ok(model)
            }
            other => Err(ViewModelError::InvalidModel {
                found: json_type_name(&other),
            }),
        }
    }

    /// Snapshot the current field values as a JSON object, in field order.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for name in &self.names {
            if let Some(cell) = self.cells.get(name) {
                map.insert(name.clone(), cell.get());
            }
        }
        Value::Object(map)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
