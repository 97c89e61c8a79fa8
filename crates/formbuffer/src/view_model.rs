#![forbid(unsafe_code)]

//! The edit-buffer proxy: N field controllers behind one object.
//!
//! A [`ViewModel`] wraps a [`Model`] for one editing session. Reads and
//! writes from the form go through the view-model; `submit` flushes local
//! edits into the model as one batch, `reset` discards them. Fields never
//! written through the view-model stay live to the model at all times.
//!
//! # Invariants
//!
//! 1. The field set is captured once at construction and fixed thereafter;
//!    fields added to the model later are not tracked.
//! 2. `is_dirty` is derived from the per-field flags, never stored
//!    independently, so it cannot drift.
//! 3. `submit` and `reset` are single batches: an observer of the model or
//!    of any dirty flag never sees a torn intermediate state.
//! 4. The view-model mutates the model only inside `submit`, and only for
//!    fields Dirty at that moment.
//!
//! # Failure Modes
//!
//! - **Reserved field name**: a model field named like one of the view-model
//!   methods ([`RESERVED_NAMES`]) fails construction with
//!   [`ViewModelError::ReservedNameCollision`]; nothing is silently skipped.
//! - **Unknown field**: per-field operations with an uncaptured name fail
//!   with [`ViewModelError::UnknownField`]. Reads and writes of captured
//!   fields never fail.

use ahash::AHashMap;
use serde_json::Value;

use crate::error::{Result, ViewModelError};
use crate::field::FieldController;
use crate::model::Model;
use crate::reactive::{Computed, Observable, batch};

/// Names a model field may not use: they are the view-model's own API
/// surface. Construction fails fast on a collision.
pub const RESERVED_NAMES: [&str; 6] = [
    "submit",
    "reset",
    "reset_field",
    "is_dirty",
    "is_field_dirty",
    "model",
];

/// Dirty-tracking edit buffer over a [`Model`].
///
/// One per editing session; drop it when editing ends. The model's lifetime
/// is independent and it may be shared across several view-models
/// (uncoordinated: last submit wins).
#[derive(Debug)]
pub struct ViewModel<V> {
    model: Model<V>,
    /// Captured field names, in the model's capture order.
    names: Vec<String>,
    fields: AHashMap<String, FieldController<V>>,
    any_dirty: Computed<bool>,
}

impl<V: Clone + PartialEq + 'static> ViewModel<V> {
    /// Capture the model's current field set and build one Clean controller
    /// per field.
    pub fn new(model: &Model<V>) -> Result<Self> {
        let mut names = Vec::with_capacity(model.len());
        let mut fields = AHashMap::with_capacity(model.len());
        let mut flags: Vec<Observable<bool>> = Vec::with_capacity(model.len());

        for name in model.names() {
            if RESERVED_NAMES.contains(&name) {
                return Err(ViewModelError::reserved(name));
            }
            let Some(cell) = model.cell(name) else {
                continue;
            };
            let controller = FieldController::new(cell.clone());
            flags.push(controller.dirty_flag().clone());
            names.push(name.to_string());
            fields.insert(name.to_string(), controller);
        }

        let inputs = flags.clone();
        let any_dirty = Computed::new(move || inputs.iter().any(Observable::get));
        for flag in &flags {
            any_dirty.track(flag);
        }

        tracing::debug!(message = "view_model.new", fields = names.len());
        Ok(Self {
            model: model.clone(),
            names,
            fields,
            any_dirty,
        })
    }

    fn controller(&self, name: &str) -> Result<&FieldController<V>> {
        self.fields
            .get(name)
            .ok_or_else(|| ViewModelError::unknown_field(name))
    }

    /// The controller mediating the named field, for callers wanting the
    /// per-field surface (its dirty flag cell, a projection) directly.
    pub fn field(&self, name: &str) -> Result<&FieldController<V>> {
        self.controller(name)
    }

    /// Read a field through the buffer: the local edit while Dirty, the live
    /// model value while Clean.
    pub fn get(&self, name: &str) -> Result<V> {
        Ok(self.controller(name)?.get())
    }

    /// Write a local edit. The model is untouched until [`submit`](Self::submit).
    pub fn set(&self, name: &str, value: V) -> Result<()> {
        self.controller(name)?.set(value);
        Ok(())
    }

    /// Whether any field holds a pending edit. Derived on demand from the
    /// per-field flags.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.any_dirty.get()
    }

    /// Whether the named field holds a pending edit.
    pub fn is_field_dirty(&self, name: &str) -> Result<bool> {
        Ok(self.controller(name)?.is_dirty())
    }

    /// Commit every pending edit into the model, then return every field to
    /// Clean, as one batch. Model subscribers observe one flush for all
    /// committed changes; no observer sees some fields committed and others
    /// not. Idempotent.
    pub fn submit(&self) {
        let dirty = self
            .names
            .iter()
            .filter_map(|n| self.fields.get(n))
            .filter(|f| f.is_dirty())
            .count();
        tracing::debug!(message = "view_model.submit", dirty, fields = self.names.len());
        batch(|| {
            for name in &self.names {
                if let Some(field) = self.fields.get(name) {
                    field.submit();
                }
            }
        });
    }

    /// Discard every pending edit without touching the model, as one batch.
    /// Idempotent.
    pub fn reset(&self) {
        tracing::debug!(message = "view_model.reset", fields = self.names.len());
        batch(|| {
            for name in &self.names {
                if let Some(field) = self.fields.get(name) {
                    field.reset();
                }
            }
        });
    }

    /// Discard the named field's pending edit; other fields are untouched.
    pub fn reset_field(&self, name: &str) -> Result<()> {
        self.controller(name)?.reset();
        Ok(())
    }

    /// The wrapped model, unchanged, for callers needing direct access.
    #[must_use]
    pub fn model(&self) -> &Model<V> {
        &self.model
    }

    /// Captured field names in capture order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Reactive handle for [`is_dirty`](Self::is_dirty).
    #[must_use]
    pub fn watch_dirty(&self) -> Computed<bool> {
        self.any_dirty.clone()
    }

    /// Reactive projection of one field's buffered value; recomputes on
    /// local edits, on upstream edits while Clean, and on the Clean/Dirty
    /// flip itself.
    pub fn watch(&self, name: &str) -> Result<Computed<V>> {
        Ok(self.controller(name)?.watch())
    }
}

impl ViewModel<Value> {
    /// Build the model and the view-model from a JSON object in one step.
    pub fn from_json(value: Value) -> Result<Self> {
        let model = Model::from_json(value)?;
        Self::new(&model)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
