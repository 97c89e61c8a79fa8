#![forbid(unsafe_code)]

//! Per-field Clean/Dirty state machine with overlay storage.
//!
//! A [`FieldController`] mediates reads and writes for one model field.
//! While Clean it holds no value of its own: every read forwards to the
//! model's cell, so upstream edits are always visible. The first write
//! through the controller stores an overlay value and flips the field Dirty;
//! from then on reads return the overlay and upstream changes are masked
//! until the field is committed or rolled back.
//!
//! ```text
//! Clean --set--> Dirty
//! Dirty --set--> Dirty      (overlay replaced)
//! Dirty --submit--> Clean   (model mutated)
//! Dirty --reset--> Clean    (model untouched)
//! Clean --submit/reset--> Clean  (no-op)
//! ```
//!
//! # Invariants
//!
//! 1. `dirty` is raised iff the overlay holds a value.
//! 2. A Clean controller never caches a snapshot: each Clean read re-queries
//!    the model's cell.
//! 3. The overlay reaches the model only through `submit`; `reset` discards
//!    it without consulting it.
//! 4. Every state transition runs inside a batch, so subscribers of the
//!    three cells never observe a half-applied transition.
//! 5. `submit` writes the model cell at most once per call; combined with
//!    the cell's equal-value no-op, model subscribers see at most one
//!    notification per committed change.

use crate::reactive::{Computed, Observable, batch};

/// Mediates get/set for one field and owns its dirty/clean transition.
///
/// Cloning a controller clones handles to the same three cells.
#[derive(Debug, Clone)]
pub struct FieldController<V> {
    /// Handle to the model's cell for this field. Not owned; the model (and
    /// anything else holding the cell) sees every `submit`.
    upstream: Observable<V>,
    /// The pending local edit, present exactly while the field is Dirty.
    overlay: Observable<Option<V>>,
    dirty: Observable<bool>,
}

impl<V: Clone + PartialEq + 'static> FieldController<V> {
    /// A new, Clean controller over the given model cell.
    #[must_use]
    pub fn new(upstream: Observable<V>) -> Self {
        Self {
            upstream,
            overlay: Observable::new(None),
            dirty: Observable::new(false),
        }
    }

    /// Current value as seen through the proxy: the overlay while Dirty,
    /// the live model value while Clean. The dirty flag is consulted first,
    /// unconditionally, so the branch choice itself is part of the field's
    /// observable state.
    #[must_use]
    pub fn get(&self) -> V {
        if self.dirty.get() {
            if let Some(value) = self.overlay.with(Clone::clone) {
                return value;
            }
        }
        self.upstream.get()
    }

    /// Store a local edit and flip to Dirty. While already Dirty this only
    /// replaces the overlay value. The model is never touched.
    pub fn set(&self, value: V) {
        batch(|| {
            self.overlay.set(Some(value));
            self.dirty.set(true);
        });
    }

    /// Commit the overlay into the model and return to Clean. No-op while
    /// Clean; idempotent.
    pub fn submit(&self) {
        if !self.dirty.get() {
            return;
        }
        batch(|| {
            if let Some(value) = self.overlay.replace(None) {
                self.upstream.set(value);
            }
            self.dirty.set(false);
        });
    }

    /// Discard the overlay and return to Clean without touching the model.
    /// No-op while Clean; idempotent.
    pub fn reset(&self) {
        if !self.dirty.get() {
            return;
        }
        batch(|| {
            self.overlay.set(None);
            self.dirty.set(false);
        });
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// The dirty flag cell, for aggregate derivations.
    #[must_use]
    pub fn dirty_flag(&self) -> &Observable<bool> {
        &self.dirty
    }

    /// A reactive projection of [`get`](Self::get): recomputes when the
    /// overlay, the model cell, *or the dirty flag itself* changes, so a
    /// Clean/Dirty flip invalidates dependents even though the previously
    /// read arm did not change.
    #[must_use]
    pub fn watch(&self) -> Computed<V> {
        let this = self.clone();
        let projection = Computed::new(move || this.get());
        projection.track(&self.dirty);
        projection.track(&self.overlay);
        projection.track(&self.upstream);
        projection
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
