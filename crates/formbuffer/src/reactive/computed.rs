#![forbid(unsafe_code)]

//! Pull-based memoized derivations over [`Observable`] cells.
//!
//! A [`Computed<T>`] caches the result of a compute closure and re-runs it
//! only after one of its tracked cells has changed. Tracking is explicit:
//! after construction, wire each input with [`track()`](Computed::track).
//! This is what lets a conditional read path stay correct — track *every*
//! cell the closure may consult, including the one deciding the branch, and
//! a flip of the branch condition invalidates dependents even when the
//! previously returned value came from the other arm.
//!
//! # Invariants
//!
//! 1. `get()` never returns a value stale with respect to a tracked cell.
//! 2. The compute closure runs at most once per invalidation (memoization);
//!    repeated `get()` calls without an intervening change are O(1).
//! 3. `version()` increments by exactly 1 per recomputation.
//! 4. Cloning a `Computed` shares state; all clones observe the same cache.
//!
//! # Failure Modes
//!
//! - **Compute closure panics**: the previous cached value is kept and the
//!   stale flag stays raised, so the next `get()` retries.
//! - **Tracked cell dropped**: the wiring becomes inert; the cached value
//!   never goes stale from that input again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    /// None only before the first computation.
    cached: Option<T>,
    stale: Cell<bool>,
    version: u64,
    /// Subscription guards keeping the invalidation hooks alive.
    subscriptions: Vec<Subscription>,
}

/// A lazily recomputed value derived from tracked [`Observable`] cells.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("stale", &inner.stale.get())
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a derivation from a compute closure. Starts stale; the closure
    /// runs on the first `get()`. Inputs must be wired with
    /// [`track()`](Computed::track) to invalidate on change.
    #[must_use]
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute: Box::new(compute),
                cached: None,
                stale: Cell::new(true),
                version: 0,
                subscriptions: Vec::new(),
            })),
        }
    }

    /// Wire `source` as an input: any change to it marks this derivation
    /// stale. The wiring lives as long as the `Computed` (it holds no strong
    /// reference back, so no cycle).
    pub fn track<S: Clone + PartialEq + 'static>(&self, source: &Observable<S>) {
        let weak = Rc::downgrade(&self.inner);
        let sub = source.watch(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow().stale.set(true);
            }
        });
        self.inner.borrow_mut().subscriptions.push(sub);
    }

    /// Current value, recomputing first if any tracked input has changed.
    #[must_use]
    pub fn get(&self) -> T {
        self.refresh();
        let inner = self.inner.borrow();
        inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh")
            .clone()
    }

    /// Access the current value by reference without cloning. Recomputes
    /// first if stale.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        let inner = self.inner.borrow();
        f(inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    /// Whether the cached value is stale (a tracked input changed since the
    /// last computation, or nothing has been computed yet).
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.inner.borrow().stale.get()
    }

    /// Force staleness; the next `get()` recomputes.
    pub fn invalidate(&self) {
        self.inner.borrow().stale.set(true);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    fn refresh(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.stale.get() || inner.cached.is_none() {
            let value = (inner.compute)();
            inner.cached = Some(value);
            inner.stale.set(false);
            inner.version += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_after_tracked_change() {
        let source = Observable::new(10);
        let source_clone = source.clone();
        let doubled = Computed::new(move || source_clone.get() * 2);
        doubled.track(&source);

        assert_eq!(doubled.get(), 20);
        assert_eq!(doubled.version(), 1);

        source.set(5);
        assert!(doubled.is_stale());
        assert_eq!(doubled.get(), 10);
        assert_eq!(doubled.version(), 2);
    }

    #[test]
    fn memoizes_between_changes() {
        let runs = Rc::new(Cell::new(0u32));
        let runs_clone = Rc::clone(&runs);
        let source = Observable::new(1);
        let source_clone = source.clone();

        let derived = Computed::new(move || {
            runs_clone.set(runs_clone.get() + 1);
            source_clone.get() + 1
        });
        derived.track(&source);

        assert_eq!(derived.get(), 2);
        assert_eq!(derived.get(), 2);
        assert_eq!(runs.get(), 1);

        source.set(2);
        assert_eq!(derived.get(), 3);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn stale_initially_and_lazy() {
        let runs = Rc::new(Cell::new(0u32));
        let runs_clone = Rc::clone(&runs);
        let derived = Computed::new(move || {
            runs_clone.set(runs_clone.get() + 1);
            42
        });

        assert!(derived.is_stale());
        assert_eq!(runs.get(), 0);
        assert_eq!(derived.get(), 42);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn equal_write_does_not_invalidate() {
        let source = Observable::new(7);
        let source_clone = source.clone();
        let derived = Computed::new(move || source_clone.get());
        derived.track(&source);

        let _ = derived.get();
        source.set(7);
        assert!(!derived.is_stale());
        assert_eq!(derived.version(), 1);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let source = Observable::new(3);
        let source_clone = source.clone();
        let derived = Computed::new(move || source_clone.get());
        derived.track(&source);

        assert_eq!(derived.get(), 3);
        derived.invalidate();
        assert!(derived.is_stale());
        assert_eq!(derived.get(), 3);
        assert_eq!(derived.version(), 2);
    }

    #[test]
    fn multiple_tracked_inputs() {
        let first = Observable::new("John".to_string());
        let last = Observable::new("Doe".to_string());
        let f = first.clone();
        let l = last.clone();
        let full = Computed::new(move || format!("{} {}", f.get(), l.get()));
        full.track(&first);
        full.track(&last);

        assert_eq!(full.get(), "John Doe");
        first.set("Jane".to_string());
        assert_eq!(full.get(), "Jane Doe");
        last.set("Smith".to_string());
        assert_eq!(full.get(), "Jane Smith");
    }

    #[test]
    fn clone_shares_cache() {
        let source = Observable::new(1);
        let source_clone = source.clone();
        let a = Computed::new(move || source_clone.get());
        a.track(&source);
        let b = a.clone();

        assert_eq!(a.get(), 1);
        assert_eq!(b.version(), 1);

        source.set(2);
        assert_eq!(b.get(), 2);
        assert_eq!(a.version(), 2);
    }

    #[test]
    fn survives_source_drop() {
        let derived;
        {
            let source = Observable::new(9);
            let source_clone = source.clone();
            derived = Computed::new(move || source_clone.get());
            derived.track(&source);
            let _ = derived.get();
        }
        // The compute closure keeps its own handle, so the cell is still
        // alive through it; the point is the wiring stays valid.
        assert_eq!(derived.get(), 9);
        assert!(!derived.is_stale());
    }

    #[test]
    fn staleness_applies_inside_batch() {
        let source = Observable::new(0);
        let source_clone = source.clone();
        let derived = Computed::new(move || source_clone.get());
        derived.track(&source);
        let _ = derived.get();

        crate::reactive::batch(|| {
            source.set(1);
            // Invalidation is not deferred: a read inside the batch already
            // sees the fresh value.
            assert!(derived.is_stale());
            assert_eq!(derived.get(), 1);
        });
        assert_eq!(derived.get(), 1);
    }
}
