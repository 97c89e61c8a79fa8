#![forbid(unsafe_code)]

//! Reactive cells: shared, version-tracked values with change notification.
//!
//! [`Observable<T>`] is the single capability the edit buffer consumes from
//! its environment: a readable, writable cell that notifies subscribers on
//! change. [`batch()`] defers those notifications so that a multi-cell
//! transition (commit, rollback) is observed as one consistent step.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Cloning an `Observable` clones a *handle*; all clones refer to
//! the same cell. Subscribers are stored as `Weak` callbacks and pruned
//! lazily during notification; the returned [`Subscription`] is the owning
//! RAII guard.
//!
//! # Invariants
//!
//! 1. Version increments by exactly 1 per mutation that changes the value.
//! 2. Setting a value equal to the current value is a no-op (no version
//!    bump, no notification, no invalidation).
//! 3. Subscribers are notified in registration order.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. Inside [`batch()`], writes apply immediately but each cell notifies
//!    its subscribers at most once, after the outermost batch exits, with
//!    its value at flush time.
//! 6. [`watch()`](Observable::watch) invalidation hooks run synchronously at
//!    write time, inside or outside a batch; only
//!    [`subscribe()`](Observable::subscribe) callbacks are deferred. Pull-
//!    based dependents are therefore already stale before the first
//!    deferred subscriber of the batch runs.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: remaining subscribers for that cycle are not
//!   called; the cell's value and version are already committed.
//! - **Write from inside a subscriber**: allowed; the nested write runs a
//!   fresh notification cycle (or joins an enclosing batch).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static BATCH_QUEUE: RefCell<Vec<Box<dyn FnOnce()>>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` with change notifications deferred until the outermost batch
/// exits.
///
/// Writes inside the batch take effect immediately (reads observe the new
/// values); each changed cell notifies its subscribers at most once, after
/// `f` returns, with the value current at flush time. Batches nest: inner
/// batches fold into the outermost one. Invalidation hooks
/// ([`Observable::watch`]) are not deferred; they run at write time.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    struct DepthGuard;
    impl Drop for DepthGuard {
        fn drop(&mut self) {
            BATCH_DEPTH.with(|d| d.set(d.get() - 1));
        }
    }

    BATCH_DEPTH.with(|d| d.set(d.get() + 1));
    let result = {
        let _guard = DepthGuard;
        f()
    };
    if BATCH_DEPTH.with(Cell::get) == 0 {
        flush();
    }
    result
}

fn batch_active() -> bool {
    BATCH_DEPTH.with(Cell::get) > 0
}

fn enqueue(notify: Box<dyn FnOnce()>) {
    BATCH_QUEUE.with(|q| q.borrow_mut().push(notify));
}

fn flush() {
    loop {
        let pending: Vec<Box<dyn FnOnce()>> = BATCH_QUEUE.with(|q| std::mem::take(&mut *q.borrow_mut()));
        if pending.is_empty() {
            break;
        }
        for notify in pending {
            notify();
        }
    }
}

/// RAII guard for a registered subscriber.
///
/// The callback stays registered exactly as long as the `Subscription` is
/// alive; dropping it unsubscribes.
pub struct Subscription {
    _keep: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

struct ObservableInner<T> {
    value: T,
    /// Monotone counter, bumped once per value-changing write.
    version: u64,
    /// True while a deferred notification for this cell sits in the batch
    /// queue.
    queued: bool,
    /// Value callbacks, deferred by an enclosing batch.
    subscribers: Vec<Weak<dyn Fn(&T)>>,
    /// Invalidation hooks, run synchronously at write time.
    invalidators: Vec<Weak<dyn Fn()>>,
}

/// A shared, observable value cell.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new cell holding `value`, at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                queued: false,
                subscribers: Vec::new(),
                invalidators: Vec::new(),
            })),
        }
    }

    /// Current value, cloned.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store `value`. No-op when equal to the current value; otherwise bumps
    /// the version and notifies subscribers (deferred inside a batch).
    pub fn set(&self, value: T) {
        let changed = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                false
            } else {
                inner.value = value;
                inner.version += 1;
                true
            }
        };
        if changed {
            self.propagate();
        }
    }

    /// Store `value` and return the previous value. Same no-op-on-equal rule
    /// as [`set`](Self::set).
    pub fn replace(&self, value: T) -> T {
        let (previous, changed) = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.value != value;
            if changed {
                inner.version += 1;
            }
            (std::mem::replace(&mut inner.value, value), changed)
        };
        if changed {
            self.propagate();
        }
        previous
    }

    /// Register a change callback. Called with the new value after each
    /// value-changing write (once per batch). Callbacks run in registration
    /// order.
    #[must_use]
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<dyn Fn(&T)> = Rc::new(f);
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|w| w.strong_count() > 0);
        inner.subscribers.push(Rc::downgrade(&callback));
        drop(inner);
        Subscription {
            _keep: Box::new(callback),
        }
    }

    /// Register a value-agnostic invalidation hook. Unlike
    /// [`subscribe`](Self::subscribe), hooks run synchronously at write
    /// time, even inside a batch, so pull-based dependents go stale before
    /// any deferred subscriber observes the change.
    #[must_use]
    pub fn watch(&self, f: impl Fn() + 'static) -> Subscription {
        let hook: Rc<dyn Fn()> = Rc::new(f);
        let mut inner = self.inner.borrow_mut();
        inner.invalidators.retain(|w| w.strong_count() > 0);
        inner.invalidators.push(Rc::downgrade(&hook));
        drop(inner);
        Subscription {
            _keep: Box::new(hook),
        }
    }

    /// Monotone change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of currently live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether `other` is a handle to the same cell.
    #[must_use]
    pub fn same_cell(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A committed change: invalidate immediately, then notify subscribers
    /// (deferred by any enclosing batch).
    fn propagate(&self) {
        let hooks: Vec<Rc<dyn Fn()>> = {
            let mut inner = self.inner.borrow_mut();
            inner.invalidators.retain(|w| w.strong_count() > 0);
            inner.invalidators.iter().filter_map(Weak::upgrade).collect()
        };
        for hook in hooks {
            hook();
        }
        self.schedule();
    }

    fn schedule(&self) {
        if batch_active() {
            {
                let mut inner = self.inner.borrow_mut();
                if inner.queued {
                    return;
                }
                inner.queued = true;
            }
            let handle = self.clone();
            enqueue(Box::new(move || {
                handle.inner.borrow_mut().queued = false;
                handle.notify();
            }));
        } else {
            self.notify();
        }
    }

    fn notify(&self) {
        // Collect live callbacks and release the borrow before calling out,
        // so subscribers may freely read or write this cell.
        let callbacks: Vec<Rc<dyn Fn(&T)>> = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        let value = self.inner.borrow().value.clone();
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
