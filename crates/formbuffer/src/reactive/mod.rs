#![forbid(unsafe_code)]

//! Minimal reactive-cell capability for the edit buffer.
//!
//! - [`Observable`]: a shared, version-tracked value cell with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`batch`]: defer notifications so a multi-cell transition is observed
//!   as one consistent step.
//! - [`Computed`]: a lazily recomputed, memoized derivation over tracked
//!   cells.
//!
//! This is deliberately not a general reactive runtime: there is no implicit
//! dependency graph and no scheduler. Dependencies are wired explicitly with
//! [`Computed::track`], and propagation is plain synchronous callbacks.

pub mod computed;
pub mod observable;

pub use computed::Computed;
pub use observable::{Observable, Subscription, batch};
