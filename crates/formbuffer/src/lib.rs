#![forbid(unsafe_code)]

//! Buffered form editing over reactive models.
//!
//! `formbuffer` sits between an editable form and a canonical reactive data
//! object: the form reads and writes a [`ViewModel`], which buffers every
//! edit locally until an explicit [`submit`](ViewModel::submit) and can throw
//! edits away with [`reset`](ViewModel::reset). Per field, exactly one of two
//! sources of truth is authoritative at any moment — the local edit (Dirty)
//! or the live model cell (Clean) — and Clean fields stay live to upstream
//! changes made by anyone else holding the model.
//!
//! ```
//! use formbuffer::{Model, ViewModel};
//!
//! let model = Model::new().with_field("title", "Test".to_string());
//! let vm = ViewModel::new(&model)?;
//!
//! // Clean fields are live to the model.
//! model.set("title", "Get coffee".to_string());
//! assert_eq!(vm.get("title")?, "Get coffee");
//!
//! // Edits are buffered, not written through.
//! vm.set("title", "Get tea".to_string())?;
//! assert_eq!(model.get("title").as_deref(), Some("Get coffee"));
//! assert!(vm.is_dirty());
//!
//! // Commit is one atomic batch.
//! vm.submit();
//! assert_eq!(model.get("title").as_deref(), Some("Get tea"));
//! assert!(!vm.is_dirty());
//! # Ok::<(), formbuffer::ViewModelError>(())
//! ```
//!
//! The crate carries its own minimal reactive-cell layer ([`reactive`]):
//! [`Observable`] cells with subscriber callbacks, [`batch`] for atomic
//! multi-cell transitions, and pull-based [`Computed`] derivations. It is
//! single-threaded (`Rc`-based) and fully synchronous.

pub mod error;
pub mod field;
pub mod model;
pub mod reactive;
pub mod view_model;

pub use error::{Result, ViewModelError};
pub use field::FieldController;
pub use model::Model;
pub use reactive::{Computed, Observable, Subscription, batch};
pub use view_model::{RESERVED_NAMES, ViewModel};
