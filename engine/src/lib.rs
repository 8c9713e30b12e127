//! # Tether Engine
//!
//! The pure half of the tether record layer: it decides what a document looks
//! like after a partial update, without ever touching the network.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine only sees JSON values handed to it
//! - **Deterministic**: the same current value and update always produce the same result
//! - **Closed set of modes**: every [`UpdateMode`] is matched exhaustively
//!
//! ## Core Concepts
//!
//! ### Update modes
//!
//! An [`UpdateMode`] selects how an update payload is combined with the
//! current document:
//! - [`UpdateMode::Overwrite`] - the payload replaces the document
//! - [`UpdateMode::Shallow`] - top-level keys of the payload replace their counterparts
//! - [`UpdateMode::Deep`] - mappings are merged recursively, everything else is replaced
//! - [`UpdateMode::DeepConcat`] / [`UpdateMode::DeepConcatAll`] - like deep, but sequences are appended
//! - [`UpdateMode::DeepIgnore`] / [`UpdateMode::DeepConcatIgnore`] - honour the [`IGNORE_SENTINEL`]
//! - [`UpdateMode::RemoveKeys`] - the payload is a list of keys to drop
//!
//! ### Field guards
//!
//! [`apply_guards`] restores *locked* keys unconditionally and *protected*
//! keys when the update left them out.
//!
//! ## Quick Start
//!
//! ```rust
//! use tether_engine::{apply_guards, merge, KeyPolicy, UpdateMode};
//! use serde_json::json;
//!
//! let current = json!({"name": "A", "tags": ["x"], "secret": "S"});
//! let update = json!({"tags": ["y"], "secret": "hacked"});
//!
//! let mut next = merge(UpdateMode::DeepConcat, &current, &update).unwrap();
//! let policy = KeyPolicy::new().lock("secret");
//! apply_guards(&mut next, &current, &policy);
//!
//! assert_eq!(next, json!({"name": "A", "tags": ["x", "y"], "secret": "S"}));
//! ```

pub mod error;
pub mod guard;
pub mod merge;
pub mod mode;

// Re-export main types at crate root
pub use error::Error;
pub use guard::{apply_guards, KeyPolicy};
pub use merge::{
    deep_merge_with, key_list, merge, Combiner, ConcatAll, ConcatIgnore, ConcatScalars, IgnoreSentinel,
    NoOpinion, IGNORE_SENTINEL,
};
pub use mode::UpdateMode;

/// A top-level field name.
pub type FieldName = String;
