//! Immutable JSON documents with JSON Pointer addressing and JSON Patch.
//!
//! `modifiable-state` provides the document model underneath `modifiable`:
//! reference-counted, structurally shared values and pure functions that edit
//! them.
//!
//! # Core Concepts
//!
//! - **Value**: a cheaply clonable handle to an immutable node
//! - **Pointer**: a parsed JSON Pointer with immutable `get`/`set`/`unset`
//! - **Op**: one JSON Patch operation (`add`, `remove`, `replace`, `copy`, `move`, `test`)
//! - **Patch**: an ordered list of operations
//!
//! # Structural Sharing
//!
//! ```text
//! Doc' = apply_patch(Doc, Patch)
//! ```
//!
//! - `apply_patch` never mutates its input
//! - only the ancestors of written locations are re-allocated
//! - an edit that changes nothing returns the input handle itself
//!
//! # Quick Start
//!
//! ```
//! use modifiable_state::{apply_patch, Op, Patch, Pointer, Value};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"user": {"name": "Ada"}, "tags": ["a"]}));
//!
//! let patch = Patch::new()
//!     .with_op(Op::add(Pointer::root().key("tags").key("-"), "b"))
//!     .with_op(Op::replace(Pointer::root().key("user").key("name"), "Grace"));
//!
//! let next = apply_patch(&doc, &patch).unwrap();
//! assert_eq!(next.to_json(), json!({"user": {"name": "Grace"}, "tags": ["a", "b"]}));
//! assert_eq!(doc.to_json()["user"]["name"], "Ada"); // Original unchanged
//! ```

mod apply;
mod error;
mod op;
mod patch;
pub mod pointer;
mod value;

pub use apply::{apply_merge, apply_op, apply_patch, apply_patch_value};
pub use error::{StateError, StateResult};
pub use op::Op;
pub use patch::Patch;
pub use pointer::Pointer;
pub use value::{value_type_name, Map, Node, Value};
