//! Rule-driven, memoized derivation of immutable JSON documents.
//!
//! An [`Engine`] holds a base descriptor, a context and a list of [`Rule`]s.
//! Whenever the context changes, every rule selects an operation-set by
//! validating context values against schemas, the selection is interpolated
//! with context values, and the operation-sets are applied to the descriptor.
//! Subscribers are told when, and only when, the derived document changes.
//!
//! # Core Concepts
//!
//! - **Rule**: `when` condition-maps (OR across maps, AND within one) choosing
//!   between a `then` and an `otherwise` operation-set
//! - **Validator**: the caller's schema predicate, see [`Validator`]
//! - **Resolver**: how context paths are looked up, see [`Resolver`]
//! - **PatchStrategy**: how an operation-set edits the document, see [`PatchStrategy`]
//!
//! # Memoization
//!
//! Each rule remembers the context values it read and its last result; while
//! those values are unchanged the rule is not re-evaluated. The engine also
//! caches documents per set of selected operation-sets, so two contexts that
//! select the same edits yield the same document reference.
//!
//! # Quick Start
//!
//! ```
//! use modifiable::{Engine, EngineConfig, Rule, ValidatorError, Value};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let rules = Rule::list_from_json(json!([{
//!     "when": [{"/formData/firstName": {"const": "Andrew"}}],
//!     "then": [{"op": "add", "path": "/placeholder", "value": "Hey {{/formData/firstName}}!"}]
//! }]))
//! .unwrap();
//!
//! let config = EngineConfig::json().with_validator(
//!     |schema: &Value, value: Option<&Value>| -> Result<bool, ValidatorError> {
//!         Ok(schema.get_key("const") == value)
//!     },
//! );
//! let engine = Engine::new(Value::from(json!({"type": "text"})), rules, config).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let _sub = engine.subscribe(move |doc| sink.borrow_mut().push(doc.to_json()));
//!
//! engine.set_context(Value::from(json!({"formData": {"firstName": "Andrew"}})));
//! assert_eq!(
//!     seen.borrow().as_slice(),
//!     [json!({"type": "text", "placeholder": "Hey Andrew!"})]
//! );
//! ```

mod cache;
mod config;
mod emitter;
mod engine;
mod error;
mod interpolate;
mod memo;
mod resolver;
mod rule;
mod strategy;
mod validator;

pub use cache::{is_empty_operations, ResultCache, Signature};
pub use config::EngineConfig;
pub use emitter::{Emitter, Event, Unsubscribe};
pub use engine::{Engine, EngineEvent, EventKind, WeakEngine};
pub use error::{EngineError, ErrorEvent, ErrorKind};
pub use interpolate::{Interpolator, MemoizedTemplate, DEFAULT_PATTERN};
pub use memo::{Dependencies, Dependency, Memo};
pub use resolver::{DotPathResolver, KeyResolver, PointerResolver, Resolver};
pub use rule::{Condition, Rule, Source};
pub use strategy::{JsonPatch, PatchStrategy, ShallowMerge};
pub use validator::{Validator, ValidatorError};

pub use modifiable_state::{Op, Patch, Pointer, StateError, StateResult, Value};
