//! JSON Patch operations.
//!
//! Each operation describes a single edit addressed by a [`Pointer`]. Operations
//! arriving as document values are parsed once, at [`Op::try_from`], and an
//! unknown `op` tag is rejected there rather than ignored later.

use crate::error::{StateError, StateResult};
use crate::value::{Map, Value};
use crate::Pointer;
use serde::{Deserialize, Serialize};

/// A single JSON Patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Op {
    /// Write a value; inserts into sequences.
    Add {
        /// Target pointer.
        path: Pointer,
        /// Value to write.
        value: Value,
    },

    /// Remove the value at the pointer.
    ///
    /// No-op if the path doesn't exist.
    Remove {
        /// Target pointer.
        path: Pointer,
    },

    /// Write a value; overwrites sequence elements in place.
    Replace {
        /// Target pointer.
        path: Pointer,
        /// Value to write.
        value: Value,
    },

    /// Write the node found at `from` to `path`, sharing it.
    Copy {
        /// Target pointer.
        path: Pointer,
        /// Source pointer. Required at apply time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Pointer>,
    },

    /// Remove the node at `from` and write it to `path`.
    Move {
        /// Target pointer.
        path: Pointer,
        /// Source pointer. Required at apply time.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<Pointer>,
    },

    /// Abort the enclosing patch unless the node at `path` equals `value`.
    Test {
        /// Tested pointer.
        path: Pointer,
        /// Expected value.
        value: Value,
    },
}

impl Op {
    /// Create an Add operation.
    #[inline]
    pub fn add(path: Pointer, value: impl Into<Value>) -> Self {
        Op::Add {
            path,
            value: value.into(),
        }
    }

    /// Create a Remove operation.
    #[inline]
    pub fn remove(path: Pointer) -> Self {
        Op::Remove { path }
    }

    /// Create a Replace operation.
    #[inline]
    pub fn replace(path: Pointer, value: impl Into<Value>) -> Self {
        Op::Replace {
            path,
            value: value.into(),
        }
    }

    /// Create a Copy operation.
    #[inline]
    pub fn copy(from: Pointer, path: Pointer) -> Self {
        Op::Copy {
            path,
            from: Some(from),
        }
    }

    /// Create a Move operation.
    #[inline]
    pub fn move_to(from: Pointer, path: Pointer) -> Self {
        Op::Move {
            path,
            from: Some(from),
        }
    }

    /// Create a Test operation.
    #[inline]
    pub fn test(path: Pointer, value: impl Into<Value>) -> Self {
        Op::Test {
            path,
            value: value.into(),
        }
    }

    /// Get the pointer this operation targets.
    #[inline]
    pub fn path(&self) -> &Pointer {
        match self {
            Op::Add { path, .. } => path,
            Op::Remove { path } => path,
            Op::Replace { path, .. } => path,
            Op::Copy { path, .. } => path,
            Op::Move { path, .. } => path,
            Op::Test { path, .. } => path,
        }
    }

    /// Get the operation name, as it appears in the `op` tag.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add { .. } => "add",
            Op::Remove { .. } => "remove",
            Op::Replace { .. } => "replace",
            Op::Copy { .. } => "copy",
            Op::Move { .. } => "move",
            Op::Test { .. } => "test",
        }
    }
}

impl TryFrom<&Value> for Op {
    type Error = StateError;

    fn try_from(raw: &Value) -> StateResult<Self> {
        let fields = raw.as_object().ok_or_else(|| {
            StateError::invalid_operation(format!(
                "expected operation object, found {}",
                raw.type_name()
            ))
        })?;
        let tag = fields
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| StateError::invalid_operation("missing string `op` tag"))?;

        let path = || {
            pointer_field(fields, "path")?.ok_or_else(|| {
                StateError::invalid_operation(format!("{tag} operation requires `path`"))
            })
        };
        let value = || {
            fields.get("value").cloned().ok_or_else(|| {
                StateError::invalid_operation(format!("{tag} operation requires `value`"))
            })
        };

        Ok(match tag {
            "add" => Op::Add {
                path: path()?,
                value: value()?,
            },
            "remove" => Op::Remove { path: path()? },
            "replace" => Op::Replace {
                path: path()?,
                value: value()?,
            },
            "copy" => Op::Copy {
                path: path()?,
                from: pointer_field(fields, "from")?,
            },
            "move" => Op::Move {
                path: path()?,
                from: pointer_field(fields, "from")?,
            },
            "test" => Op::Test {
                path: path()?,
                value: value()?,
            },
            other => return Err(StateError::unsupported_operation(other)),
        })
    }
}

fn pointer_field(fields: &Map, name: &str) -> StateResult<Option<Pointer>> {
    match fields.get(name) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let text = v.as_str().ok_or_else(|| {
                StateError::invalid_operation(format!("`{name}` must be a string"))
            })?;
            Pointer::parse(text).map(Some)
        }
    }
}
