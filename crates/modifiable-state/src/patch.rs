//! Patch containers for grouping operations.
//!
//! A `Patch` is an ordered list of operations applied left to right, each to
//! the result of the previous one.

use crate::error::{StateError, StateResult};
use crate::{Op, Value};
use serde::{Deserialize, Serialize};

/// An ordered sequence of operations.
///
/// # Examples
///
/// ```
/// use modifiable_state::{Op, Patch, Pointer};
///
/// let patch = Patch::new()
///     .with_op(Op::add(Pointer::root().key("name"), "Alice"))
///     .with_op(Op::remove(Pointer::root().key("age")));
///
/// assert_eq!(patch.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<Op>,
}

impl Patch {
    /// Create an empty patch.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a patch with the given operations.
    #[inline]
    pub fn with_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Add an operation to this patch (builder pattern).
    #[inline]
    pub fn with_op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    /// Push an operation onto this patch.
    #[inline]
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Get the operations in this patch.
    #[inline]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Iterate over the operations.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }
}

impl TryFrom<&Value> for Patch {
    type Error = StateError;

    /// Parse a sequence of operation objects. `null` is the empty patch.
    fn try_from(raw: &Value) -> StateResult<Self> {
        if raw.is_null() {
            return Ok(Patch::new());
        }
        let items = raw.as_array().ok_or_else(|| {
            StateError::invalid_operation(format!(
                "expected a sequence of operations, found {}",
                raw.type_name()
            ))
        })?;
        items.iter().map(Op::try_from).collect()
    }
}

impl FromIterator<Op> for Patch {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
