//! Error types for modifiable-state operations.

use thiserror::Error;

/// Result type alias for modifiable-state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while addressing or patching a document.
#[derive(Debug, Error)]
pub enum StateError {
    /// The pointer string is not a valid JSON Pointer.
    #[error("invalid JSON pointer {pointer:?}: {reason}")]
    InvalidPointer {
        /// The offending pointer text.
        pointer: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A value required by an operation does not exist.
    #[error("path not found: {pointer}")]
    PathNotFound {
        /// The pointer that did not resolve.
        pointer: String,
    },

    /// Sequence index is past the insertion point.
    #[error("index {index} out of bounds (len: {len}) at {pointer}")]
    IndexOutOfBounds {
        /// The pointer being written.
        pointer: String,
        /// The index that was addressed.
        index: usize,
        /// The actual length of the sequence.
        len: usize,
    },

    /// A segment addressed the wrong kind of node.
    #[error("type mismatch at {pointer}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The pointer being resolved.
        pointer: String,
        /// The expected node kind.
        expected: &'static str,
        /// The node kind actually found.
        found: &'static str,
    },

    /// `copy` or `move` was given without a `from` pointer.
    #[error("`from` is required for {op} operation")]
    MissingFrom {
        /// The operation kind.
        op: &'static str,
    },

    /// The `op` tag is not one of the six JSON Patch operations.
    #[error("operation {op:?} not supported")]
    UnsupportedOperation {
        /// The rejected tag.
        op: String,
    },

    /// A `test` operation did not match.
    #[error("test of {pointer} for {expected} failed - received {found}")]
    TestMismatch {
        /// The tested pointer.
        pointer: String,
        /// The value the operation expected, as JSON text.
        expected: String,
        /// The value actually found, as JSON text.
        found: String,
    },

    /// The operation could not be parsed.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong.
        message: String,
    },

    /// Shallow merge requires objects on both sides.
    #[error("merge requires object value, found {found}")]
    MergeRequiresObject {
        /// The node kind that was found instead.
        found: &'static str,
    },

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StateError {
    /// Create an invalid pointer error.
    #[inline]
    pub fn invalid_pointer(pointer: impl Into<String>, reason: &'static str) -> Self {
        StateError::InvalidPointer {
            pointer: pointer.into(),
            reason,
        }
    }

    /// Create a path not found error.
    #[inline]
    pub fn path_not_found(pointer: impl ToString) -> Self {
        StateError::PathNotFound {
            pointer: pointer.to_string(),
        }
    }

    /// Create an index out of bounds error.
    #[inline]
    pub fn index_out_of_bounds(pointer: impl ToString, index: usize, len: usize) -> Self {
        StateError::IndexOutOfBounds {
            pointer: pointer.to_string(),
            index,
            len,
        }
    }

    /// Create a type mismatch error.
    #[inline]
    pub fn type_mismatch(pointer: impl ToString, expected: &'static str, found: &'static str) -> Self {
        StateError::TypeMismatch {
            pointer: pointer.to_string(),
            expected,
            found,
        }
    }

    /// Create an unsupported operation error.
    #[inline]
    pub fn unsupported_operation(op: impl Into<String>) -> Self {
        StateError::UnsupportedOperation { op: op.into() }
    }

    /// Create an invalid operation error.
    #[inline]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        StateError::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error is a soft `test` abort rather than a failure.
    #[inline]
    pub fn is_test_mismatch(&self) -> bool {
        matches!(self, StateError::TestMismatch { .. })
    }
}
