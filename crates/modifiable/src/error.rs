//! Engine errors and the events reported on the error channel.

use crate::validator::ValidatorError;
use modifiable_state::StateError;
use thiserror::Error;

/// Errors returned directly to the caller of an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine cannot be built from the given configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    State(#[from] StateError),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Discriminant of an [`ErrorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Patch,
}

/// A failure isolated during a run and reported instead of propagated.
#[derive(Debug, Error)]
pub enum ErrorEvent {
    /// The validator failed on one condition entry; the condition did not match.
    #[error("rule {rule}: validation of {path} failed: {source}")]
    Validation {
        rule: usize,
        path: String,
        source: ValidatorError,
    },

    /// A selected operation-set could not be applied; its effect was skipped.
    #[error("rule {rule}: patch failed: {source}")]
    Patch { rule: usize, source: StateError },
}

impl ErrorEvent {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorEvent::Validation { .. } => ErrorKind::Validation,
            ErrorEvent::Patch { .. } => ErrorKind::Patch,
        }
    }

    /// Index of the rule whose evaluation or operation-set failed.
    pub fn rule(&self) -> usize {
        match self {
            ErrorEvent::Validation { rule, .. } | ErrorEvent::Patch { rule, .. } => *rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_event_accessors() {
        let event = ErrorEvent::Patch {
            rule: 2,
            source: StateError::path_not_found("/a"),
        };
        assert_eq!(event.kind(), ErrorKind::Patch);
        assert_eq!(event.rule(), 2);
        assert!(event.to_string().contains("path not found: /a"));
        assert!(event.source().is_some());
    }

    #[test]
    fn test_validation_event_display() {
        let event = ErrorEvent::Validation {
            rule: 0,
            path: "/x".into(),
            source: ValidatorError::new("bad schema"),
        };
        assert_eq!(event.kind(), ErrorKind::Validation);
        assert_eq!(event.to_string(), "rule 0: validation of /x failed: bad schema");
    }

    #[test]
    fn test_engine_error_from_state() {
        let err: EngineError = StateError::invalid_pointer("a", "must start with '/'").into();
        assert!(matches!(err, EngineError::State(StateError::InvalidPointer { .. })));
        assert_eq!(
            EngineError::configuration("validator is required").to_string(),
            "configuration error: validator is required"
        );
    }
}
