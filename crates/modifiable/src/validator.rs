//! The validator predicate rules are evaluated with.
//!
//! The schema language is the caller's business: a [`Validator`] only answers
//! whether a context value satisfies a schema value.

use modifiable_state::Value;
use thiserror::Error;

/// A validator could not evaluate a schema.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidatorError {
    message: String,
}

impl ValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Decides whether `value` satisfies `schema`.
///
/// `value` is `None` when the condition path does not resolve in the context.
pub trait Validator {
    fn validate(&self, schema: &Value, value: Option<&Value>) -> Result<bool, ValidatorError>;

    /// Name used in `Debug` output of configurations.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> Validator for F
where
    F: Fn(&Value, Option<&Value>) -> Result<bool, ValidatorError>,
{
    fn validate(&self, schema: &Value, value: Option<&Value>) -> Result<bool, ValidatorError> {
        self(schema, value)
    }
}
