use crate::error::EngineError;
use crate::interpolate::DEFAULT_PATTERN;
use crate::resolver::{KeyResolver, PointerResolver, Resolver};
use crate::strategy::{JsonPatch, PatchStrategy, ShallowMerge};
use crate::validator::Validator;
use modifiable_state::{Map, Value};
use regex::Regex;
use std::rc::Rc;

/// Construction options for an [`Engine`](crate::Engine).
#[derive(Clone)]
pub struct EngineConfig {
    /// Initial context. Defaults to an empty object.
    pub context: Value,
    /// Schema predicate used by rule conditions. Required.
    pub validator: Option<Rc<dyn Validator>>,
    /// Context path lookup for conditions and placeholders.
    pub resolver: Rc<dyn Resolver>,
    /// How selected operation-sets are applied to the document.
    pub patch: Rc<dyn PatchStrategy>,
    /// Placeholder regex; group 1 captures the context path.
    ///
    /// `None` disables interpolation.
    pub pattern: Option<String>,
    /// Maximum number of remembered run results. `None` is unbounded.
    pub result_cache_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context: Value::object(Map::new()),
            validator: None,
            resolver: Rc::new(PointerResolver),
            patch: Rc::new(JsonPatch),
            pattern: Some(DEFAULT_PATTERN.to_string()),
            result_cache_capacity: None,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("context", &self.context)
            .field(
                "validator",
                &self.validator.as_ref().map(|validator| validator.name()),
            )
            .field("resolver", &self.resolver.name())
            .field("patch", &self.patch.name())
            .field("pattern", &self.pattern)
            .field("result_cache_capacity", &self.result_cache_capacity)
            .finish()
    }
}

impl EngineConfig {
    /// Pointer paths and JSON Patch operation-sets. Same as `default()`.
    pub fn json() -> Self {
        Self::default()
    }

    /// Top-level key paths and shallow-merge operation-sets.
    pub fn merge() -> Self {
        Self {
            resolver: Rc::new(KeyResolver),
            patch: Rc::new(ShallowMerge),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<Value>) -> Self {
        self.context = context.into();
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Rc::new(resolver);
        self
    }

    #[must_use]
    pub fn with_patch(mut self, patch: impl PatchStrategy + 'static) -> Self {
        self.patch = Rc::new(patch);
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Use operation-sets verbatim, without placeholder substitution.
    #[must_use]
    pub fn without_interpolation(mut self) -> Self {
        self.pattern = None;
        self
    }

    #[must_use]
    pub fn with_result_cache_capacity(mut self, capacity: usize) -> Self {
        self.result_cache_capacity = Some(capacity);
        self
    }

    pub(crate) fn require_validator(&self) -> Result<Rc<dyn Validator>, EngineError> {
        self.validator
            .clone()
            .ok_or_else(|| EngineError::configuration("a validator is required"))
    }

    pub(crate) fn compile_pattern(&self) -> Result<Option<Regex>, EngineError> {
        let Some(source) = &self.pattern else {
            return Ok(None);
        };
        let regex = Regex::new(source)
            .map_err(|err| EngineError::configuration(format!("invalid interpolation pattern: {err}")))?;
        if regex.captures_len() < 2 {
            return Err(EngineError::configuration(format!(
                "interpolation pattern {source:?} must capture the context path"
            )));
        }
        Ok(Some(regex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidatorError;

    fn always(_: &Value, _: Option<&Value>) -> Result<bool, ValidatorError> {
        Ok(true)
    }

    #[test]
    fn test_default_profile() {
        let config = EngineConfig::default();
        assert_eq!(config.resolver.name(), "pointer");
        assert_eq!(config.patch.name(), "json_patch");
        assert!(config.context.is_object());
        assert!(config.validator.is_none());
    }

    #[test]
    fn test_merge_profile() {
        let config = EngineConfig::merge().with_validator(always);
        assert_eq!(config.resolver.name(), "key");
        assert_eq!(config.patch.name(), "shallow_merge");
        assert!(config.require_validator().is_ok());
    }

    #[test]
    fn test_missing_validator() {
        let err = EngineConfig::json().require_validator().err().unwrap();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_pattern_validation() {
        assert!(EngineConfig::default().compile_pattern().unwrap().is_some());
        assert!(EngineConfig::default()
            .without_interpolation()
            .compile_pattern()
            .unwrap()
            .is_none());
        assert!(EngineConfig::default().with_pattern("(").compile_pattern().is_err());
        assert!(EngineConfig::default()
            .with_pattern(r"\$\w+")
            .compile_pattern()
            .is_err());
        assert!(EngineConfig::default()
            .with_pattern(r"\$\{([^}]+)\}")
            .compile_pattern()
            .is_ok());
    }

    #[test]
    fn test_debug_names_collaborators() {
        let debug = format!("{:?}", EngineConfig::merge().with_validator(always));
        assert!(debug.contains("shallow_merge"));
        assert!(debug.contains("Some(\"custom\")"));
    }
}
