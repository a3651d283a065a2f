//! Declarative rules and their stateful, memoized evaluation.
//!
//! A [`Rule`] maps conditions over the context to an operation-set. `when` is a
//! list of condition-maps matched with OR semantics; each map pairs context
//! paths with schemas and matches with AND semantics. The first matching map
//! selects `then`, otherwise `otherwise` (empty when absent) is selected, and
//! the selection is interpolated against the context.

use crate::error::ErrorEvent;
use crate::interpolate::{Interpolator, MemoizedTemplate};
use crate::memo::{Dependencies, Memo};
use crate::validator::Validator;
use modifiable_state::Value;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Context path → schema. Matches when every entry validates.
pub type Condition = BTreeMap<String, Value>;

/// A rule field given either as a literal or as a function of the context.
pub enum Source<T> {
    Static(T),
    Dynamic(Rc<dyn Fn(&Value) -> T>),
}

impl<T> Source<T> {
    pub fn dynamic(f: impl Fn(&Value) -> T + 'static) -> Self {
        Source::Dynamic(Rc::new(f))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Source::Dynamic(_))
    }
}

impl<T> From<T> for Source<T> {
    fn from(value: T) -> Self {
        Source::Static(value)
    }
}

impl<T: Clone> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Source::Static(v) => Source::Static(v.clone()),
            Source::Dynamic(f) => Source::Dynamic(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Source::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// A declarative condition → operation-set mapping.
///
/// # Examples
///
/// ```
/// use modifiable::Rule;
/// use serde_json::json;
///
/// let rule = Rule::from_json(json!({
///     "when": [{"/contextPath": {"const": "1"}}],
///     "then": [{"op": "remove", "path": "/validations/0"}],
///     "otherwise": [{"op": "remove", "path": "/validations"}]
/// }))
/// .unwrap();
/// assert!(rule.then.is_some());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RuleDef")]
pub struct Rule {
    pub when: Source<Vec<Condition>>,
    pub then: Option<Source<Value>>,
    pub otherwise: Option<Source<Value>>,
}

#[derive(Deserialize)]
struct RuleDef {
    #[serde(default)]
    when: Vec<Condition>,
    #[serde(default)]
    then: Option<Value>,
    #[serde(default)]
    otherwise: Option<Value>,
}

impl From<RuleDef> for Rule {
    fn from(def: RuleDef) -> Self {
        Self {
            when: Source::Static(def.when),
            then: def.then.map(Source::Static),
            otherwise: def.otherwise.map(Source::Static),
        }
    }
}

impl Rule {
    pub fn new(when: impl Into<Source<Vec<Condition>>>) -> Self {
        Self {
            when: when.into(),
            then: None,
            otherwise: None,
        }
    }

    /// Parse a rule from its JSON form.
    pub fn from_json(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw)
    }

    /// Parse a list of rules from its JSON form.
    pub fn list_from_json(raw: serde_json::Value) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_value(raw)
    }

    #[must_use]
    pub fn with_then(mut self, then: impl Into<Source<Value>>) -> Self {
        self.then = Some(then.into());
        self
    }

    #[must_use]
    pub fn with_otherwise(mut self, otherwise: impl Into<Source<Value>>) -> Self {
        self.otherwise = Some(otherwise.into());
        self
    }

    fn is_dynamic(&self) -> bool {
        self.when.is_dynamic()
            || self.then.as_ref().is_some_and(Source::is_dynamic)
            || self.otherwise.as_ref().is_some_and(Source::is_dynamic)
    }
}

/// What a rule needs from the engine to evaluate.
pub(crate) struct Evaluator {
    pub validator: Rc<dyn Validator>,
    pub interpolator: Interpolator,
}

impl Evaluator {
    #[inline]
    fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        self.interpolator.resolve(context, path)
    }
}

enum When {
    Static(Vec<MemoizedTemplate>),
    Dynamic(Rc<dyn Fn(&Value) -> Vec<Condition>>),
}

enum Branch {
    Empty,
    Static(MemoizedTemplate),
    Dynamic(Rc<dyn Fn(&Value) -> Value>),
}

impl Branch {
    fn compile(source: Option<&Source<Value>>) -> Self {
        match source {
            None => Branch::Empty,
            Some(Source::Static(template)) => Branch::Static(MemoizedTemplate::new(template.clone())),
            Some(Source::Dynamic(f)) => Branch::Dynamic(Rc::clone(f)),
        }
    }

    fn evaluate(&mut self, evaluator: &Evaluator, context: &Value, deps: &mut Dependencies) -> Value {
        match self {
            Branch::Empty => Value::null(),
            Branch::Static(template) => {
                let out = template.evaluate(&evaluator.interpolator, context);
                deps.extend_from(template.dependencies());
                out
            }
            Branch::Dynamic(f) => f(context),
        }
    }
}

/// A compiled rule with private memo state.
pub(crate) struct StatefulRule {
    index: usize,
    when: When,
    then: Branch,
    otherwise: Branch,
    memo: Memo<Value>,
    tracks_dependencies: bool,
}

impl StatefulRule {
    pub fn compile(index: usize, rule: &Rule) -> Self {
        let when = match &rule.when {
            Source::Static(conditions) => When::Static(
                conditions
                    .iter()
                    .map(|c| MemoizedTemplate::new(Value::object(c.clone())))
                    .collect(),
            ),
            Source::Dynamic(f) => When::Dynamic(Rc::clone(f)),
        };
        Self {
            index,
            when,
            then: Branch::compile(rule.then.as_ref()),
            otherwise: Branch::compile(rule.otherwise.as_ref()),
            memo: Memo::new(),
            tracks_dependencies: !rule.is_dynamic(),
        }
    }

    /// Select and interpolate this rule's operation-set for `context`.
    ///
    /// Validator failures are pushed onto `errors` and count as a non-match.
    pub fn evaluate(&mut self, evaluator: &Evaluator, context: &Value, errors: &mut Vec<ErrorEvent>) -> Value {
        if self.tracks_dependencies {
            if let Some(hit) = self.memo.lookup(|path| evaluator.resolve(context, path)) {
                tracing::trace!(rule = self.index, "rule memo hit");
                return hit.clone();
            }
        }

        let mut deps = Dependencies::new();
        let matched = self.matches(evaluator, context, &mut deps, errors);
        let branch = if matched { &mut self.then } else { &mut self.otherwise };
        let selected = branch.evaluate(evaluator, context, &mut deps);

        if self.tracks_dependencies {
            self.memo.store(deps.into_vec(), selected.clone());
        }
        selected
    }

    fn matches(
        &mut self,
        evaluator: &Evaluator,
        context: &Value,
        deps: &mut Dependencies,
        errors: &mut Vec<ErrorEvent>,
    ) -> bool {
        let index = self.index;
        match &mut self.when {
            When::Static(templates) => templates.iter_mut().any(|template| {
                let condition = template.evaluate(&evaluator.interpolator, context);
                deps.extend_from(template.dependencies());
                let entries = condition.as_object().into_iter().flatten();
                check(index, entries, evaluator, context, deps, errors)
            }),
            When::Dynamic(f) => f(context)
                .iter()
                .any(|condition| check(index, condition.iter(), evaluator, context, deps, errors)),
        }
    }
}

fn check<'a>(
    rule: usize,
    entries: impl IntoIterator<Item = (&'a String, &'a Value)>,
    evaluator: &Evaluator,
    context: &Value,
    deps: &mut Dependencies,
    errors: &mut Vec<ErrorEvent>,
) -> bool {
    for (path, schema) in entries {
        let value = evaluator.resolve(context, path);
        deps.record(path, value.as_ref());
        match evaluator.validator.validate(schema, value.as_ref()) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(source) => {
                tracing::warn!(rule, path = %path, error = %source, "validator failed; condition treated as unmatched");
                errors.push(ErrorEvent::Validation {
                    rule,
                    path: path.clone(),
                    source,
                });
                return false;
            }
        }
    }
    true
}

/// The compiled rules of one engine, evaluated in order.
pub(crate) struct RuleSet {
    rules: Vec<StatefulRule>,
}

impl RuleSet {
    pub fn compile(rules: &[Rule]) -> Self {
        Self {
            rules: rules
                .iter()
                .enumerate()
                .map(|(index, rule)| StatefulRule::compile(index, rule))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// One selected operation-set per rule, in rule order.
    pub fn evaluate(&mut self, evaluator: &Evaluator, context: &Value, errors: &mut Vec<ErrorEvent>) -> Vec<Value> {
        self.rules
            .iter_mut()
            .map(|rule| rule.evaluate(evaluator, context, errors))
            .collect()
    }
}
