//! Placeholder substitution in template values.
//!
//! Strings are scanned for placeholders (by default `{{ path }}`) and each one
//! is resolved against the context. A string that is exactly one placeholder is
//! replaced by the resolved value itself, of whatever type; otherwise resolved
//! values are rendered inline. Containers are rebuilt only along changed
//! branches, so a template without placeholders comes back as the same handle.

use crate::memo::{Dependencies, Dependency, Memo};
use crate::resolver::Resolver;
use modifiable_state::{Node, Value};
use regex::{Captures, Regex};
use std::fmt;
use std::rc::Rc;

/// The placeholder syntax used when none is configured.
pub const DEFAULT_PATTERN: &str = r"\{\{\s*(.+?)\s*\}\}";

/// Substitutes placeholders using a resolver.
#[derive(Clone)]
pub struct Interpolator {
    pattern: Option<Regex>,
    resolver: Rc<dyn Resolver>,
}

impl Interpolator {
    /// `pattern` must capture the context path in group 1. `None` disables
    /// substitution entirely.
    pub fn new(pattern: Option<Regex>, resolver: Rc<dyn Resolver>) -> Self {
        Self { pattern, resolver }
    }

    /// Resolve a context path through the configured resolver.
    #[inline]
    pub fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        self.resolver.resolve(context, path)
    }

    /// Substitute every placeholder in `template`, recording each context read.
    pub fn interpolate(&self, template: &Value, context: &Value, deps: &mut Dependencies) -> Value {
        match &self.pattern {
            Some(pattern) => self.walk(pattern, template, context, deps),
            None => template.clone(),
        }
    }

    fn walk(&self, pattern: &Regex, template: &Value, context: &Value, deps: &mut Dependencies) -> Value {
        match template.node() {
            Node::String(text) => self.substitute(pattern, template, text, context, deps),
            Node::Array(items) => {
                let mut changed = false;
                let next: Vec<Value> = items
                    .iter()
                    .map(|item| {
                        let out = self.walk(pattern, item, context, deps);
                        changed |= !Value::ptr_eq(item, &out);
                        out
                    })
                    .collect();
                if changed {
                    Value::array(next)
                } else {
                    template.clone()
                }
            }
            Node::Object(map) => {
                let mut next = None;
                for (key, item) in map {
                    let out = self.walk(pattern, item, context, deps);
                    if !Value::ptr_eq(item, &out) {
                        next.get_or_insert_with(|| map.clone()).insert(key.clone(), out);
                    }
                }
                next.map_or_else(|| template.clone(), Value::object)
            }
            _ => template.clone(),
        }
    }

    fn substitute(
        &self,
        pattern: &Regex,
        original: &Value,
        text: &str,
        context: &Value,
        deps: &mut Dependencies,
    ) -> Value {
        let Some(first) = pattern.captures(text) else {
            return original.clone();
        };

        let whole = first.get(0).map_or(0..0, |m| m.range());
        if whole == (0..text.len()) {
            let path = placeholder_path(&first);
            let found = self.resolve(context, path);
            deps.record(path, found.as_ref());
            return found.unwrap_or_else(Value::null);
        }

        let replaced = pattern.replace_all(text, |caps: &Captures<'_>| {
            let path = placeholder_path(caps);
            let found = self.resolve(context, path);
            deps.record(path, found.as_ref());
            render(found.as_ref())
        });
        if replaced == text {
            original.clone()
        } else {
            Value::string(replaced.into_owned())
        }
    }
}

impl fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator")
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

fn placeholder_path<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1).map_or("", |m| m.as_str())
}

/// Inline rendering: strings verbatim, absent as empty, anything else as JSON.
fn render(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(v) => match v.as_str() {
            Some(s) => s.to_owned(),
            None => v.to_string(),
        },
    }
}

/// A template whose last interpolation is reused while its reads are unchanged.
#[derive(Debug, Clone)]
pub struct MemoizedTemplate {
    template: Value,
    memo: Memo<Value>,
}

impl MemoizedTemplate {
    pub fn new(template: Value) -> Self {
        Self {
            template,
            memo: Memo::new(),
        }
    }

    pub fn template(&self) -> &Value {
        &self.template
    }

    /// The context reads made by the last full interpolation.
    pub fn dependencies(&self) -> &[Dependency] {
        self.memo.dependencies()
    }

    /// Interpolate against `context`, short-circuiting to the previous output
    /// when every previously read path still resolves to the same value.
    pub fn evaluate(&mut self, interpolator: &Interpolator, context: &Value) -> Value {
        if let Some(hit) = self.memo.lookup(|path| interpolator.resolve(context, path)) {
            tracing::trace!("interpolation memo hit");
            return hit.clone();
        }
        let mut deps = Dependencies::new();
        let out = interpolator.interpolate(&self.template, context, &mut deps);
        self.memo.store(deps.into_vec(), out).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{KeyResolver, PointerResolver};
    use serde_json::json;

    fn pointer_interpolator() -> Interpolator {
        Interpolator::new(
            Some(Regex::new(DEFAULT_PATTERN).unwrap()),
            Rc::new(PointerResolver),
        )
    }

    fn run(template: &Value, context: serde_json::Value) -> Value {
        pointer_interpolator().interpolate(template, &Value::from(context), &mut Dependencies::new())
    }

    #[test]
    fn test_inline_substitution() {
        let template = Value::from("Hey {{/formData/firstName}}!");
        let out = run(&template, json!({"formData": {"firstName": "Andrew"}}));
        assert_eq!(out.as_str(), Some("Hey Andrew!"));
    }

    #[test]
    fn test_whole_placeholder_keeps_type() {
        let template = Value::from("{{ /formData }}");
        let context = Value::from(json!({"formData": {"n": 1}}));
        let out = pointer_interpolator().interpolate(&template, &context, &mut Dependencies::new());
        assert!(Value::ptr_eq(&out, context.get_key("formData").unwrap()));
    }

    #[test]
    fn test_inline_renders_non_strings_as_json() {
        let template = Value::from("n={{/n}} l={{/l}} missing=[{{/nope}}]");
        let out = run(&template, json!({"n": 2, "l": [1, "a"]}));
        assert_eq!(out.as_str(), Some(r#"n=2 l=[1,"a"] missing=[]"#));
    }

    #[test]
    fn test_whole_placeholder_missing_is_null() {
        let out = run(&Value::from("{{/nope}}"), json!({}));
        assert!(out.is_null());
    }

    #[test]
    fn test_unchanged_template_is_same_reference() {
        let template = Value::from(json!({"a": [1, "plain", {"b": true}], "c": null}));
        let out = run(&template, json!({"x": 1}));
        assert!(Value::ptr_eq(&template, &out));
    }

    #[test]
    fn test_only_changed_branches_rebuilt() {
        let template = Value::from(json!([
            {"op": "add", "path": "/placeholder", "value": "Hey {{/name}}"},
            {"op": "remove", "path": "/validations"}
        ]));
        let out = run(&template, json!({"name": "Ann"}));
        let before = template.as_array().unwrap();
        let after = out.as_array().unwrap();
        assert!(!Value::ptr_eq(&before[0], &after[0]));
        assert!(Value::ptr_eq(&before[1], &after[1]));
        assert!(Value::ptr_eq(
            before[0].get_key("path").unwrap(),
            after[0].get_key("path").unwrap()
        ));
        assert_eq!(after[0].get_key("value").unwrap().as_str(), Some("Hey Ann"));
    }

    #[test]
    fn test_records_dependencies() {
        let template = Value::from(json!(["{{/a}} {{/b}}", "{{/a}}"]));
        let mut deps = Dependencies::new();
        pointer_interpolator().interpolate(&template, &Value::from(json!({"a": 1})), &mut deps);
        let paths: Vec<_> = deps.as_slice().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b"]);
        assert_eq!(deps.as_slice()[1].value, None);
    }

    #[test]
    fn test_disabled_pattern_passes_through() {
        let interpolator = Interpolator::new(None, Rc::new(KeyResolver));
        let template = Value::from("Hey {{name}}");
        let out = interpolator.interpolate(
            &template,
            &Value::from(json!({"name": "x"})),
            &mut Dependencies::new(),
        );
        assert!(Value::ptr_eq(&template, &out));
    }

    #[test]
    fn test_memoized_template() {
        let interpolator = pointer_interpolator();
        let mut memo = MemoizedTemplate::new(Value::from(json!({"value": "Hey {{/name}}"})));

        let first = memo.evaluate(&interpolator, &Value::from(json!({"name": "Ann", "x": 1})));
        let again = memo.evaluate(&interpolator, &Value::from(json!({"name": "Ann", "x": 2})));
        assert!(Value::ptr_eq(&first, &again));

        let changed = memo.evaluate(&interpolator, &Value::from(json!({"name": "Bob"})));
        assert_eq!(changed.to_json(), json!({"value": "Hey Bob"}));
        assert_eq!(memo.dependencies().len(), 1);
    }
}
