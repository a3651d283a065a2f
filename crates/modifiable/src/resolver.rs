//! Context path resolution.
//!
//! A [`Resolver`] reads a value out of the context for a rule condition key or
//! an interpolation placeholder. Absent values are `None`; a resolver never
//! fails.

use modifiable_state::{Node, Pointer, Value};

/// Looks up `path` in `context`.
pub trait Resolver {
    fn resolve(&self, context: &Value, path: &str) -> Option<Value>;

    /// Name used in `Debug` output of configurations.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> Resolver for F
where
    F: Fn(&Value, &str) -> Option<Value>,
{
    fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        self(context, path)
    }
}

/// JSON Pointer lookup (`/formData/firstName`). The default.
///
/// A malformed pointer resolves to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerResolver;

impl Resolver for PointerResolver {
    fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        match Pointer::parse(path) {
            Ok(pointer) => pointer.get(context),
            Err(err) => {
                tracing::debug!(path, error = %err, "unresolvable context path");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "pointer"
    }
}

/// Top-level key lookup (`firstName`).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyResolver;

impl Resolver for KeyResolver {
    fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        context.get_key(path).cloned()
    }

    fn name(&self) -> &'static str {
        "key"
    }
}

/// Dotted property lookup (`formData.firstName`, `items.0.name`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DotPathResolver;

impl Resolver for DotPathResolver {
    fn resolve(&self, context: &Value, path: &str) -> Option<Value> {
        if path.is_empty() {
            return Some(context.clone());
        }
        path.split('.')
            .try_fold(context, |node, segment| match node.node() {
                Node::Object(map) => map.get(segment),
                Node::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
            .cloned()
    }

    fn name(&self) -> &'static str {
        "dot_path"
    }
}
