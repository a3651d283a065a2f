//! Patch application logic.
//!
//! Both appliers are pure: the input document is never touched, and the result
//! shares every subtree that no operation wrote to. When nothing changes the
//! input handle itself is returned.

use crate::error::{StateError, StateResult};
use crate::value::{Map, Node, Value};
use crate::{Op, Patch};

/// Apply a patch to a document (pure function).
///
/// Operations run left to right. A failing `test` operation aborts the whole
/// patch softly: the pristine input is returned as `Ok`. Any other failure is
/// returned as an error.
///
/// # Examples
///
/// ```
/// use modifiable_state::{apply_patch, Op, Patch, Pointer, Value};
/// use serde_json::json;
///
/// let doc = Value::from(json!({"validations": ["required", ["minLength", 2]]}));
/// let patch = Patch::new().with_op(Op::remove(Pointer::root().key("validations").index(0)));
///
/// let next = apply_patch(&doc, &patch).unwrap();
/// assert_eq!(next.to_json(), json!({"validations": [["minLength", 2]]}));
///
/// // Original is unchanged (pure function)
/// assert_eq!(doc.to_json()["validations"][0], "required");
/// ```
pub fn apply_patch(doc: &Value, patch: &Patch) -> StateResult<Value> {
    let mut result = doc.clone();

    for op in patch.ops() {
        match apply_op(&result, op) {
            Ok(next) => result = next,
            Err(err) if err.is_test_mismatch() => {
                tracing::debug!(error = %err, "test operation failed; patch aborted");
                return Ok(doc.clone());
            }
            Err(err) => return Err(err),
        }
    }

    Ok(result)
}

/// Apply a single operation to a document.
pub fn apply_op(doc: &Value, op: &Op) -> StateResult<Value> {
    match op {
        Op::Add { path, value } => path.set(doc, value.clone()),
        Op::Replace { path, value } => path.replace(doc, value.clone()),
        Op::Remove { path } => Ok(path.unset(doc)),
        Op::Copy { path, from } => {
            let from = from.as_ref().ok_or(StateError::MissingFrom { op: "copy" })?;
            let value = from
                .get(doc)
                .ok_or_else(|| StateError::path_not_found(from))?;
            path.set(doc, value)
        }
        Op::Move { path, from } => {
            let from = from.as_ref().ok_or(StateError::MissingFrom { op: "move" })?;
            if from == path {
                return Ok(doc.clone());
            }
            let value = from
                .get(doc)
                .ok_or_else(|| StateError::path_not_found(from))?;
            path.set(&from.unset(doc), value)
        }
        Op::Test { path, value } => match path.get(doc) {
            Some(found) if found == *value => Ok(doc.clone()),
            found => Err(StateError::TestMismatch {
                pointer: path.to_string(),
                expected: value.to_string(),
                found: found.map_or_else(|| "undefined".to_owned(), |v| v.to_string()),
            }),
        },
    }
}

/// Parse `operations` as a JSON Patch sequence and apply it.
pub fn apply_patch_value(doc: &Value, operations: &Value) -> StateResult<Value> {
    apply_patch(doc, &Patch::try_from(operations)?)
}

/// Shallow merge: every top-level key of `partial` overwrites the document's.
///
/// Returns `doc` itself when each key already holds an equal value.
///
/// # Examples
///
/// ```
/// use modifiable_state::{apply_merge, Value};
/// use serde_json::json;
///
/// let doc = Value::from(json!({"label": "First Name", "hidden": false}));
/// let next = apply_merge(&doc, &Value::from(json!({"hidden": true}))).unwrap();
/// assert_eq!(next.to_json(), json!({"label": "First Name", "hidden": true}));
/// ```
pub fn apply_merge(doc: &Value, partial: &Value) -> StateResult<Value> {
    if partial.is_null() {
        return Ok(doc.clone());
    }
    let updates = partial.as_object().ok_or(StateError::MergeRequiresObject {
        found: partial.type_name(),
    })?;
    let base = match doc.node() {
        Node::Object(map) => map,
        Node::Null => return Ok(Value::object(updates.clone())),
        _ => {
            return Err(StateError::MergeRequiresObject {
                found: doc.type_name(),
            })
        }
    };

    let changed = updates
        .iter()
        .any(|(k, v)| base.get(k).map_or(true, |old| old != v));
    if !changed {
        return Ok(doc.clone());
    }

    let mut next: Map = base.clone();
    next.extend(updates.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(Value::object(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pointer;
    use serde_json::json;

    fn ptr(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_apply_empty_patch_returns_same_reference() {
        let d = doc(json!({"x": 1}));
        let result = apply_patch(&d, &Patch::new()).unwrap();
        assert!(Value::ptr_eq(&d, &result));
    }

    #[test]
    fn test_apply_ops_in_order() {
        let d = doc(json!({}));
        let patch = Patch::new()
            .with_op(Op::add(ptr("/x"), Value::from(1i64)))
            .with_op(Op::replace(ptr("/x"), Value::from(2i64)))
            .with_op(Op::add(ptr("/y"), Value::from(3i64)));
        let result = apply_patch(&d, &patch).unwrap();
        assert_eq!(result.to_json(), json!({"x": 2, "y": 3}));
    }

    #[test]
    fn test_copy_shares_node() {
        let d = doc(json!({"a": {"deep": [1]}}));
        let result = apply_op(&d, &Op::copy(ptr("/a"), ptr("/b"))).unwrap();
        assert!(Value::ptr_eq(
            result.get_key("a").unwrap(),
            result.get_key("b").unwrap()
        ));
    }

    #[test]
    fn test_move_preserves_identity() {
        let d = doc(json!({"a": {"deep": [1]}, "c": 1}));
        let before = d.get_key("a").unwrap().clone();
        let result = apply_op(&d, &Op::move_to(ptr("/a"), ptr("/b"))).unwrap();
        assert!(result.get_key("a").is_none());
        assert!(Value::ptr_eq(&before, result.get_key("b").unwrap()));
    }

    #[test]
    fn test_move_within_sequence() {
        let d = doc(json!(["a", "b", "c"]));
        let result = apply_op(&d, &Op::move_to(ptr("/0"), ptr("/-"))).unwrap();
        assert_eq!(result.to_json(), json!(["b", "c", "a"]));
    }

    #[test]
    fn test_copy_and_move_require_from() {
        let d = doc(json!({"a": 1}));
        let copy = Op::Copy {
            path: ptr("/b"),
            from: None,
        };
        assert!(matches!(
            apply_op(&d, &copy),
            Err(StateError::MissingFrom { op: "copy" })
        ));
        let mv = Op::Move {
            path: ptr("/b"),
            from: None,
        };
        assert!(matches!(
            apply_op(&d, &mv),
            Err(StateError::MissingFrom { op: "move" })
        ));
    }

    #[test]
    fn test_copy_missing_source() {
        let d = doc(json!({"a": 1}));
        assert!(matches!(
            apply_op(&d, &Op::copy(ptr("/nope"), ptr("/b"))),
            Err(StateError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_failed_test_discards_earlier_edits() {
        let d = doc(json!({"a": 1, "b": 2}));
        let patch = Patch::new()
            .with_op(Op::add(ptr("/c"), Value::from(3i64)))
            .with_op(Op::remove(ptr("/a")))
            .with_op(Op::test(ptr("/b"), Value::from(99i64)))
            .with_op(Op::add(ptr("/d"), Value::from(4i64)));
        let result = apply_patch(&d, &patch).unwrap();
        assert!(Value::ptr_eq(&d, &result));
    }

    #[test]
    fn test_passing_test_continues() {
        let d = doc(json!({"a": [1, {"x": true}]}));
        let patch = Patch::new()
            .with_op(Op::test(ptr("/a"), Value::from(json!([1, {"x": true}]))))
            .with_op(Op::add(ptr("/ok"), Value::from(true)));
        let result = apply_patch(&d, &patch).unwrap();
        assert_eq!(result.to_json()["ok"], true);
    }

    #[test]
    fn test_apply_patch_value_rejects_unknown_op() {
        let d = doc(json!({}));
        let ops = doc(json!([{"op": "increment", "path": "/a"}]));
        assert!(matches!(
            apply_patch_value(&d, &ops),
            Err(StateError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_merge() {
        let d = doc(json!({"a": {"x": 1}, "b": 1}));
        let same = apply_merge(&d, &doc(json!({"b": 1}))).unwrap();
        assert!(Value::ptr_eq(&d, &same));

        let next = apply_merge(&d, &doc(json!({"b": 2, "c": 3}))).unwrap();
        assert_eq!(next.to_json(), json!({"a": {"x": 1}, "b": 2, "c": 3}));
        assert!(Value::ptr_eq(d.get_key("a").unwrap(), next.get_key("a").unwrap()));

        assert!(matches!(
            apply_merge(&d, &doc(json!([1]))),
            Err(StateError::MergeRequiresObject { found: "array" })
        ));
    }
}
