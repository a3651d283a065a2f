//! JSON Pointer addressing with immutable, structurally shared writes.
//!
//! A [`Pointer`] is a parsed sequence of reference tokens (`/a/b/0`, with `~1`
//! for `/` and `~0` for `~`). Reads never create nodes. Writes return a new root
//! that re-allocates only the ancestors of the target; every sibling subtree is
//! the same shared node as before.

use crate::error::{StateError, StateResult};
use crate::value::{Node, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The token that addresses the position past the last sequence element.
pub const APPEND_TOKEN: &str = "-";

/// A parsed JSON Pointer.
///
/// # Examples
///
/// ```
/// use modifiable_state::{Pointer, Value};
/// use serde_json::json;
///
/// let doc = Value::from(json!({"a/b": {"list": [1, 2]}}));
/// let p: Pointer = "/a~1b/list/1".parse().unwrap();
/// assert_eq!(p.get(&doc), Some(Value::from(json!(2))));
///
/// let next = p.set(&doc, Value::from(json!(9))).unwrap();
/// assert_eq!(next.to_json(), json!({"a/b": {"list": [1, 9, 2]}}));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pointer(Vec<String>);

#[derive(Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Sequence indices shift later elements.
    Insert,
    /// Sequence indices overwrite the existing element.
    Overwrite,
}

impl Pointer {
    /// The pointer to the whole document.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a pointer string.
    pub fn parse(pointer: &str) -> StateResult<Self> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| StateError::invalid_pointer(pointer, "must be empty or start with '/'"))?;
        rest.split('/')
            .map(|raw| {
                decode_token(raw)
                    .ok_or_else(|| StateError::invalid_pointer(pointer, "'~' must be followed by '0' or '1'"))
            })
            .collect::<StateResult<Vec<_>>>()
            .map(Self)
    }

    /// Append a reference token (builder pattern).
    #[inline]
    pub fn key(mut self, token: impl Into<String>) -> Self {
        self.0.push(token.into());
        self
    }

    /// Append a sequence index token (builder pattern).
    #[inline]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(index.to_string());
        self
    }

    /// Push a reference token onto the pointer.
    #[inline]
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// The decoded reference tokens.
    #[inline]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The pointer without its last token.
    pub fn parent(&self) -> Option<Pointer> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// Check whether `self` addresses `other` or one of its ancestors.
    #[inline]
    pub fn is_prefix_of(&self, other: &Pointer) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Resolve the pointer against `doc`.
    ///
    /// Returns `None` when any segment is absent; never creates nodes.
    pub fn get(&self, doc: &Value) -> Option<Value> {
        self.0
            .iter()
            .try_fold(doc, |node, token| child(node, token))
            .cloned()
    }

    /// Write `value` at the pointer, inserting into sequences.
    ///
    /// Missing ancestors are created: a sequence when the next token is an
    /// index or `-`, an object otherwise. Returns `doc` itself when the target
    /// already holds an equal value.
    pub fn set(&self, doc: &Value, value: Value) -> StateResult<Value> {
        self.write(doc, value, WriteMode::Insert)
    }

    /// Write `value` at the pointer, overwriting sequence elements in place.
    pub fn replace(&self, doc: &Value, value: Value) -> StateResult<Value> {
        self.write(doc, value, WriteMode::Overwrite)
    }

    /// Remove the addressed node.
    ///
    /// `-` pops the last sequence element. Returns `doc` itself when the path
    /// does not exist. Unsetting the root yields `null`.
    pub fn unset(&self, doc: &Value) -> Value {
        if self.is_root() {
            return Value::null();
        }
        remove_at(doc, &self.0).unwrap_or_else(|| doc.clone())
    }

    fn write(&self, doc: &Value, value: Value, mode: WriteMode) -> StateResult<Value> {
        if self.get(doc).is_some_and(|existing| existing == value) {
            return Ok(doc.clone());
        }
        self.write_at(Some(doc), &self.0, value, mode)
    }

    fn write_at(
        &self,
        current: Option<&Value>,
        tokens: &[String],
        value: Value,
        mode: WriteMode,
    ) -> StateResult<Value> {
        let Some((token, rest)) = tokens.split_first() else {
            return Ok(value);
        };
        let current = match current {
            Some(node) => node.clone(),
            None => empty_container_for(token),
        };

        match current.node() {
            Node::Object(map) => {
                let existing = map.get(token);
                let child = if rest.is_empty() {
                    value
                } else {
                    self.write_at(existing, rest, value, mode)?
                };
                if existing.is_some_and(|old| Value::ptr_eq(old, &child)) {
                    return Ok(current.clone());
                }
                let mut next = map.clone();
                next.insert(token.clone(), child);
                Ok(Value::object(next))
            }
            Node::Array(items) => {
                let index = if token == APPEND_TOKEN {
                    items.len()
                } else {
                    array_index(token)
                        .ok_or_else(|| StateError::type_mismatch(self, "array index", "key"))?
                };
                if index > items.len() {
                    return Err(StateError::index_out_of_bounds(self, index, items.len()));
                }

                if rest.is_empty() {
                    let mut next = items.clone();
                    match mode {
                        WriteMode::Overwrite if index < items.len() => next[index] = value,
                        _ => next.insert(index, value),
                    }
                    return Ok(Value::array(next));
                }

                let existing = items.get(index);
                let child = self.write_at(existing, rest, value, mode)?;
                if existing.is_some_and(|old| Value::ptr_eq(old, &child)) {
                    return Ok(current.clone());
                }
                let mut next = items.clone();
                if index < next.len() {
                    next[index] = child;
                } else {
                    next.push(child);
                }
                Ok(Value::array(next))
            }
            _ => Err(StateError::type_mismatch(
                self,
                "object or array",
                current.type_name(),
            )),
        }
    }
}

fn child<'a>(node: &'a Value, token: &str) -> Option<&'a Value> {
    match node.node() {
        Node::Object(map) => map.get(token),
        Node::Array(items) => array_index(token).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn remove_at(current: &Value, tokens: &[String]) -> Option<Value> {
    let (token, rest) = tokens.split_first()?;
    match current.node() {
        Node::Object(map) => {
            let mut next = map.clone();
            if rest.is_empty() {
                next.remove(token)?;
            } else {
                let child = remove_at(map.get(token)?, rest)?;
                next.insert(token.clone(), child);
            }
            Some(Value::object(next))
        }
        Node::Array(items) => {
            let index = match (token.as_str(), rest.is_empty()) {
                (APPEND_TOKEN, true) => items.len().checked_sub(1)?,
                (APPEND_TOKEN, false) => return None,
                _ => array_index(token)?,
            };
            let old = items.get(index)?;
            let mut next = items.clone();
            if rest.is_empty() {
                next.remove(index);
            } else {
                next[index] = remove_at(old, rest)?;
            }
            Some(Value::array(next))
        }
        _ => None,
    }
}

fn empty_container_for(token: &str) -> Value {
    if token == APPEND_TOKEN || array_index(token).is_some() {
        Value::array(Vec::new())
    } else {
        Value::object(Default::default())
    }
}

/// Canonical decimal index: `0` or digits without a leading zero.
fn array_index(token: &str) -> Option<usize> {
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if canonical {
        token.parse().ok()
    } else {
        None
    }
}

fn decode_token(raw: &str) -> Option<String> {
    if !raw.contains('~') {
        return Some(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

impl TryFrom<String> for Pointer {
    type Error = StateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Pointer::parse(&s)
    }
}

impl TryFrom<&str> for Pointer {
    type Error = StateError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Pointer::parse(s)
    }
}

impl From<Pointer> for String {
    fn from(p: Pointer) -> Self {
        p.to_string()
    }
}

/// Resolve a pointer string against `doc`.
///
/// Fails only when `pointer` is malformed; a missing path is `Ok(None)`.
pub fn get(doc: &Value, pointer: &str) -> StateResult<Option<Value>> {
    Ok(Pointer::parse(pointer)?.get(doc))
}

/// Write `value` at a pointer string. See [`Pointer::set`].
pub fn set(doc: &Value, pointer: &str, value: Value) -> StateResult<Value> {
    Pointer::parse(pointer)?.set(doc, value)
}

/// Remove the node at a pointer string. See [`Pointer::unset`].
pub fn unset(doc: &Value, pointer: &str) -> StateResult<Value> {
    Ok(Pointer::parse(pointer)?.unset(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_parse_decodes_escapes() {
        let p = Pointer::parse("/a~1b/m~0n/~01").unwrap();
        assert_eq!(p.tokens(), ["a/b", "m~n", "~1"]);
        assert_eq!(p.to_string(), "/a~1b/m~0n/~01");
    }

    #[test]
    fn test_parse_root_and_empty_key() {
        assert!(Pointer::parse("").unwrap().is_root());
        assert_eq!(Pointer::parse("/").unwrap().tokens(), [""]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Pointer::parse("a/b"),
            Err(StateError::InvalidPointer { .. })
        ));
        assert!(matches!(
            Pointer::parse("/a~2"),
            Err(StateError::InvalidPointer { .. })
        ));
        assert!(Pointer::parse("/trailing~").is_err());
    }

    #[test]
    fn test_get_missing_is_none() {
        let d = doc(json!({"a": {"b": [1]}}));
        assert_eq!(get(&d, "/a/x/y").unwrap(), None);
        assert_eq!(get(&d, "/a/b/5").unwrap(), None);
        assert_eq!(get(&d, "/a/b/-").unwrap(), None);
        assert_eq!(get(&d, "/a/b/01").unwrap(), None);
    }

    #[test]
    fn test_set_shares_siblings() {
        let d = doc(json!({"left": {"deep": [1, 2]}, "right": {"x": 1}}));
        let next = set(&d, "/right/x", Value::from(2i64)).unwrap();
        assert!(Value::ptr_eq(
            d.get_key("left").unwrap(),
            next.get_key("left").unwrap()
        ));
        assert_eq!(next.to_json(), json!({"left": {"deep": [1, 2]}, "right": {"x": 2}}));
        assert_eq!(d.to_json()["right"]["x"], 1);
    }

    #[test]
    fn test_set_equal_value_returns_same_reference() {
        let d = doc(json!({"a": {"b": "same"}}));
        let next = set(&d, "/a/b", Value::from("same")).unwrap();
        assert!(Value::ptr_eq(&d, &next));
    }

    #[test]
    fn test_set_creates_missing_ancestors() {
        let d = doc(json!({}));
        let next = set(&d, "/list/-/name", Value::from("x")).unwrap();
        assert_eq!(next.to_json(), json!({"list": [{"name": "x"}]}));

        let next = set(&d, "/a/b", Value::from(1i64)).unwrap();
        assert_eq!(next.to_json(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_set_index_inserts() {
        let d = doc(json!({"l": ["a", "c"]}));
        let next = set(&d, "/l/1", Value::from("b")).unwrap();
        assert_eq!(next.to_json(), json!({"l": ["a", "b", "c"]}));
        let next = set(&next, "/l/-", Value::from("d")).unwrap();
        assert_eq!(next.to_json(), json!({"l": ["a", "b", "c", "d"]}));
    }

    #[test]
    fn test_replace_index_overwrites() {
        let d = doc(json!(["a", "c"]));
        let next = Pointer::parse("/1").unwrap().replace(&d, Value::from("b")).unwrap();
        assert_eq!(next.to_json(), json!(["a", "b"]));
    }

    #[test]
    fn test_set_errors() {
        let d = doc(json!({"n": 5, "l": [1]}));
        assert!(matches!(
            set(&d, "/n/x", Value::null()),
            Err(StateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            set(&d, "/l/key", Value::null()),
            Err(StateError::TypeMismatch { .. })
        ));
        assert!(matches!(
            set(&d, "/l/3", Value::null()),
            Err(StateError::IndexOutOfBounds { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn test_set_root_replaces_document() {
        let d = doc(json!({"a": 1}));
        let next = set(&d, "", Value::from("whole")).unwrap();
        assert_eq!(next.as_str(), Some("whole"));
    }

    #[test]
    fn test_unset() {
        let d = doc(json!({"a": {"b": 1, "c": 2}, "l": [1, 2, 3]}));
        assert_eq!(
            unset(&d, "/a/b").unwrap().to_json(),
            json!({"a": {"c": 2}, "l": [1, 2, 3]})
        );
        assert_eq!(unset(&d, "/l/0").unwrap().to_json()["l"], json!([2, 3]));
        assert_eq!(unset(&d, "/l/-").unwrap().to_json()["l"], json!([1, 2]));
    }

    #[test]
    fn test_unset_missing_returns_same_reference() {
        let d = doc(json!({"a": {"b": 1}, "l": []}));
        for p in ["/x", "/a/x", "/a/b/c", "/l/0", "/l/-"] {
            assert!(Value::ptr_eq(&d, &unset(&d, p).unwrap()), "{p}");
        }
    }

    #[test]
    fn test_pointer_serde_as_string() {
        let p = Pointer::root().key("a/b").index(0);
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(text, r#""/a~1b/0""#);
        let back: Pointer = serde_json::from_str(&text).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<Pointer>(r#""nope""#).is_err());
    }
}
