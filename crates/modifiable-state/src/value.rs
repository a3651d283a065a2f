//! Immutable, structurally shared JSON documents.
//!
//! A [`Value`] is a reference-counted handle to an immutable [`Node`]. Cloning a
//! `Value` is O(1) and never copies content, so successive document versions can
//! share every subtree that an edit did not touch. [`Value::ptr_eq`] is the
//! identity check used to answer "did this change?".

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Object node storage. Keys are unique; children are shared handles.
pub type Map = BTreeMap<String, Value>;

/// The content of a document node.
///
/// Equality is structural. Numbers compare by numeric value, so `1` equals `1.0`.
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

/// Shared handle to an immutable document node.
#[derive(Clone)]
pub struct Value(Rc<Node>);

impl Value {
    /// Wrap a node in a new handle.
    #[inline]
    pub fn new(node: Node) -> Self {
        Self(Rc::new(node))
    }

    /// A fresh `null` node.
    #[inline]
    pub fn null() -> Self {
        Self::new(Node::Null)
    }

    /// A sequence node holding the given elements.
    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Self::new(Node::Array(items))
    }

    /// An object node holding the given entries.
    #[inline]
    pub fn object(map: Map) -> Self {
        Self::new(Node::Object(map))
    }

    /// A string node.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Self::new(Node::String(s.into()))
    }

    /// Borrow the underlying node.
    #[inline]
    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Reference identity: true when both handles point at the same node.
    #[inline]
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.node(), Node::Null)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self.node(), Node::Array(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self.node(), Node::Object(_))
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self.node() {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<&Number> {
        match self.node() {
            Node::Number(n) => Some(n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self.node() {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self.node() {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Map> {
        match self.node() {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up an object member.
    #[inline]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Look up a sequence element.
    #[inline]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Human-readable name of this node's kind.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        value_type_name(self)
    }

    /// Deep-convert into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self.node() {
            Node::Null => serde_json::Value::Null,
            Node::Bool(b) => serde_json::Value::Bool(*b),
            Node::Number(n) => serde_json::Value::Number(n.clone()),
            Node::String(s) => serde_json::Value::String(s.clone()),
            Node::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Node::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Get the type name of a document node.
#[inline]
pub fn value_type_name(v: &Value) -> &'static str {
    match v.node() {
        Node::Null => "null",
        Node::Bool(_) => "boolean",
        Node::Number(_) => "number",
        Node::String(_) => "string",
        Node::Array(_) => "array",
        Node::Object(_) => "object",
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => numbers_eq(a, b),
            (Node::String(a), Node::String(b)) => a == b,
            (Node::Array(a), Node::Array(b)) => a == b,
            (Node::Object(a), Node::Object(b)) => a == b,
            _ => false,
        }
    }
}

/// Integers compare exactly; once either side is a float both compare as `f64`.
fn numbers_eq(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    if !(a.is_f64() || b.is_f64()) {
        return false;
    }
    matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Value::ptr_eq(self, other) || self.node() == other.node()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        let node = match v {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(b),
            serde_json::Value::Number(n) => Node::Number(n),
            serde_json::Value::String(s) => Node::String(s),
            serde_json::Value::Array(items) => {
                Node::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => Node::Object(
                obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        };
        Value::new(node)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        v.to_json()
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        v.to_json()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(Node::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::new(Node::Number(n.into()))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::new(Node::Number(n.into()))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Number::from_f64(f)
            .map(|n| Value::new(Node::Number(n)))
            .unwrap_or_else(Value::null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::object(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.node() {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::Array(items) => serializer.collect_seq(items),
            Node::Object(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clone_shares_node() {
        let v = Value::from(json!({"a": [1, 2]}));
        let c = v.clone();
        assert!(Value::ptr_eq(&v, &c));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(Value::from(json!(1)), Value::from(json!(1.0)));
        assert_eq!(Value::from(json!({"n": [-2]})), Value::from(json!({"n": [-2.0]})));
        assert_ne!(Value::from(json!(1)), Value::from(json!(1.5)));
        assert_ne!(Value::from(json!(1)), Value::from(json!("1")));
        assert_ne!(Value::from(u64::MAX), Value::from(u64::MAX - 1));
    }

    #[test]
    fn test_eq_is_deep() {
        let a = Value::from(json!({"a": [1, {"b": null}]}));
        let b = Value::from(json!({"a": [1, {"b": null}]}));
        assert!(!Value::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, Value::from(json!({"a": [1]})));
    }

    #[test]
    fn test_json_conversion_is_lossless() {
        let raw = json!({"s": "x", "n": 1.5, "i": -3, "b": true, "z": null, "l": [[]]});
        assert_eq!(Value::from(raw.clone()).to_json(), raw);
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(Value::from(json!(null)).type_name(), "null");
        assert_eq!(Value::from(json!(true)).type_name(), "boolean");
        assert_eq!(Value::from(json!(42)).type_name(), "number");
        assert_eq!(Value::from(json!("hello")).type_name(), "string");
        assert_eq!(Value::from(json!([1, 2, 3])).type_name(), "array");
        assert_eq!(Value::from(json!({"a": 1})).type_name(), "object");
    }

    #[test]
    fn test_display_is_compact_json() {
        let v = Value::from(json!({"a": [1, "two"]}));
        assert_eq!(v.to_string(), r#"{"a":[1,"two"]}"#);
    }

    #[test]
    fn test_serde_roundtrip() {
        let v = Value::from(json!({"k": [1, {"x": "y"}]}));
        let text = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
    }
}
