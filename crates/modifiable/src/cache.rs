//! Engine-level result cache keyed on the operation-sets a run selected.

use modifiable_state::{Node, Value};
use std::collections::VecDeque;

/// Whether an operation-set has no effect and is left out of a signature.
pub fn is_empty_operations(operations: &Value) -> bool {
    match operations.node() {
        Node::Null => true,
        Node::Array(items) => items.is_empty(),
        Node::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// The distinct, non-empty operation-sets of one run.
///
/// Two signatures match when they hold the same operation-sets by content,
/// regardless of order.
#[derive(Debug, Clone, Default)]
pub struct Signature(Vec<Value>);

impl Signature {
    pub fn new<'a>(selected: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut sets: Vec<Value> = Vec::new();
        for operations in selected {
            if is_empty_operations(operations) || sets.contains(operations) {
                continue;
            }
            sets.push(operations.clone());
        }
        Self(sets)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|set| other.0.contains(set))
    }
}

/// Signature → resulting document, with optional FIFO bound.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    entries: VecDeque<(Signature, Value)>,
    capacity: Option<usize>,
}

impl ResultCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn get(&self, signature: &Signature) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == signature)
            .map(|(_, document)| document)
    }

    /// Record `document` for `signature`, replacing any previous entry.
    pub fn insert(&mut self, signature: Signature, document: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == signature) {
            slot.1 = document;
            return;
        }
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.entries.len() >= capacity {
                self.entries.pop_front();
            }
        }
        self.entries.push_back((signature, document));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
