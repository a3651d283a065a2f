//! How a selected operation-set is applied to the document.

use modifiable_state::{apply_merge, apply_patch_value, StateResult, Value};

/// Applies one operation-set to a document, returning the new document.
///
/// Implementations must return the input handle when nothing changes.
pub trait PatchStrategy {
    fn apply(&self, document: &Value, operations: &Value) -> StateResult<Value>;

    /// Name used in `Debug` output of configurations.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> PatchStrategy for F
where
    F: Fn(&Value, &Value) -> StateResult<Value>,
{
    fn apply(&self, document: &Value, operations: &Value) -> StateResult<Value> {
        self(document, operations)
    }
}

/// Operation-sets are JSON Patch sequences. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPatch;

impl PatchStrategy for JsonPatch {
    fn apply(&self, document: &Value, operations: &Value) -> StateResult<Value> {
        apply_patch_value(document, operations)
    }

    fn name(&self) -> &'static str {
        "json_patch"
    }
}

/// Operation-sets are partial documents merged over the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl PatchStrategy for ShallowMerge {
    fn apply(&self, document: &Value, operations: &Value) -> StateResult<Value> {
        apply_merge(document, operations)
    }

    fn name(&self) -> &'static str {
        "shallow_merge"
    }
}
