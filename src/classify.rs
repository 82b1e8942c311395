//! Node classification for aggregation trees.
//!
//! A node is looked at once and tagged; the walker dispatches on the tag
//! instead of re-checking fields at every call site.

use serde_json::{Map, Value};

/// Field holding the partitions of a grouping node.
pub const BUCKETS: &str = "buckets";
/// Field holding the metric of a terminal node.
pub const VALUE: &str = "value";

/// Shape of a single node-body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// `buckets` is a non-empty array of partitions, each carrying its own key.
    Ordered(&'a [Value]),
    /// `buckets` is a non-empty object; each label is the partition key.
    Labeled(&'a Map<String, Value>),
    /// Metric value (may be `null`).
    Terminal(&'a Value),
    Unrecognized,
}

/// True when `node` is an object with a non-empty `buckets` field.
pub fn has_buckets(node: &Value) -> bool {
    match node.get(BUCKETS) {
        Some(Value::Array(parts)) => !parts.is_empty(),
        Some(Value::Object(parts)) => !parts.is_empty(),
        _ => false,
    }
}

/// True when `node` is an object with a `value` field, whatever it holds.
pub fn has_values(node: &Value) -> bool {
    node.as_object()
        .map(|fields| fields.contains_key(VALUE))
        .unwrap_or(false)
}

/// Tag a node. Buckets win over a value; empty buckets fall through to the
/// value check.
pub fn classify(node: &Value) -> Node<'_> {
    if has_buckets(node) {
        match node.get(BUCKETS) {
            Some(Value::Array(parts)) => return Node::Ordered(parts),
            Some(Value::Object(parts)) => return Node::Labeled(parts),
            _ => {}
        }
    }

    match node.get(VALUE) {
        Some(value) => Node::Terminal(value),
        None => Node::Unrecognized,
    }
}
