//! Parsed webhook payload tree.
//!
//! Payloads arrive as arbitrary JSON. Rather than passing `serde_json::Value`
//! around and branching on it ad hoc, the admitted body is converted once into
//! a closed `PayloadNode` tree. Sanitizer and handlers match on it
//! exhaustively. Construction enforces a nesting limit so a hostile payload
//! cannot drive unbounded recursion further down the pipeline.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::GateError;

/// One node of a parsed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadNode {
    /// String-keyed mapping.
    Object(BTreeMap<String, PayloadNode>),
    /// Ordered sequence.
    Array(Vec<PayloadNode>),
    /// String leaf. The only node kind sanitization may rewrite.
    String(String),
    /// Number, boolean, or null leaf.
    Scalar(Scalar),
}

/// Opaque non-string leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, kept in its original representation.
    Number(Number),
}

impl PayloadNode {
    /// Parses a raw body into a payload tree.
    ///
    /// The root must be a JSON object, matching what the provider sends.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidPayload` with the parser's syntax
    /// description when the bytes are not JSON or the root is not an object,
    /// and `GateError::PayloadTooDeep` when nesting exceeds `max_depth`.
    pub fn parse(body: &[u8], max_depth: usize) -> Result<Self, GateError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| GateError::InvalidPayload(e.to_string()))?;

        if !value.is_object() {
            return Err(GateError::InvalidPayload("payload must be a JSON object".to_string()));
        }

        Self::from_value(value, max_depth)
    }

    /// Converts a JSON value into a tree, refusing anything nested deeper
    /// than `max_depth` levels. The root counts as depth 1.
    ///
    /// # Errors
    ///
    /// Returns `GateError::PayloadTooDeep` when the limit is exceeded.
    pub fn from_value(value: Value, max_depth: usize) -> Result<Self, GateError> {
        build(value, 1, max_depth)
    }

    /// Looks up a key on an object node.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Follows a dot-separated path of object keys, e.g. `rule.severity`.
    pub fn get_path(&self, path: &str) -> Option<&Self> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Returns the string value of a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of an array node.
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the integer value of a numeric leaf.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Short name of the node kind, for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::String(_) => "string",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Returns true when both trees have the same node kinds, the same key
    /// sets, the same sequence lengths, and equal non-string leaves. String
    /// leaf contents are ignored.
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
            },
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_shape(y))
            },
            (Self::String(_), Self::String(_)) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            _ => false,
        }
    }

    /// Depth of the tree; a leaf or empty container is depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Object(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            Self::Array(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            Self::String(_) | Self::Scalar(_) => 1,
        }
    }
}

fn build(value: Value, depth: usize, max_depth: usize) -> Result<PayloadNode, GateError> {
    if depth > max_depth {
        return Err(GateError::PayloadTooDeep { max_depth });
    }

    Ok(match value {
        Value::Object(map) => PayloadNode::Object(
            map.into_iter()
                .map(|(k, v)| build(v, depth + 1, max_depth).map(|node| (k, node)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Array(items) => PayloadNode::Array(
            items
                .into_iter()
                .map(|v| build(v, depth + 1, max_depth))
                .collect::<Result<_, _>>()?,
        ),
        Value::String(s) => PayloadNode::String(s),
        Value::Number(n) => PayloadNode::Scalar(Scalar::Number(n)),
        Value::Bool(b) => PayloadNode::Scalar(Scalar::Bool(b)),
        Value::Null => PayloadNode::Scalar(Scalar::Null),
    })
}
