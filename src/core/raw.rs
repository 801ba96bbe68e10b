//! Loosely-typed result-tree nodes.
//!
//! `xcresulttool` has shipped at least three incompatible JSON shapes for the
//! same underlying report. Rather than model each shape with structs, the
//! extractor probes a tagged-variant tree with explicit field-presence
//! queries. Every accessor returns an `Option`; a type mismatch reads as
//! "field absent" and never panics.
//!
//! The legacy format wraps scalars in typed objects
//! (`{"_type": {...}, "_value": "Failure"}`) and sequences in
//! (`{"_values": [...]}`). [`RawNode::resolved`] unwraps exactly one such
//! level so the two shapes can be probed with the same code.

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::errors::Result;

/// One node of an externally-produced result tree.
///
/// Read-only after construction. Maps preserve document key order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// Keyed mapping of string keys to child nodes
    Map(IndexMap<String, RawNode>),
    /// Ordered sequence of child nodes
    Seq(Vec<RawNode>),
    /// String scalar
    String(String),
    /// Numeric scalar (all JSON numbers widen to f64)
    Number(f64),
    /// Boolean scalar
    Bool(bool),
    /// JSON null
    Null,
}

impl RawNode {
    /// Parse a JSON document into a raw result tree.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from(value))
    }

    /// True if this node is a keyed mapping.
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// True if this node is a sequence.
    pub fn is_seq(&self) -> bool {
        matches!(self, Self::Seq(_))
    }

    /// Look up a direct child by key.
    pub fn field(&self, key: &str) -> Option<&RawNode> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Look up a direct child under the first key that is present.
    ///
    /// Schema variants disagree on field names (`nodeType` vs `type`,
    /// `result` vs `status`), so callers probe aliases in priority order.
    pub fn field_any(&self, keys: &[&str]) -> Option<&RawNode> {
        keys.iter().find_map(|key| self.field(key))
    }

    /// Unwrap one level of typed-value wrapping.
    ///
    /// A mapping carrying a `_value` child resolves to that child; anything
    /// else resolves to itself. A `_values` wrapper is a sequence of
    /// children, not a scalar, and is handled by [`RawNode::items`].
    pub fn resolved(&self) -> &RawNode {
        match self.field("_value") {
            Some(inner) => inner,
            None => self,
        }
    }

    /// The string content of this node after resolving, if it is a string.
    pub fn resolved_str(&self) -> Option<&str> {
        match self.resolved() {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The string content of this node after resolving, rejecting empties.
    pub fn resolved_nonempty_str(&self) -> Option<&str> {
        self.resolved_str().filter(|s| !s.is_empty())
    }

    /// The sequence items of this node, unwrapping a `_values` wrapper.
    pub fn items(&self) -> Option<&[RawNode]> {
        match self {
            Self::Seq(items) => Some(items),
            Self::Map(map) => match map.get("_values") {
                Some(Self::Seq(items)) => Some(items),
                _ => None,
            },
            _ => None,
        }
    }

    /// The numeric content of this node after resolving.
    ///
    /// Accepts bare numbers and numeric strings; the legacy format encodes
    /// durations as strings.
    pub fn resolved_f64(&self) -> Option<f64> {
        match self.resolved() {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Iterate over the entries of a mapping node (empty for non-maps).
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RawNode)> {
        let map = match self {
            Self::Map(map) => Some(map),
            _ => None,
        };
        map.into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl From<Value> for RawNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, child)| (key, Self::from(child)))
                    .collect(),
            ),
            Value::Array(items) => Self::Seq(items.into_iter().map(Self::from).collect()),
            Value::String(s) => Self::String(s),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => Self::Bool(b),
            Value::Null => Self::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(text: &str) -> RawNode {
        RawNode::from_json_str(text).expect("test JSON should parse")
    }

    #[test]
    fn field_lookup_on_non_map_is_absent() {
        let n = node(r#"["a", "b"]"#);
        assert!(n.field("anything").is_none());
        assert!(n.resolved_str().is_none());
    }

    #[test]
    fn resolved_unwraps_one_value_level() {
        let n = node(r#"{"testStatus": {"_value": "Failure"}}"#);
        let status = n.field("testStatus").unwrap();
        assert_eq!(status.resolved_str(), Some("Failure"));

        // Only one level is unwrapped.
        let nested = node(r#"{"_value": {"_value": "inner"}}"#);
        assert!(nested.resolved_str().is_none());
    }

    #[test]
    fn items_unwraps_values_wrapper_and_plain_sequences() {
        let wrapped = node(r#"{"_values": [1, 2, 3]}"#);
        assert_eq!(wrapped.items().map(<[RawNode]>::len), Some(3));

        let plain = node(r#"[1, 2]"#);
        assert_eq!(plain.items().map(<[RawNode]>::len), Some(2));

        let scalar = node(r#""not a list""#);
        assert!(scalar.items().is_none());
    }

    #[test]
    fn field_any_probes_aliases_in_order() {
        let n = node(r#"{"type": "Test Case", "nodeType": "Other"}"#);
        let picked = n.field_any(&["nodeType", "type"]).unwrap();
        assert_eq!(picked.resolved_str(), Some("Other"));
    }

    #[test]
    fn resolved_f64_handles_numbers_and_numeric_strings() {
        assert_eq!(node("1.5").resolved_f64(), Some(1.5));
        assert_eq!(node(r#"{"_value": "0.93"}"#).resolved_f64(), Some(0.93));
        assert_eq!(node(r#""abc""#).resolved_f64(), None);
        assert_eq!(node("null").resolved_f64(), None);
    }

    #[test]
    fn map_preserves_document_order() {
        let n = node(r#"{"z": 1, "a": 2, "m": 3}"#);
        let keys: Vec<&str> = n.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
