use core::fmt;
use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use serde_json::{Map, Number, Value};
use url::Url;

use crate::{
    pointer::{self, Segment},
    specification::KeywordLookup,
    Draft, RootSchema, VocabularySet,
};

static NULL: Value = Value::Null;

/// Data materialized once per pointer and shared by every handle to it.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) pointer: Arc<str>,
    pub(crate) resource: usize,
}

/// A schema located at a JSON pointer inside a [`RootSchema`].
///
/// Identity is the pair (root, pointer): two handles for the same location compare equal.
#[derive(Clone)]
pub struct SchemaNode {
    root: RootSchema,
    data: Arc<NodeData>,
}

impl SchemaNode {
    pub(crate) fn new(root: RootSchema, data: Arc<NodeData>) -> SchemaNode {
        SchemaNode { root, data }
    }

    #[must_use]
    pub fn root(&self) -> &RootSchema {
        &self.root
    }

    /// Normalized, escaped JSON pointer of this node.
    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.data.pointer
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.root.draft()
    }

    #[must_use]
    pub fn vocabularies(&self) -> &VocabularySet {
        self.root.vocabularies()
    }

    /// Raw JSON value of the node: an object or a boolean.
    #[must_use]
    pub fn value(&self) -> &Value {
        pointer::resolve(self.root.document(), &self.data.pointer).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.value().as_object()
    }

    /// `Some` for boolean schemas.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value().as_bool()
    }

    /// Base URI used to resolve relative references found in this node.
    #[must_use]
    pub fn base_uri(&self) -> &Url {
        self.root.resource_base(self.data.resource)
    }

    /// The root of the schema resource (document root or nearest subschema with an id)
    /// containing this node.
    #[must_use]
    pub fn resource_root(&self) -> SchemaNode {
        self.root
            .node_at(self.root.resource_pointer(self.data.resource))
            .unwrap_or_else(|| self.clone())
    }

    #[must_use]
    pub fn is_resource_root(&self) -> bool {
        self.root.resource_pointer(self.data.resource) == self.pointer()
    }

    /// Resolve a fragment (pointer or anchor name) relative to this node's resource.
    #[must_use]
    pub fn resolve_in_resource(&self, fragment: &str) -> Option<SchemaNode> {
        self.root.resolve_fragment(self.data.resource, fragment)
    }

    /// A `$dynamicAnchor` with `name` declared anywhere in this node's resource.
    #[must_use]
    pub fn dynamic_anchor_in_resource(&self, name: &str) -> Option<SchemaNode> {
        self.root.dynamic_anchor(self.data.resource, name)
    }

    /// Whether this node's resource root declares `$recursiveAnchor: true`.
    #[must_use]
    pub fn resource_has_recursive_anchor(&self) -> bool {
        self.root.has_recursive_anchor(self.data.resource)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.as_object()
            .into_iter()
            .flat_map(|object| object.keys().map(String::as_str))
    }

    #[must_use]
    pub fn get_value(&self, keyword: &str) -> Option<&Value> {
        self.as_object()?.get(keyword)
    }

    #[must_use]
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get_value(keyword)?.as_str()
    }

    #[must_use]
    pub fn get_bool(&self, keyword: &str) -> Option<bool> {
        self.get_value(keyword)?.as_bool()
    }

    #[must_use]
    pub fn get_number(&self, keyword: &str) -> Option<&Number> {
        match self.get_value(keyword)? {
            Value::Number(number) => Some(number),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get_number(keyword)?.as_f64()
    }

    /// A non-negative integer keyword; integral floats such as `2.0` are accepted.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn get_u64(&self, keyword: &str) -> Option<u64> {
        let number = self.get_number(keyword)?;
        if let Some(value) = number.as_u64() {
            return Some(value);
        }
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64)
            .map(|value| value as u64)
    }

    /// Strings of an array keyword, skipping non-string entries.
    #[must_use]
    pub fn get_strings(&self, keyword: &str) -> Option<Vec<&str>> {
        let items = self.get_value(keyword)?.as_array()?;
        Some(items.iter().filter_map(Value::as_str).collect())
    }

    /// Subschema stored directly under `keyword`.
    #[must_use]
    pub fn child(&self, keyword: &str) -> Option<SchemaNode> {
        if self.as_object()?.contains_key(keyword) {
            self.root.node_at(&pointer::join(self.pointer(), keyword))
        } else {
            None
        }
    }

    /// Subschema reached through several segments, e.g. `["properties", "name"]`.
    #[must_use]
    pub fn child_at<'a>(
        &self,
        segments: impl IntoIterator<Item = Segment<'a>>,
    ) -> Option<SchemaNode> {
        self.root.node_at(&pointer::join_all(self.pointer(), segments))
    }

    /// Subschemas in an array keyword. Entries that are not schemas are skipped.
    #[must_use]
    pub fn child_list(&self, keyword: &str) -> Option<Vec<SchemaNode>> {
        let items = self.get_value(keyword)?.as_array()?;
        let base = pointer::join(self.pointer(), keyword);
        Some(
            (0..items.len())
                .filter_map(|idx| self.root.node_at(&pointer::join(&base, idx)))
                .collect(),
        )
    }

    /// Subschemas in a map keyword, in map order. Entries that are not schemas are skipped.
    #[must_use]
    pub fn child_map(&self, keyword: &str) -> Option<Vec<(String, SchemaNode)>> {
        let map = self.get_value(keyword)?.as_object()?;
        let base = pointer::join(self.pointer(), keyword);
        Some(
            map.keys()
                .filter_map(|name| {
                    self.root
                        .node_at(&pointer::join(&base, name.as_str()))
                        .map(|node| (name.clone(), node))
                })
                .collect(),
        )
    }

    /// Direct subschemas of this node, in document order.
    #[must_use]
    pub fn subschemas(&self) -> Vec<SchemaNode> {
        self.draft()
            .subresources_of(self.value())
            .into_iter()
            .filter_map(|(relative, _)| {
                self.root
                    .node_at(&format!("{}{relative}", self.pointer()))
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn same_data(&self, other: &SchemaNode) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl KeywordLookup for SchemaNode {
    fn has_keyword(&self, keyword: &str) -> bool {
        self.as_object()
            .is_some_and(|object| object.contains_key(keyword))
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.data.pointer == other.data.pointer
    }
}

impl Eq for SchemaNode {}

impl Hash for SchemaNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.ptr_id().hash(state);
        self.data.pointer.hash(state);
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaNode({}#{})", self.root.uri(), self.pointer())
    }
}
