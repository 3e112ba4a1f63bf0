//! Loaded schema documents.
use core::fmt;
use std::{
    collections::VecDeque,
    sync::{Arc, OnceLock},
};

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use crate::{
    node::{NodeData, SchemaNode},
    pointer,
    specification::RefSiblings,
    Draft, Error, VocabularySet,
};

/// Base URI used for documents loaded without one.
pub const DEFAULT_ROOT_URI: &str = "json-schema:///";

type NodeCell = Arc<OnceLock<Option<Arc<NodeData>>>>;

/// A schema document together with its identifier tables.
///
/// Cloning is cheap; all clones share the same document and node cache.
#[derive(Clone)]
pub struct RootSchema {
    inner: Arc<RootInner>,
}

struct RootInner {
    document: Arc<Value>,
    uri: Url,
    draft: Draft,
    vocabularies: VocabularySet,
    declared_vocabularies: Option<VocabularySet>,
    resources: Vec<Resource>,
    by_uri: AHashMap<String, usize>,
    anchors: AHashMap<(usize, String), String>,
    dynamic_anchors: AHashMap<(usize, String), String>,
    recursive_anchors: AHashSet<usize>,
    nodes: Mutex<AHashMap<Arc<str>, NodeCell>>,
}

/// A schema resource embedded in a document: the document root or any subschema with an id.
#[derive(Debug)]
struct Resource {
    pointer: String,
    base: Url,
}

impl RootSchema {
    /// Load a document, detecting its draft from `$schema` and defaulting to 2020-12.
    ///
    /// # Errors
    ///
    /// Returns an error if `uri` is not an absolute URI.
    pub fn new(uri: &str, document: Value) -> Result<RootSchema, Error> {
        let draft = Draft::detect_or(&document, Draft::default());
        RootSchema::with_draft(uri, document, draft)
    }

    /// Load a document under an explicit draft.
    ///
    /// # Errors
    ///
    /// Returns an error if `uri` is not an absolute URI.
    pub fn with_draft(
        uri: &str,
        document: impl Into<Arc<Value>>,
        draft: Draft,
    ) -> Result<RootSchema, Error> {
        let uri = parse_uri(uri)?;
        Ok(RootSchema::build(
            uri,
            document.into(),
            draft,
            draft.default_vocabularies(),
        ))
    }

    pub(crate) fn build(
        mut uri: Url,
        document: Arc<Value>,
        draft: Draft,
        vocabularies: VocabularySet,
    ) -> RootSchema {
        uri.set_fragment(None);
        let declared_vocabularies = document
            .as_object()
            .and_then(|object| object.get("$vocabulary"))
            .and_then(VocabularySet::from_declaration);
        let mut index = Index::new(uri.clone());
        index.walk(&document, draft);
        let Index {
            resources,
            by_uri,
            anchors,
            dynamic_anchors,
            recursive_anchors,
        } = index;
        tracing::trace!(
            uri = %uri,
            ?draft,
            resources = resources.len(),
            anchors = anchors.len(),
            "Indexed schema document"
        );
        RootSchema {
            inner: Arc::new(RootInner {
                document,
                uri,
                draft,
                vocabularies,
                declared_vocabularies,
                resources,
                by_uri,
                anchors,
                dynamic_anchors,
                recursive_anchors,
                nodes: Mutex::new(AHashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.inner.document
    }

    /// The URI the document was loaded under, without a fragment.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.inner.uri
    }

    /// The effective base URI of the document root (its `$id` if declared).
    #[must_use]
    pub fn base_uri(&self) -> &Url {
        &self.inner.resources[0].base
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.inner.draft
    }

    /// Vocabularies active for this document.
    #[must_use]
    pub fn vocabularies(&self) -> &VocabularySet {
        &self.inner.vocabularies
    }

    /// The document's own `$vocabulary` declaration, present on meta-schemas.
    #[must_use]
    pub fn declared_vocabularies(&self) -> Option<&VocabularySet> {
        self.inner.declared_vocabularies.as_ref()
    }

    /// Every absolute URI (without fragment) identifying a resource of this document.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.inner.by_uri.keys().map(String::as_str)
    }

    /// The node for the document root, if the document is a schema at all.
    #[must_use]
    pub fn node(&self) -> Option<SchemaNode> {
        self.node_at("")
    }

    /// Resolve a JSON pointer within the document.
    ///
    /// Accepts `#/a/b`, `/a/b`, `#` or `""`; percent-escapes are decoded. Only objects and
    /// booleans are schema nodes, so pointers to other values return `None`.
    #[must_use]
    pub fn resolve_pointer(&self, pointer: &str) -> Option<SchemaNode> {
        let normalized = pointer::normalize(pointer)?;
        self.node_at(&normalized)
    }

    /// Node at an already normalized pointer. Compute-once per pointer.
    pub(crate) fn node_at(&self, pointer: &str) -> Option<SchemaNode> {
        let cell = {
            let mut nodes = self.inner.nodes.lock();
            if let Some(cell) = nodes.get(pointer) {
                Arc::clone(cell)
            } else {
                let cell = NodeCell::default();
                nodes.insert(Arc::from(pointer), Arc::clone(&cell));
                cell
            }
        };
        let data = cell.get_or_init(|| self.materialize(pointer)).clone()?;
        Some(SchemaNode::new(self.clone(), data))
    }

    fn materialize(&self, pointer: &str) -> Option<Arc<NodeData>> {
        match pointer::resolve(&self.inner.document, pointer)? {
            Value::Object(_) | Value::Bool(_) => Some(Arc::new(NodeData {
                pointer: Arc::from(pointer),
                resource: self.resource_of(pointer),
            })),
            _ => None,
        }
    }

    /// Index of the innermost resource containing `pointer`.
    fn resource_of(&self, pointer: &str) -> usize {
        let mut best = (0, 0);
        for (idx, resource) in self.inner.resources.iter().enumerate().skip(1) {
            let prefix = resource.pointer.as_str();
            let contains = pointer == prefix
                || (pointer.starts_with(prefix) && pointer[prefix.len()..].starts_with('/'));
            if contains && prefix.len() > best.1 {
                best = (idx, prefix.len());
            }
        }
        best.0
    }

    /// Resolve an absolute URI addressing a resource of this document, with an optional
    /// pointer or anchor fragment.
    #[must_use]
    pub fn resolve_uri(&self, uri: &Url) -> Option<SchemaNode> {
        let mut key = uri.clone();
        key.set_fragment(None);
        let resource = *self.inner.by_uri.get(key.as_str())?;
        self.resolve_fragment(resource, uri.fragment().unwrap_or(""))
    }

    pub(crate) fn resolve_fragment(&self, resource: usize, fragment: &str) -> Option<SchemaNode> {
        let base = &self.inner.resources[resource].pointer;
        if let Some(pointer) = pointer::normalize(fragment) {
            return self.node_at(&format!("{base}{pointer}"));
        }
        self.anchor(resource, fragment)
    }

    /// A plain-name anchor (`$anchor`, legacy `#name` ids, or a `$dynamicAnchor`) in a resource.
    pub(crate) fn anchor(&self, resource: usize, name: &str) -> Option<SchemaNode> {
        let pointer = self.inner.anchors.get(&(resource, name.to_string()))?;
        self.node_at(pointer)
    }

    /// A `$dynamicAnchor` declared in a resource.
    pub(crate) fn dynamic_anchor(&self, resource: usize, name: &str) -> Option<SchemaNode> {
        let pointer = self.inner.dynamic_anchors.get(&(resource, name.to_string()))?;
        self.node_at(pointer)
    }

    /// Whether a resource root declares `$recursiveAnchor: true`.
    pub(crate) fn has_recursive_anchor(&self, resource: usize) -> bool {
        self.inner.recursive_anchors.contains(&resource)
    }

    pub(crate) fn resource_pointer(&self, resource: usize) -> &str {
        &self.inner.resources[resource].pointer
    }

    pub(crate) fn resource_base(&self, resource: usize) -> &Url {
        &self.inner.resources[resource].base
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for RootSchema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for RootSchema {}

impl fmt::Debug for RootSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootSchema")
            .field("uri", &self.inner.uri.as_str())
            .field("draft", &self.inner.draft)
            .finish_non_exhaustive()
    }
}

pub(crate) fn parse_uri(uri: &str) -> Result<Url, Error> {
    Url::parse(uri).map_err(|source| Error::invalid_uri(uri, source))
}

struct Index {
    resources: Vec<Resource>,
    by_uri: AHashMap<String, usize>,
    anchors: AHashMap<(usize, String), String>,
    dynamic_anchors: AHashMap<(usize, String), String>,
    recursive_anchors: AHashSet<usize>,
}

impl Index {
    fn new(uri: Url) -> Index {
        let mut by_uri = AHashMap::new();
        by_uri.insert(uri.as_str().to_string(), 0);
        Index {
            resources: vec![Resource {
                pointer: String::new(),
                base: uri,
            }],
            by_uri,
            anchors: AHashMap::new(),
            dynamic_anchors: AHashMap::new(),
            recursive_anchors: AHashSet::new(),
        }
    }

    fn walk(&mut self, document: &Value, draft: Draft) {
        let mut queue = VecDeque::from([(String::new(), document, 0_usize)]);
        while let Some((location, contents, mut resource)) = queue.pop_front() {
            if let Some(object) = contents.as_object() {
                // Siblings of `$ref` are not evaluated in older drafts, `$id` included.
                let ignored = draft.ref_siblings() == RefSiblings::Ignore
                    && object.contains_key("$ref");
                if !ignored {
                    if let Some(id) = object.get(draft.id_keyword()).and_then(Value::as_str) {
                        resource = self.register_id(&location, id, resource);
                    }
                }
                if let Some(keyword) = draft.anchor_keyword() {
                    if let Some(name) = object.get(keyword).and_then(Value::as_str) {
                        self.anchors
                            .insert((resource, name.to_string()), location.clone());
                    }
                }
                if let Some(keyword) = draft.dynamic_anchor_keyword() {
                    match object.get(keyword) {
                        Some(Value::String(name)) => {
                            self.anchors
                                .entry((resource, name.clone()))
                                .or_insert_with(|| location.clone());
                            self.dynamic_anchors
                                .insert((resource, name.clone()), location.clone());
                        }
                        Some(Value::Bool(true)) if self.resources[resource].pointer == location => {
                            self.recursive_anchors.insert(resource);
                        }
                        _ => {}
                    }
                }
            }
            for (relative, child) in draft.subresources_of(contents) {
                queue.push_back((format!("{location}{relative}"), child, resource));
            }
        }
    }

    fn register_id(&mut self, location: &str, id: &str, current: usize) -> usize {
        if let Some(name) = id.strip_prefix('#') {
            if !name.is_empty() {
                self.anchors
                    .insert((current, name.to_string()), location.to_string());
            }
            return current;
        }
        let mut resolved = match self.resources[current].base.join(id) {
            Ok(resolved) => resolved,
            Err(error) => {
                tracing::debug!(id, location, %error, "Ignoring invalid schema identifier");
                return current;
            }
        };
        let fragment = resolved
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_string);
        resolved.set_fragment(None);
        let resource = if location.is_empty() {
            self.resources[0].base = resolved.clone();
            0
        } else {
            self.resources.push(Resource {
                pointer: location.to_string(),
                base: resolved.clone(),
            });
            self.resources.len() - 1
        };
        self.by_uri
            .entry(resolved.as_str().to_string())
            .or_insert(resource);
        if let Some(name) = fragment {
            self.anchors.insert((resource, name), location.to_string());
        }
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn load(document: Value) -> RootSchema {
        RootSchema::new("https://example.com/root.json", document).expect("valid uri")
    }

    #[test_case("#/definitions/a", Some("/definitions/a"))]
    #[test_case("/definitions/a", Some("/definitions/a"))]
    #[test_case("#", Some(""))]
    #[test_case("#/definitions/a%20b", Some("/definitions/a b"))]
    #[test_case("#/definitions/list", None; "arrays are not schemas")]
    #[test_case("#/definitions/missing", None)]
    fn pointers(pointer: &str, expected: Option<&str>) {
        let root = load(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"a": {"type": "string"}, "a b": true, "list": [1, 2]}
        }));
        let node = root.resolve_pointer(pointer);
        assert_eq!(node.as_ref().map(SchemaNode::pointer), expected);
    }

    #[test]
    fn nodes_are_cached() {
        let root = load(json!({"properties": {"a": {}}}));
        let first = root.resolve_pointer("#/properties/a").expect("exists");
        let second = root.resolve_pointer("/properties/a").expect("exists");
        assert_eq!(first, second);
        assert!(first.same_data(&second));
    }

    #[test]
    fn embedded_resources() {
        let root = load(json!({
            "$id": "https://example.com/schemas/root.json",
            "$defs": {
                "item": {
                    "$id": "item.json",
                    "$anchor": "top",
                    "properties": {"x": {"$anchor": "x"}}
                }
            }
        }));
        let item = Url::parse("https://example.com/schemas/item.json").expect("valid");
        assert_eq!(
            root.resolve_uri(&item).map(|node| node.pointer().to_string()),
            Some("/$defs/item".to_string())
        );
        let anchored = Url::parse("https://example.com/schemas/item.json#x").expect("valid");
        assert_eq!(
            root.resolve_uri(&anchored).map(|node| node.pointer().to_string()),
            Some("/$defs/item/properties/x".to_string())
        );
        let pointer = Url::parse("https://example.com/schemas/item.json#/properties/x")
            .expect("valid");
        assert!(root.resolve_uri(&pointer).is_some());
        // The load URI stays addressable.
        let original = Url::parse("https://example.com/root.json#/$defs/item").expect("valid");
        assert!(root.resolve_uri(&original).is_some());
    }

    #[test]
    fn legacy_fragment_ids() {
        let root = load(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"a": {"$id": "#named", "type": "integer"}}
        }));
        let named = Url::parse("https://example.com/root.json#named").expect("valid");
        assert_eq!(
            root.resolve_uri(&named).map(|node| node.pointer().to_string()),
            Some("/definitions/a".to_string())
        );
    }

    #[test]
    fn ids_next_to_ref_are_ignored_in_draft7() {
        let root = load(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": {"a": {"$id": "other.json", "$ref": "#"}}
        }));
        assert_eq!(root.identifiers().count(), 1);
    }

    #[test]
    fn invalid_uri() {
        assert!(RootSchema::new("not a uri", json!({})).is_err());
    }

    #[test]
    fn vocabulary_declaration() {
        let root = load(json!({
            "$vocabulary": {"https://json-schema.org/draft/2020-12/vocab/core": true}
        }));
        assert!(root
            .declared_vocabularies()
            .is_some_and(|set| set.contains(crate::Vocabulary::Core)));
    }
}
