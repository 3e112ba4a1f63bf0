use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use url::Url;

use crate::{
    meta,
    root::parse_uri,
    service::{Fetch, NoopService, SchemaService},
    Draft, Error, RootSchema, SchemaNode, VocabularySet,
};

/// Cache epoch. Results computed under an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

struct Cached {
    generation: Generation,
    result: Result<RootSchema, String>,
}

/// Loaded and fetched schema documents, shared by all validation requests of a host.
pub struct SchemaRegistry {
    service: Arc<dyn SchemaService>,
    draft: Draft,
    generation: AtomicU64,
    documents: RwLock<AHashMap<String, RootSchema>>,
    fetched: RwLock<AHashMap<String, Cached>>,
    pending: Mutex<AHashSet<String>>,
    bundled: OnceLock<AHashMap<&'static str, RootSchema>>,
}

/// Configuration options for creating a [`SchemaRegistry`].
pub struct RegistryOptions {
    service: Arc<dyn SchemaService>,
    draft: Draft,
}

impl RegistryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: Arc::new(NoopService),
            draft: Draft::default(),
        }
    }

    /// Draft used for documents without a recognized `$schema`.
    #[must_use]
    pub fn draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// Host capability used to fetch documents that were not loaded explicitly.
    #[must_use]
    pub fn service(mut self, service: Arc<dyn SchemaService>) -> Self {
        self.service = service;
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            service: self.service,
            draft: self.draft,
            generation: AtomicU64::new(0),
            documents: RwLock::new(AHashMap::new()),
            fetched: RwLock::new(AHashMap::new()),
            pending: Mutex::new(AHashSet::new()),
            bundled: OnceLock::new(),
        }
    }
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::options().build()
    }
}

impl core::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("draft", &self.draft)
            .field("generation", &self.generation())
            .field("documents", &self.documents.read().len())
            .finish_non_exhaustive()
    }
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn options() -> RegistryOptions {
        RegistryOptions::new()
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.draft
    }

    #[must_use]
    pub fn service(&self) -> &dyn SchemaService {
        &*self.service
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Load a document under `uri` and make it addressable by that URI and by every `$id`
    /// it declares.
    ///
    /// # Errors
    ///
    /// Returns an error if `uri` is not an absolute URI.
    pub fn load(&self, uri: &str, document: Value) -> Result<RootSchema, Error> {
        let uri = parse_uri(uri)?;
        let root = self.build_root(uri, Arc::new(document));
        self.register(&root);
        Ok(root)
    }

    /// Make an already built root addressable through this registry.
    pub fn register(&self, root: &RootSchema) {
        let mut documents = self.documents.write();
        for identifier in root.identifiers() {
            documents.insert(identifier.to_string(), root.clone());
        }
        tracing::debug!(uri = %root.uri(), draft = ?root.draft(), "Registered schema document");
    }

    fn build_root(&self, uri: Url, document: Arc<Value>) -> RootSchema {
        let draft = Draft::detect_or(&document, self.draft);
        let vocabularies = self.vocabularies_for(&document, draft);
        RootSchema::build(uri, document, draft, vocabularies)
    }

    /// Vocabularies active for a document: those declared by its meta-schema when the
    /// meta-schema is known, otherwise the draft defaults.
    #[must_use]
    pub fn vocabularies_for(&self, document: &Value, draft: Draft) -> VocabularySet {
        let Some(schema) = document
            .as_object()
            .and_then(|object| object.get("$schema"))
            .and_then(Value::as_str)
        else {
            return draft.default_vocabularies();
        };
        if Draft::from_meta_schema_uri(schema).is_some() {
            return draft.default_vocabularies();
        }
        let Ok(mut uri) = Url::parse(schema) else {
            return draft.default_vocabularies();
        };
        uri.set_fragment(None);
        let meta = self.documents.read().get(uri.as_str()).cloned();
        meta.and_then(|meta| meta.declared_vocabularies().cloned())
            .unwrap_or_else(|| draft.default_vocabularies())
    }

    fn bundled_roots(&self) -> &AHashMap<&'static str, RootSchema> {
        self.bundled.get_or_init(|| {
            meta::META_SCHEMAS
                .iter()
                .filter_map(|&(canonical, document)| {
                    let uri = Url::parse(canonical).ok()?;
                    let draft = Draft::detect_or(document, Draft::default());
                    let vocabularies = document
                        .get("$vocabulary")
                        .and_then(VocabularySet::from_declaration)
                        .unwrap_or_else(|| draft.default_vocabularies());
                    let root =
                        RootSchema::build(uri, Arc::new(document.clone()), draft, vocabularies);
                    Some((canonical, root))
                })
                .collect()
        })
    }

    /// A bundled meta-schema root.
    #[must_use]
    pub fn bundled(&self, uri: &str) -> Option<RootSchema> {
        let (canonical, _) = meta::bundled(uri)?;
        self.bundled_roots().get(canonical).cloned()
    }

    /// Find the document holding `uri`, fetching it through the service when needed.
    ///
    /// Returns `Ok(None)` while the document is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the service failed to provide the document.
    pub fn fetch_root(&self, uri: &Url) -> Result<Option<RootSchema>, Error> {
        let mut key = uri.clone();
        key.set_fragment(None);
        if let Some(root) = self.bundled(key.as_str()) {
            return Ok(Some(root));
        }
        if let Some(root) = self.documents.read().get(key.as_str()) {
            return Ok(Some(root.clone()));
        }
        let generation = self.generation();
        if let Some(cached) = self.fetched.read().get(key.as_str()) {
            if cached.generation == generation {
                return match &cached.result {
                    Ok(root) => Ok(Some(root.clone())),
                    Err(message) => Err(Error::fetch(key.as_str(), message.clone())),
                };
            }
        }
        if self.pending.lock().contains(key.as_str()) {
            return Ok(None);
        }
        match self.service.fetch_schema_document(&key) {
            Fetch::Ready(document) => {
                let root = self.build_root(key.clone(), document);
                tracing::debug!(uri = %key, "Fetched schema document");
                self.fetched.write().insert(
                    key.as_str().to_string(),
                    Cached {
                        generation,
                        result: Ok(root.clone()),
                    },
                );
                Ok(Some(root))
            }
            Fetch::Pending => {
                tracing::debug!(uri = %key, "Schema document is pending");
                self.pending.lock().insert(key.as_str().to_string());
                Ok(None)
            }
            Fetch::Failed(message) => {
                tracing::debug!(uri = %key, reason = %message, "Failed to fetch schema document");
                self.fetched.write().insert(
                    key.as_str().to_string(),
                    Cached {
                        generation,
                        result: Err(message.clone()),
                    },
                );
                Err(Error::fetch(key.as_str(), message))
            }
        }
    }

    /// Resolve an absolute URI, with an optional fragment, to a schema node.
    #[must_use]
    pub fn resolve_url(&self, uri: &Url) -> Option<SchemaNode> {
        let root = match self.fetch_root(uri) {
            Ok(Some(root)) => root,
            Ok(None) => return None,
            Err(error) => {
                tracing::trace!(%error, "Reference target unavailable");
                return None;
            }
        };
        root.resolve_uri(uri).or_else(|| {
            // Bundled documents may be addressed with either `http` or `https`.
            let mut document = uri.clone();
            document.set_fragment(None);
            root.node()
                .filter(|_| meta::bundled(document.as_str()).is_some())
                .and_then(|node| node.resolve_in_resource(uri.fragment().unwrap_or("")))
        })
    }

    /// URIs currently waiting for the host, sorted.
    #[must_use]
    pub fn pending(&self) -> Vec<String> {
        let mut pending: Vec<_> = self.pending.lock().iter().cloned().collect();
        pending.sort();
        pending
    }

    /// The host finished loading a pending document.
    pub fn document_ready(&self, uri: &str) {
        let uri = uri.trim_end_matches('#');
        self.pending.lock().remove(uri);
        let generation = self.bump();
        tracing::debug!(uri, generation = generation.get(), "Schema document ready");
    }

    /// Discard every fetched document and cached failure.
    pub fn invalidate(&self) {
        self.pending.lock().clear();
        self.fetched.write().clear();
        let generation = self.bump();
        self.service.reset_caches_on_invalidate();
        tracing::debug!(generation = generation.get(), "Schema registry invalidated");
    }

    fn bump(&self) -> Generation {
        Generation(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemorySchemaService;
    use serde_json::json;

    fn registry(service: &Arc<InMemorySchemaService>) -> SchemaRegistry {
        SchemaRegistry::options()
            .service(Arc::clone(service) as Arc<dyn SchemaService>)
            .build()
    }

    #[test]
    fn aliases_by_id() {
        let registry = SchemaRegistry::new();
        registry
            .load(
                "file:///schemas/main.json",
                json!({"$id": "https://example.com/main.json", "$defs": {"a": {"type": "string"}}}),
            )
            .expect("valid uri");
        let uri = Url::parse("https://example.com/main.json#/$defs/a").expect("valid");
        let node = registry.resolve_url(&uri).expect("registered by id");
        assert_eq!(node.pointer(), "/$defs/a");
    }

    #[test]
    fn bundled_meta_schemas() {
        let registry = SchemaRegistry::new();
        let uri = Url::parse("https://json-schema.org/draft-07/schema#/definitions/schemaArray")
            .expect("valid");
        assert!(registry.resolve_url(&uri).is_some());
    }

    #[test]
    fn pending_documents_resolve_after_readiness() {
        let service = Arc::new(InMemorySchemaService::new());
        service.mark_pending("https://example.com/remote.json");
        let registry = registry(&service);
        let uri = Url::parse("https://example.com/remote.json").expect("valid");

        assert!(registry.resolve_url(&uri).is_none());
        assert_eq!(registry.pending(), vec!["https://example.com/remote.json"]);
        let before = registry.generation();

        service.insert("https://example.com/remote.json", json!({"type": "integer"}));
        registry.document_ready("https://example.com/remote.json");

        assert!(registry.generation() > before);
        assert!(registry.pending().is_empty());
        assert!(registry.resolve_url(&uri).is_some());
    }

    #[test]
    fn failures_are_cached_until_invalidation() {
        let service = Arc::new(InMemorySchemaService::new());
        let registry = registry(&service);
        let uri = Url::parse("https://example.com/late.json").expect("valid");

        assert!(matches!(registry.fetch_root(&uri), Err(Error::Fetch { .. })));
        service.insert("https://example.com/late.json", json!({}));
        assert!(registry.fetch_root(&uri).is_err());

        registry.invalidate();
        assert_eq!(service.resets(), 1);
        assert!(matches!(registry.fetch_root(&uri), Ok(Some(_))));
    }

    #[test]
    fn custom_meta_schema_vocabularies() {
        let registry = SchemaRegistry::new();
        registry
            .load(
                "https://example.com/meta",
                json!({
                    "$schema": "https://json-schema.org/draft/2020-12/schema",
                    "$vocabulary": {
                        "https://json-schema.org/draft/2020-12/vocab/core": true,
                        "https://json-schema.org/draft/2020-12/vocab/applicator": true
                    }
                }),
            )
            .expect("valid uri");
        let root = registry
            .load(
                "https://example.com/schema",
                json!({"$schema": "https://example.com/meta", "minLength": 3}),
            )
            .expect("valid uri");
        assert!(!root.vocabularies().contains(crate::Vocabulary::Validation));
        assert!(root.vocabularies().contains(crate::Vocabulary::Applicator));
    }
}
