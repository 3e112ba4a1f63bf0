use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use url::Url;

/// Outcome of asking the host for a schema document.
#[derive(Debug, Clone)]
pub enum Fetch {
    /// The document is available.
    Ready(Arc<Value>),
    /// The document is being loaded; ask again after the host signals readiness.
    Pending,
    /// The document cannot be provided.
    Failed(String),
}

/// Host capability for loading schema documents.
///
/// Fetching must not block: hosts that load documents asynchronously return [`Fetch::Pending`]
/// and later call [`crate::SchemaRegistry::document_ready`].
pub trait SchemaService: Send + Sync {
    fn fetch_schema_document(&self, uri: &Url) -> Fetch;

    /// Record that a document was reached through a reference.
    fn register_reference_usage(&self, _uri: &Url) {}

    /// Drop host-side caches after the registry has been invalidated.
    fn reset_caches_on_invalidate(&self) {}
}

/// A service that never provides documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopService;

impl SchemaService for NoopService {
    fn fetch_schema_document(&self, uri: &Url) -> Fetch {
        Fetch::Failed(format!("No schema service configured to fetch '{uri}'"))
    }
}

/// A [`SchemaService`] backed by an in-memory map.
#[derive(Debug, Default)]
pub struct InMemorySchemaService {
    documents: RwLock<AHashMap<String, Arc<Value>>>,
    pending: RwLock<AHashSet<String>>,
    usages: Mutex<Vec<String>>,
    resets: Mutex<usize>,
}

impl InMemorySchemaService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a document available, clearing its pending mark.
    pub fn insert(&self, uri: impl Into<String>, document: Value) {
        let uri = uri.into();
        self.pending.write().remove(&uri);
        self.documents.write().insert(uri, Arc::new(document));
    }

    /// Report the document as still loading.
    pub fn mark_pending(&self, uri: impl Into<String>) {
        self.pending.write().insert(uri.into());
    }

    /// URIs passed to [`SchemaService::register_reference_usage`], in call order.
    #[must_use]
    pub fn usages(&self) -> Vec<String> {
        self.usages.lock().clone()
    }

    /// How many times the registry asked to reset caches.
    #[must_use]
    pub fn resets(&self) -> usize {
        *self.resets.lock()
    }
}

impl SchemaService for InMemorySchemaService {
    fn fetch_schema_document(&self, uri: &Url) -> Fetch {
        let key = uri.as_str().trim_end_matches('#');
        if self.pending.read().contains(key) {
            return Fetch::Pending;
        }
        match self.documents.read().get(key) {
            Some(document) => Fetch::Ready(Arc::clone(document)),
            None => Fetch::Failed(format!("Unknown schema document '{key}'")),
        }
    }

    fn register_reference_usage(&self, uri: &Url) {
        self.usages.lock().push(uri.to_string());
    }

    fn reset_caches_on_invalidate(&self) {
        *self.resets.lock() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pending_then_ready() {
        let service = InMemorySchemaService::new();
        let uri = Url::parse("https://example.com/a.json").expect("valid");
        service.mark_pending("https://example.com/a.json");
        assert!(matches!(service.fetch_schema_document(&uri), Fetch::Pending));
        service.insert("https://example.com/a.json", json!({"type": "string"}));
        assert!(matches!(service.fetch_schema_document(&uri), Fetch::Ready(_)));
    }

    #[test]
    fn unknown_fails() {
        let service = InMemorySchemaService::new();
        let uri = Url::parse("https://example.com/missing.json").expect("valid");
        assert!(matches!(service.fetch_schema_document(&uri), Fetch::Failed(_)));
    }
}
