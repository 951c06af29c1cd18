use crate::config::StoreConfig;
use crate::memory::MemoryStore;
use crate::rest::RestStore;
use async_trait::async_trait;
use http::StatusCode;
use indexmap::IndexMap;
use std::sync::Arc;

/// A schemaless document: field name to JSON value, in field order.
pub type Document = IndexMap<String, serde_json::Value>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("permission denied for {path}")]
    PermissionDenied { path: String },

    #[error("unexpected status {status} from store for {path}")]
    UnexpectedStatus { path: String, status: StatusCode },

    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend interface for a managed document store.
///
/// A document is created or fully overwritten by `set`; there are no
/// update-merge semantics and no deletion path. Each `set` is independently
/// atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// Shared handle to a document store backend.
///
/// Cheap to clone; one handle is constructed per process (see [`connect`])
/// and passed into whatever consumes the store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn DocumentStore>,
}

impl Store {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Store { inner }
    }

    /// In-process store backed by a hash map. Intended for tests.
    pub fn in_memory() -> Self {
        Store::new(Arc::new(MemoryStore::new()))
    }

    pub fn collection(&self, name: impl Into<String>) -> CollectionRef {
        CollectionRef {
            store: self.inner.clone(),
            name: name.into(),
        }
    }
}

/// Construct the store handle from static connection parameters.
///
/// Called once at process start; the returned handle is the only way the
/// rest of the application reaches the store.
pub fn connect(config: &StoreConfig) -> Store {
    tracing::debug!(project_id = %config.project_id, base_url = %config.base_url, "connecting document store");
    Store::new(Arc::new(RestStore::new(config)))
}

/// Reference to a named collection within the store.
pub struct CollectionRef {
    store: Arc<dyn DocumentStore>,
    name: String,
}

impl CollectionRef {
    pub fn doc(&self, id: impl Into<String>) -> DocumentRef {
        DocumentRef {
            store: self.store.clone(),
            collection: self.name.clone(),
            id: id.into(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.store.list(&self.name).await
    }
}

/// Reference to a single document within a collection.
pub struct DocumentRef {
    store: Arc<dyn DocumentStore>,
    collection: String,
    id: String,
}

impl DocumentRef {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create or fully replace the document.
    pub async fn set(&self, doc: &Document) -> Result<(), StoreError> {
        self.store.set(&self.collection, &self.id, doc).await
    }

    pub async fn get(&self) -> Result<Option<Document>, StoreError> {
        self.store.get(&self.collection, &self.id).await
    }
}
