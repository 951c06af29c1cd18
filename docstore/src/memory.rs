use crate::client::{Document, DocumentStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

/// In-process document store used by tests.
///
/// Writes can be denied per document with [`MemoryStore::deny_writes`] to
/// exercise partial-failure behavior without a real backend.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    denied: RwLock<HashSet<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Reject all subsequent `set` calls for this document with
    /// `StoreError::PermissionDenied`.
    pub fn deny_writes(&self, collection: &str, id: &str) {
        self.denied
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((collection.to_string(), id.to_string()));
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let denied = self
            .denied
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(collection.to_string(), id.to_string()));
        if denied {
            return Err(StoreError::PermissionDenied {
                path: format!("{collection}/{id}"),
            });
        }

        self.collections
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}
