//! Document store abstraction
//!
//! A keyed store of JSON objects, shaped after managed document databases:
//! whole-document `set`, partial-field `update`, and point `get`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::StoreError;
use crate::model::Document;

/// Abstraction for document store backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Replace the document under `key`
    async fn set(&self, key: &str, fields: Document) -> Result<(), StoreError>;

    /// Overwrite the given fields of an existing document
    ///
    /// Fields not mentioned are left alone. Fails with
    /// [`StoreError::NotFound`] when no document exists under `key`.
    async fn update(&self, key: &str, fields: Document) -> Result<(), StoreError>;
}

/// In-memory document store for testing and development
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, Document>>,
    calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all stored keys (useful for testing)
    pub fn keys(&self) -> Vec<String> {
        self.documents
            .lock()
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of trait calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Document>>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.lock()?;
        Ok(documents.get(key).cloned())
    }

    async fn set(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        let mut documents = self.lock()?;
        documents.insert(key.to_string(), fields);
        Ok(())
    }

    async fn update(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        let mut documents = self.lock()?;
        let document = documents
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        document.extend(fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_memory_document_store_basic_operations() {
        let store = MemoryDocumentStore::new();
        let key = "folder_family";

        assert!(store.get(key).await.unwrap().is_none());

        store
            .set(key, doc(json!({"password": "secret", "subFolders": []})))
            .await
            .unwrap();

        let stored = store.get(key).await.unwrap().unwrap();
        assert_eq!(stored["password"], "secret");
        assert_eq!(stored["subFolders"], json!([]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys(), vec![key.to_string()]);
    }

    #[tokio::test]
    async fn test_update_overwrites_only_given_fields() {
        let store = MemoryDocumentStore::new();
        let key = "folder_family";
        store
            .set(key, doc(json!({"password": "secret", "subFolders": ["a"]})))
            .await
            .unwrap();

        store
            .update(key, doc(json!({"subFolders": ["a", "b"]})))
            .await
            .unwrap();

        let stored = store.get(key).await.unwrap().unwrap();
        assert_eq!(stored["password"], "secret");
        assert_eq!(stored["subFolders"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let result = store.update("folder_ghost", Document::new()).await;

        match result {
            Err(StoreError::NotFound(key)) => assert_eq!(key, "folder_ghost"),
            _ => panic!("Expected NotFound error"),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_set_replaces_whole_document() {
        let store = MemoryDocumentStore::new();
        store
            .set("k", doc(json!({"password": "one", "extra": true})))
            .await
            .unwrap();
        store.set("k", doc(json!({"password": "two"}))).await.unwrap();

        let stored = store.get("k").await.unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["password"], "two");
        assert_eq!(store.call_count(), 3);
    }
}
