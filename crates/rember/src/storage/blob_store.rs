//! Blob storage abstraction
//!
//! This module provides the hierarchical blob store trait and an in-memory
//! implementation for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::model::{Address, BlobRef};

/// Abstraction for hierarchical blob storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store data at `path` and return an address it can be retrieved from
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str)
    -> Result<Address, StoreError>;

    /// List every blob below `prefix`, recursively
    async fn list(&self, prefix: &str) -> Result<Vec<BlobRef>, StoreError>;

    /// Resolve a retrievable address for a listed blob
    async fn resolve_address(&self, blob: &BlobRef) -> Result<Address, StoreError>;
}

/// A blob held by [`MemoryBlobStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory blob store for testing
///
/// Addresses take the form `memory://<path>`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all stored paths in lexical order (useful for testing)
    pub fn paths(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Get a stored blob (useful for testing)
    pub fn blob(&self, path: &str) -> Option<StoredBlob> {
        self.blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(path).cloned())
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn address(path: &str) -> Address {
        Address::new(format!("memory://{}", path))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, StoredBlob>>, StoreError> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))
    }
}

/// Normalize a listing prefix so `a/b` never matches `a/bc/...`
fn directory_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<Address, StoreError> {
        if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
            return Err(StoreError::InvalidKey(format!("Invalid blob path: '{}'", path)));
        }

        let mut blobs = self.lock()?;
        blobs.insert(
            path.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(Self::address(path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobRef>, StoreError> {
        let prefix = directory_prefix(prefix);
        let blobs = self.lock()?;
        Ok(blobs
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .map(BlobRef::new)
            .collect())
    }

    async fn resolve_address(&self, blob: &BlobRef) -> Result<Address, StoreError> {
        let blobs = self.lock()?;
        if blobs.contains_key(&blob.path) {
            Ok(Self::address(&blob.path))
        } else {
            Err(StoreError::NotFound(blob.path.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_blob_store_basic_operations() {
        let store = MemoryBlobStore::new();
        let path = "family/holidays/beach.jpg";

        let address = store.put(path, b"jpeg".to_vec(), "image/jpeg").await.unwrap();
        assert_eq!(address.as_str(), "memory://family/holidays/beach.jpg");

        let blob = store.blob(path).unwrap();
        assert_eq!(blob.data, b"jpeg".to_vec());
        assert_eq!(blob.content_type, "image/jpeg");

        let resolved = store.resolve_address(&BlobRef::new(path)).await.unwrap();
        assert_eq!(resolved, address);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_prefix() {
        let store = MemoryBlobStore::new();
        store.put("family/holidays/a.jpg", vec![1], "image/jpeg").await.unwrap();
        store.put("family/holidays/b.jpg", vec![2], "image/jpeg").await.unwrap();
        store.put("family/holidays2/c.jpg", vec![3], "image/jpeg").await.unwrap();
        store.put("other/holidays/d.jpg", vec![4], "image/jpeg").await.unwrap();

        let listed = store.list("family/holidays").await.unwrap();
        let paths: Vec<_> = listed.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, vec!["family/holidays/a.jpg", "family/holidays/b.jpg"]);

        // Trailing slash is equivalent
        assert_eq!(store.list("family/holidays/").await.unwrap(), listed);
        assert_eq!(store.list("family").await.unwrap().len(), 3);
        assert!(store.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_missing_blob() {
        let store = MemoryBlobStore::new();
        let result = store.resolve_address(&BlobRef::new("missing.jpg")).await;

        match result {
            Err(StoreError::NotFound(path)) => assert_eq!(path, "missing.jpg"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[tokio::test]
    async fn test_put_rejects_invalid_paths() {
        let store = MemoryBlobStore::new();
        assert!(store.put("", vec![], "text/plain").await.is_err());
        assert!(store.put("/abs.jpg", vec![], "text/plain").await.is_err());
        assert!(store.put("dir/", vec![], "text/plain").await.is_err());
        assert!(store.is_empty());
    }
}
