//! Sub-folder index of a code
//!
//! The names live in the `subFolders` array of the code's document. Every
//! mutation reads the current array, edits it and writes the whole array
//! back, holding the per-code writer lock for the duration.

use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{RemberError, Result};
use crate::locks::KeyedLocks;
use crate::model::{Document, PLACEHOLDER_NAME, SUBFOLDERS_FIELD, blob_path, document_key};
use crate::storage::{BlobStore, DocumentStore};

pub struct GalleryIndex {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    locks: Arc<KeyedLocks>,
    materialize_prefixes: bool,
}

impl GalleryIndex {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        locks: Arc<KeyedLocks>,
        materialize_prefixes: bool,
    ) -> Self {
        Self {
            documents,
            blobs,
            locks,
            materialize_prefixes,
        }
    }

    /// Sub-folder names in stored order; empty when the code has none
    pub async fn list_subfolders(&self, code: &str) -> Result<Vec<String>> {
        let document = self.documents.get(&document_key(code)).await?;
        Ok(document.as_ref().map(subfolders_of).unwrap_or_default())
    }

    /// Append `name` and make its blob prefix exist
    pub async fn add_subfolder(&self, code: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(RemberError::invalid("Sub-folder name cannot be empty"));
        }

        let key = document_key(code);
        {
            let _guard = self.locks.lock(&key).await;
            let mut subfolders = self.list_subfolders(code).await?;
            subfolders.push(name.to_string());
            self.persist(&key, subfolders).await?;
        }

        if self.materialize_prefixes {
            let path = blob_path(code, name, PLACEHOLDER_NAME);
            debug!(path = %path, "materializing sub-folder prefix");
            self.blobs.put(&path, Vec::new(), "text/plain").await?;
        }

        info!(code, subfolder = name, "added sub-folder");
        Ok(())
    }

    /// Remove the entries at `indices` of the current ordering
    ///
    /// Indices past the end are ignored. Blobs stored under removed
    /// sub-folders are left in place.
    pub async fn remove_subfolders(&self, code: &str, indices: &BTreeSet<usize>) -> Result<()> {
        let key = document_key(code);
        let _guard = self.locks.lock(&key).await;

        let subfolders = self.list_subfolders(code).await?;
        if let Some(&max) = indices.last() {
            if max >= subfolders.len() {
                warn!(
                    code,
                    index = max,
                    len = subfolders.len(),
                    "ignoring out-of-range sub-folder index"
                );
            }
        }

        let remaining: Vec<String> = subfolders
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !indices.contains(index))
            .map(|(_, name)| name)
            .collect();

        self.persist(&key, remaining).await?;
        info!(code, removed = indices.len(), "removed sub-folders");
        Ok(())
    }

    async fn persist(&self, key: &str, subfolders: Vec<String>) -> Result<()> {
        let mut fields = Document::new();
        fields.insert(
            SUBFOLDERS_FIELD.to_string(),
            Value::Array(subfolders.into_iter().map(Value::String).collect()),
        );
        self.documents.update(key, fields).await?;
        Ok(())
    }
}

/// String entries of the `subFolders` field
fn subfolders_of(document: &Document) -> Vec<String> {
    document
        .get(SUBFOLDERS_FIELD)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|name| name.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBlobStore, MemoryDocumentStore};
    use serde_json::json;

    async fn gallery(materialize: bool) -> (GalleryIndex, Arc<MemoryDocumentStore>, Arc<MemoryBlobStore>) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let document: Document = json!({"password": "secret", "subFolders": []})
            .as_object()
            .cloned()
            .unwrap();
        documents.set("folder_x", document).await.unwrap();

        let gallery = GalleryIndex::new(
            documents.clone(),
            blobs.clone(),
            Arc::new(KeyedLocks::new()),
            materialize,
        );
        (gallery, documents, blobs)
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let (gallery, documents, blobs) = gallery(true).await;

        gallery.add_subfolder("x", "gallery1").await.unwrap();

        assert_eq!(gallery.list_subfolders("x").await.unwrap(), vec!["gallery1"]);
        assert_eq!(blobs.paths(), vec!["x/gallery1/placeholder.txt"]);

        // Password survives the array overwrite
        let stored = documents.get("folder_x").await.unwrap().unwrap();
        assert_eq!(stored["password"], "secret");
    }

    #[tokio::test]
    async fn test_add_without_materializing_prefix() {
        let (gallery, _, blobs) = gallery(false).await;
        gallery.add_subfolder("x", "gallery1").await.unwrap();
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_empty_name() {
        let (gallery, _, blobs) = gallery(true).await;
        let result = gallery.add_subfolder("x", "").await;
        assert!(matches!(result, Err(RemberError::Invalid(_))));
        assert!(gallery.list_subfolders("x").await.unwrap().is_empty());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_add_to_unknown_code_fails() {
        let (gallery, _, blobs) = gallery(true).await;
        let result = gallery.add_subfolder("ghost", "gallery1").await;
        assert!(matches!(result, Err(RemberError::Store(_))));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_remove_by_index() {
        let (gallery, _, _) = gallery(false).await;
        gallery.add_subfolder("x", "first").await.unwrap();
        gallery.add_subfolder("x", "second").await.unwrap();

        gallery
            .remove_subfolders("x", &BTreeSet::from([0]))
            .await
            .unwrap();

        assert_eq!(gallery.list_subfolders("x").await.unwrap(), vec!["second"]);
    }

    #[tokio::test]
    async fn test_remove_ignores_out_of_range_indices() {
        let (gallery, _, _) = gallery(false).await;
        for name in ["a", "b", "c"] {
            gallery.add_subfolder("x", name).await.unwrap();
        }

        gallery
            .remove_subfolders("x", &BTreeSet::from([1, 7]))
            .await
            .unwrap();

        assert_eq!(gallery.list_subfolders("x").await.unwrap(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_list_defaults_to_empty() {
        let (gallery, documents, _) = gallery(false).await;
        assert!(gallery.list_subfolders("ghost").await.unwrap().is_empty());

        let document: Document = json!({"password": "p"}).as_object().cloned().unwrap();
        documents.set("folder_nofield", document).await.unwrap();
        assert!(gallery.list_subfolders("nofield").await.unwrap().is_empty());

        let document: Document = json!({"subFolders": ["a", 3, null, "b"]})
            .as_object()
            .cloned()
            .unwrap();
        documents.set("folder_mixed", document).await.unwrap();
        assert_eq!(gallery.list_subfolders("mixed").await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let (gallery, _, _) = gallery(false).await;
        let gallery = Arc::new(gallery);

        let mut handles = Vec::new();
        for i in 0..10 {
            let gallery = gallery.clone();
            handles.push(tokio::spawn(async move {
                gallery.add_subfolder("x", &format!("g{}", i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(gallery.list_subfolders("x").await.unwrap().len(), 10);
    }
}
