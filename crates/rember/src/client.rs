//! High-level interface over the whole workflow
//!
//! [`Rember`] wires the components to one set of stores and runs every
//! operation inside a cancellation scope. Cancelling the scope (or a parent
//! scope) makes pending and future operations return
//! [`RemberError::Cancelled`] and drops whatever they had in flight.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::authenticator::Authenticator;
use crate::config::RemberConfig;
use crate::error::{RemberError, Result};
use crate::fetcher::AssetFetcher;
use crate::gallery::GalleryIndex;
use crate::locks::KeyedLocks;
use crate::model::{Address, Code, UploadProgress};
use crate::registrar::Registrar;
use crate::storage::{BlobStore, DocumentStore, LocalCodeStore};
use crate::uploader::AssetUploader;

/// Outcome of [`Rember::register_or_login`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Registered(Code),
    LoggedIn,
}

#[derive(Clone)]
pub struct Rember {
    inner: Arc<Components>,
    local: Arc<dyn LocalCodeStore>,
    scope: CancellationToken,
}

struct Components {
    registrar: Registrar,
    authenticator: Authenticator,
    gallery: GalleryIndex,
    uploader: AssetUploader,
    fetcher: AssetFetcher,
}

impl Rember {
    /// Create a client over the given stores
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        local: Arc<dyn LocalCodeStore>,
        config: RemberConfig,
    ) -> Result<Self> {
        config.validate()?;

        // Registration and sub-folder edits of one code share a writer lock
        let locks = Arc::new(KeyedLocks::new());

        let inner = Components {
            registrar: Registrar::new(documents.clone(), local.clone(), locks.clone()),
            authenticator: Authenticator::new(documents.clone()),
            gallery: GalleryIndex::new(
                documents,
                blobs.clone(),
                locks,
                config.materialize_prefixes,
            ),
            uploader: AssetUploader::new(blobs.clone(), config.jpeg_quality),
            fetcher: AssetFetcher::new(blobs),
        };

        Ok(Self {
            inner: Arc::new(inner),
            local,
            scope: CancellationToken::new(),
        })
    }

    /// A client sharing these stores whose scope ends with this one's
    ///
    /// Cancelling the child leaves the parent usable.
    pub fn child_scope(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            local: self.local.clone(),
            scope: self.scope.child_token(),
        }
    }

    /// Stop delivering results for this scope and all child scopes
    pub fn cancel(&self) {
        self.scope.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }

    /// Whether this device has registered a code before
    pub async fn has_local_code(&self) -> Result<bool> {
        let local = self.local.clone();
        self.scoped(async move { local.has_any_record().await.map_err(RemberError::from) })
            .await
    }

    /// The code registered on this device, if any
    pub async fn local_code(&self) -> Result<Option<Code>> {
        let local = self.local.clone();
        self.scoped(async move { local.first_record().await.map_err(RemberError::from) })
            .await
    }

    pub async fn register(&self, code: &str, password: &str) -> Result<Code> {
        self.scoped(self.inner.registrar.register(code, password))
            .await
    }

    pub async fn login(&self, code: &str, password: &str) -> Result<()> {
        self.scoped(self.inner.authenticator.login(code, password))
            .await
    }

    /// Register `code`, or log in when it already exists
    pub async fn register_or_login(&self, code: &str, password: &str) -> Result<Entry> {
        match self.register(code, password).await {
            Ok(record) => Ok(Entry::Registered(record)),
            Err(e) if e.is_already_exists() => {
                self.login(code, password).await?;
                Ok(Entry::LoggedIn)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_subfolders(&self, code: &str) -> Result<Vec<String>> {
        self.scoped(self.inner.gallery.list_subfolders(code)).await
    }

    pub async fn add_subfolder(&self, code: &str, name: &str) -> Result<()> {
        self.scoped(self.inner.gallery.add_subfolder(code, name))
            .await
    }

    pub async fn remove_subfolders(&self, code: &str, indices: &BTreeSet<usize>) -> Result<()> {
        self.scoped(self.inner.gallery.remove_subfolders(code, indices))
            .await
    }

    pub async fn upload(&self, code: &str, subfolder: &str, image: &[u8]) -> Result<Address> {
        self.scoped(self.inner.uploader.upload(code, subfolder, image))
            .await
    }

    pub async fn upload_with_progress(
        &self,
        code: &str,
        subfolder: &str,
        image: &[u8],
        progress: &watch::Sender<UploadProgress>,
    ) -> Result<Address> {
        self.scoped(
            self.inner
                .uploader
                .upload_with_progress(code, subfolder, image, progress),
        )
        .await
    }

    pub async fn list_images(&self, code: &str, subfolder: &str) -> Result<Vec<Address>> {
        self.scoped(self.inner.fetcher.list_images(code, subfolder))
            .await
    }

    /// Run `operation` unless the scope is cancelled first
    async fn scoped<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        if self.scope.is_cancelled() {
            return Err(RemberError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(RemberError::Cancelled),
            result = operation => result,
        }
    }
}
