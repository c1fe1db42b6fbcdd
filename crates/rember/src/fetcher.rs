//! Gallery listing with concurrent address resolution
//!
//! After one listing call, every JPEG's address is resolved on its own task.
//! The call returns once all tasks have finished; failed resolutions are
//! logged and skipped. Dropping the returned future aborts the tasks still
//! in flight.

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{RemberError, Result};
use crate::model::{Address, BlobRef, subfolder_prefix};
use crate::storage::BlobStore;

pub struct AssetFetcher {
    blobs: Arc<dyn BlobStore>,
}

impl AssetFetcher {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Addresses of every `.jpg` under `<code>/<subfolder>`, ordered by path
    ///
    /// Fails only when the listing itself fails. An empty `subfolder` is
    /// rejected, since its prefix would cover every sub-folder of the code.
    pub async fn list_images(&self, code: &str, subfolder: &str) -> Result<Vec<Address>> {
        if subfolder.is_empty() {
            return Err(RemberError::invalid("Sub-folder name cannot be empty"));
        }

        let prefix = subfolder_prefix(code, subfolder);
        let listed = self.blobs.list(&prefix).await?;

        let images: Vec<BlobRef> = listed.into_iter().filter(BlobRef::is_jpeg).collect();
        debug!(prefix = %prefix, count = images.len(), "resolving image addresses");

        let mut resolved = self.resolve_all(images).await;
        resolved.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

        Ok(resolved.into_iter().map(|(_, address)| address).collect())
    }

    /// Fan out one resolution per blob and wait for every one of them
    async fn resolve_all(&self, images: Vec<BlobRef>) -> Vec<(BlobRef, Address)> {
        let mut tasks = JoinSet::new();
        for blob in images {
            let blobs = Arc::clone(&self.blobs);
            tasks.spawn(async move {
                let result = blobs.resolve_address(&blob).await;
                (blob, result)
            });
        }

        let mut resolved = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((blob, Ok(address))) => resolved.push((blob, address)),
                Ok((blob, Err(e))) => {
                    warn!(path = %blob.path, error = %e, "skipping image, address resolution failed");
                }
                Err(e) => {
                    warn!(error = %e, "skipping image, resolution task failed");
                }
            }
        }
        resolved
    }
}
