//! Image upload into a sub-folder

use image::codecs::jpeg::JpegEncoder;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{RemberError, Result};
use crate::model::{Address, JPEG_CONTENT_TYPE, UploadProgress, blob_path, image_filename};
use crate::storage::BlobStore;

pub struct AssetUploader {
    blobs: Arc<dyn BlobStore>,
    jpeg_quality: u8,
}

impl AssetUploader {
    pub fn new(blobs: Arc<dyn BlobStore>, jpeg_quality: u8) -> Self {
        Self {
            blobs,
            jpeg_quality,
        }
    }

    /// Re-encode `image` as JPEG and store it as `<code>/<subfolder>/<uuid>.jpg`
    pub async fn upload(&self, code: &str, subfolder: &str, image: &[u8]) -> Result<Address> {
        let (progress, _) = watch::channel(UploadProgress::default());
        self.upload_with_progress(code, subfolder, image, &progress)
            .await
    }

    /// Same as [`upload`](Self::upload), publishing advisory progress
    ///
    /// Progress is reported before the write starts and once the store has
    /// acknowledged it. Receivers going away does not affect the upload.
    pub async fn upload_with_progress(
        &self,
        code: &str,
        subfolder: &str,
        image: &[u8],
        progress: &watch::Sender<UploadProgress>,
    ) -> Result<Address> {
        if subfolder.is_empty() {
            return Err(RemberError::invalid("Sub-folder name cannot be empty"));
        }

        let jpeg = encode_jpeg(image, self.jpeg_quality)?;
        let total = jpeg.len() as u64;
        let path = blob_path(code, subfolder, &image_filename());

        progress.send_replace(UploadProgress::new(0, total));
        debug!(path = %path, bytes = total, "uploading image");

        let address = self.blobs.put(&path, jpeg, JPEG_CONTENT_TYPE).await?;

        progress.send_replace(UploadProgress::new(total, total));
        info!(path = %path, address = %address, "uploaded image");
        Ok(address)
    }
}

/// Decode any supported image format and re-encode it as JPEG
pub fn encode_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| RemberError::Encode(e.to_string()))?;
    let rgb = decoded.to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode_image(&rgb)
        .map_err(|e| RemberError::Encode(e.to_string()))?;

    Ok(encoded)
}
