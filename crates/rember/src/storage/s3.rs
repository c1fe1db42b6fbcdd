//! S3-compatible blob store using the MinIO client
//!
//! Works with AWS S3, MinIO, and any S3-compatible object storage. Object
//! addresses are plain URLs under a public base URL, so the bucket (or a CDN
//! in front of it) must allow reads of the gallery prefixes.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use minio::s3::{
    client::Client,
    creds::StaticProvider,
    error::{Error as MinioError, ErrorCode},
    http::BaseUrl,
    types::{S3Api, ToStream},
};
use std::str::FromStr;
use tracing::debug;

use super::BlobStore;
use crate::error::StoreError;
use crate::model::{Address, BlobRef};

/// S3-compatible blob store
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3BlobStore {
    /// Create a new S3 blob store
    ///
    /// `public_url` is the base that object addresses are built from,
    /// e.g. `https://minio.example.com`.
    pub fn new(client: Client, bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create S3 blob store from environment variables
    ///
    /// Expects:
    /// - S3_ACCESS_KEY_ID
    /// - S3_SECRET_ACCESS_KEY
    /// - S3_ENDPOINT_URL (for S3-compatible services like MinIO)
    /// - S3_BUCKET
    /// - S3_PUBLIC_URL (optional, defaults to S3_ENDPOINT_URL)
    pub fn from_env() -> Result<Self, StoreError> {
        let bucket = std::env::var("S3_BUCKET").map_err(|_| {
            StoreError::Backend("S3_BUCKET environment variable not set".to_string())
        })?;

        let access_key = std::env::var("S3_ACCESS_KEY_ID").map_err(|_| {
            StoreError::Backend("S3_ACCESS_KEY_ID environment variable not set".to_string())
        })?;

        let secret_key = std::env::var("S3_SECRET_ACCESS_KEY").map_err(|_| {
            StoreError::Backend("S3_SECRET_ACCESS_KEY environment variable not set".to_string())
        })?;

        let endpoint_url = std::env::var("S3_ENDPOINT_URL").map_err(|_| {
            StoreError::Backend("S3_ENDPOINT_URL environment variable not set".to_string())
        })?;

        let public_url = std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| endpoint_url.clone());

        let base_url = BaseUrl::from_str(&endpoint_url)
            .map_err(|e| StoreError::Backend(format!("Invalid S3_ENDPOINT_URL: {}", e)))?;

        let creds_provider = StaticProvider::new(&access_key, &secret_key, None);

        let client = Client::new(base_url, Some(Box::new(creds_provider)), None, None)
            .map_err(|e| StoreError::Backend(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self::new(client, bucket, public_url))
    }

    /// Ensure bucket exists (create if it doesn't)
    pub async fn ensure_bucket(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .bucket_exists(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StoreError::Backend(format!("Failed to check bucket '{}': {}", self.bucket, e))
            })?;

        if response.exists {
            return Ok(());
        }

        self.client
            .create_bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                StoreError::Backend(format!("Failed to create bucket '{}': {}", self.bucket, e))
            })?;

        Ok(())
    }

    /// Validate S3 key format
    fn validate_key(&self, key: &str) -> Result<(), StoreError> {
        if key.is_empty() || key.len() > 1024 {
            return Err(StoreError::InvalidKey(
                "Key must be between 1 and 1024 characters".into(),
            ));
        }

        if key.starts_with('/') || key.ends_with('/') {
            return Err(StoreError::InvalidKey(
                "Key cannot start or end with '/'".into(),
            ));
        }

        Ok(())
    }

    /// Public URL of an object, each path segment percent-encoded
    fn object_url(&self, key: &str) -> Address {
        let encoded = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Address::new(format!("{}/{}/{}", self.public_url, self.bucket, encoded))
    }

    fn is_not_found(error: &MinioError) -> bool {
        matches!(error, MinioError::S3Error(response) if is_missing_object(&response.code))
    }
}

/// Whether an S3 error code means the object does not exist
fn is_missing_object(code: &ErrorCode) -> bool {
    matches!(code, ErrorCode::NoSuchKey)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<Address, StoreError> {
        self.validate_key(path)?;
        debug!(bucket = %self.bucket, path, bytes = data.len(), "putting object");

        self.client
            .put_object_content(&self.bucket, path, Bytes::from(data))
            .content_type(content_type.to_string())
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to put file '{}': {}", path, e)))?;

        Ok(self.object_url(path))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobRef>, StoreError> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        let mut blobs = Vec::new();
        let mut stream = self
            .client
            .list_objects(&self.bucket)
            .prefix(Some(prefix.clone()))
            .recursive(true)
            .to_stream()
            .await;

        while let Some(result) = stream.next().await {
            let response = result.map_err(|e| {
                StoreError::Backend(format!(
                    "Failed to list files with prefix '{}': {}",
                    prefix, e
                ))
            })?;
            blobs.extend(response.contents.into_iter().map(|entry| BlobRef::new(entry.name)));
        }

        Ok(blobs)
    }

    async fn resolve_address(&self, blob: &BlobRef) -> Result<Address, StoreError> {
        self.validate_key(&blob.path)?;

        self.client
            .stat_object(&self.bucket, &blob.path)
            .send()
            .await
            .map_err(|e| {
                if Self::is_not_found(&e) {
                    StoreError::NotFound(blob.path.clone())
                } else {
                    StoreError::Backend(format!("Failed to stat file '{}': {}", blob.path, e))
                }
            })?;

        Ok(self.object_url(&blob.path))
    }
}
