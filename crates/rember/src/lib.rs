//! # Rember
//!
//! Code-protected folders with JPEG galleries, kept in two managed backends:
//! - a document store holding one document per code (password and the
//!   ordered list of sub-folders)
//! - a hierarchical blob store holding the images under
//!   `<code>/<subfolder>/<uuid>.jpg`
//!
//! ## Core Concepts
//!
//! - **Codes** are user-chosen names; the document `folder_<code>` existing
//!   is what makes a code taken
//! - **Sub-folders** are ordered names on the code's document, rewritten as
//!   a whole on every change
//! - **Galleries** are listed with one concurrent address resolution per
//!   image, joined before returning
//! - **Scopes** bound the lifetime of in-flight operations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rember::*;
//! use std::sync::Arc;
//!
//! # async fn example(photo: Vec<u8>) -> Result<()> {
//! let client = Rember::new(
//!     Arc::new(MemoryDocumentStore::new()),
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::new(MemoryCodeStore::new()),
//!     RemberConfig::default(),
//! )?;
//!
//! client.register_or_login("family", "secret").await?;
//! client.add_subfolder("family", "holidays").await?;
//! client.upload("family", "holidays", &photo).await?;
//!
//! for address in client.list_images("family", "holidays").await? {
//!     println!("{}", address);
//! }
//! # Ok(())
//! # }
//! ```

pub mod authenticator;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gallery;
pub mod locks;
pub mod model;
pub mod registrar;
pub mod storage;
pub mod uploader;

pub use authenticator::Authenticator;
pub use client::{Entry, Rember};
pub use config::RemberConfig;
pub use error::{RemberError, Result, StoreError};
pub use fetcher::AssetFetcher;
pub use gallery::GalleryIndex;
pub use model::{Address, BlobRef, Code, Document, UploadProgress};
pub use registrar::Registrar;
pub use storage::{
    BlobStore, DocumentStore, LocalCodeStore, MemoryBlobStore, MemoryCodeStore,
    MemoryDocumentStore,
};
pub use uploader::AssetUploader;

#[cfg(feature = "sqlite")]
pub use storage::sqlite::{SqliteCodeStore, SqliteDocumentStore};

#[cfg(feature = "s3")]
pub use storage::s3::S3BlobStore;

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
