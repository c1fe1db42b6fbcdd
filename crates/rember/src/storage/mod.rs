//! Storage collaborators of the workflow
//!
//! Every component receives its stores as injected trait objects, so the
//! in-memory implementations here can stand in for real backends in tests.

pub mod blob_store;
pub mod code_store;
pub mod document_store;

pub use blob_store::{BlobStore, MemoryBlobStore};
pub use code_store::{LocalCodeStore, MemoryCodeStore};
pub use document_store::{DocumentStore, MemoryDocumentStore};

// SQLite implementation
#[cfg(feature = "sqlite")]
pub mod sqlite;

// S3 implementation
#[cfg(feature = "s3")]
pub mod s3;
