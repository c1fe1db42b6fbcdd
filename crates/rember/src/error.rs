//! Error types for rember

use thiserror::Error;

/// Errors raised by the document, blob and local code stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid key format: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Workflow errors surfaced to callers
#[derive(Debug, Error)]
pub enum RemberError {
    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Code already exists: {0}")]
    AlreadyExists(String),

    #[error("Code does not exist: {0}")]
    NotFound(String),

    #[error("Incorrect password")]
    WrongPassword,

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RemberError {
    pub fn invalid(msg: &str) -> Self {
        Self::Invalid(msg.to_string())
    }

    /// True when the caller may fall back to logging in instead of registering
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Result type for rember operations
pub type Result<T> = std::result::Result<T, RemberError>;
