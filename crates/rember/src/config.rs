//! Workflow configuration management

use crate::error::{RemberError, Result};
use serde::{Deserialize, Serialize};

/// Workflow configuration
///
/// Backend connection settings (database URL, S3 credentials) are read by the
/// backends themselves; this only covers how the workflow behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemberConfig {
    /// Document store collection holding the code documents
    pub collection: String,

    /// JPEG quality used when encoding uploads (1-100)
    pub jpeg_quality: u8,

    /// Write a placeholder blob when a sub-folder is created so the prefix
    /// shows up in stores without explicit directories
    pub materialize_prefixes: bool,
}

impl RemberConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            collection: std::env::var("REMBER_COLLECTION").unwrap_or_else(|_| "codes".to_string()),
            jpeg_quality: std::env::var("REMBER_JPEG_QUALITY")
                .unwrap_or_else(|_| "80".to_string())
                .parse()
                .map_err(|_| RemberError::Config("Invalid REMBER_JPEG_QUALITY value".to_string()))?,
            materialize_prefixes: std::env::var("REMBER_MATERIALIZE_PREFIXES")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(RemberError::Config("Collection name cannot be empty".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RemberError::Config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

impl Default for RemberConfig {
    fn default() -> Self {
        Self {
            collection: "codes".to_string(),
            jpeg_quality: 80,
            materialize_prefixes: true,
        }
    }
}
