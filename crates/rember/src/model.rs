//! Domain types shared by the workflow components

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Field holding the plaintext password on a code document
pub const PASSWORD_FIELD: &str = "password";

/// Field holding the ordered sub-folder names on a code document
pub const SUBFOLDERS_FIELD: &str = "subFolders";

/// Blob written to make an otherwise empty sub-folder prefix visible
pub const PLACEHOLDER_NAME: &str = "placeholder.txt";

/// Suffix of uploaded images
pub const JPEG_SUFFIX: &str = ".jpg";

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// A document in the document store: a flat JSON object
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A user's workspace, remembered locally once registration succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub id: Uuid,
    pub name: String,
}

impl Code {
    /// Create a code record with a fresh identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn document_key(&self) -> String {
        document_key(&self.name)
    }
}

/// Document store key for a code name
/// Example: "family" -> "folder_family"
pub fn document_key(code: &str) -> String {
    format!("folder_{}", code)
}

/// Blob prefix holding the images of one sub-folder
/// Example: "family/holidays"
pub fn subfolder_prefix(code: &str, subfolder: &str) -> String {
    format!("{}/{}", code, subfolder)
}

/// Blob path for a file inside a sub-folder
pub fn blob_path(code: &str, subfolder: &str, filename: &str) -> String {
    format!("{}/{}/{}", code, subfolder, filename)
}

/// Fresh filename for an uploaded image, `<uuid>.jpg`
pub fn image_filename() -> String {
    format!("{}{}", Uuid::new_v4(), JPEG_SUFFIX)
}

/// A retrievable address for a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reference to a blob returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobRef {
    /// Full hierarchical path of the blob
    pub path: String,
}

impl BlobRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn is_jpeg(&self) -> bool {
        self.name().ends_with(JPEG_SUFFIX)
    }
}

/// Advisory upload telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        Self {
            bytes_sent,
            total_bytes,
        }
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_sent >= self.total_bytes
    }
}
