//! Code registration
//!
//! A code is claimed by writing its document to the document store. The
//! local record is only created once that write has been acknowledged, so a
//! failed remote write never leaves this device believing it owns a code.

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{RemberError, Result};
use crate::locks::KeyedLocks;
use crate::model::{Code, Document, PASSWORD_FIELD, SUBFOLDERS_FIELD, document_key};
use crate::storage::{DocumentStore, LocalCodeStore};

pub struct Registrar {
    documents: Arc<dyn DocumentStore>,
    local: Arc<dyn LocalCodeStore>,
    locks: Arc<KeyedLocks>,
}

impl Registrar {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        local: Arc<dyn LocalCodeStore>,
        locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            documents,
            local,
            locks,
        }
    }

    /// Claim `code` with `password`
    ///
    /// Fails with [`RemberError::Invalid`] on empty input (before touching any
    /// store) and with [`RemberError::AlreadyExists`] when the code's document
    /// is already present.
    pub async fn register(&self, code: &str, password: &str) -> Result<Code> {
        if code.is_empty() || password.is_empty() {
            return Err(RemberError::invalid(
                "Please, fill all text fields and try again.",
            ));
        }

        let key = document_key(code);
        let _guard = self.locks.lock(&key).await;

        debug!(key = %key, "checking whether code exists");
        if self.documents.get(&key).await?.is_some() {
            return Err(RemberError::AlreadyExists(code.to_string()));
        }

        self.documents.set(&key, new_document(password)).await?;

        let record = Code::new(code);
        self.local.create_record(record.id, &record.name).await?;

        info!(code = %record.name, id = %record.id, "registered code");
        Ok(record)
    }
}

fn new_document(password: &str) -> Document {
    let mut document = Document::new();
    document.insert(PASSWORD_FIELD.to_string(), Value::String(password.to_string()));
    document.insert(SUBFOLDERS_FIELD.to_string(), json!([]));
    document
}
