//! Login against an existing code
//!
//! Passwords are stored and compared in plaintext, exactly as the document
//! holds them.

use std::sync::Arc;
use tracing::debug;

use crate::error::{RemberError, Result};
use crate::model::{PASSWORD_FIELD, document_key};
use crate::storage::DocumentStore;

pub struct Authenticator {
    documents: Arc<dyn DocumentStore>,
}

impl Authenticator {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    pub async fn login(&self, code: &str, password: &str) -> Result<()> {
        let key = document_key(code);
        debug!(key = %key, "looking up code");

        let document = self
            .documents
            .get(&key)
            .await?
            .ok_or_else(|| RemberError::NotFound(code.to_string()))?;

        // A document without a password only matches the empty input
        let stored = document
            .get(PASSWORD_FIELD)
            .and_then(|value| value.as_str())
            .unwrap_or_default();

        if stored == password {
            Ok(())
        } else {
            Err(RemberError::WrongPassword)
        }
    }
}
