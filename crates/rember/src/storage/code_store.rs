//! Local record of registered codes
//!
//! Only remembers that this device already registered a code. It is never
//! authoritative; the document store is.

use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Code;

#[async_trait]
pub trait LocalCodeStore: Send + Sync {
    /// Whether any code has been recorded on this device
    async fn has_any_record(&self) -> Result<bool, StoreError>;

    /// Remember a registered code
    async fn create_record(&self, id: Uuid, name: &str) -> Result<(), StoreError>;

    /// The first recorded code, if any
    async fn first_record(&self) -> Result<Option<Code>, StoreError>;
}

/// In-memory local code store for testing
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    records: Mutex<Vec<Code>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded codes in insertion order (useful for testing)
    pub fn records(&self) -> Vec<Code> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LocalCodeStore for MemoryCodeStore {
    async fn has_any_record(&self) -> Result<bool, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))?;
        Ok(!records.is_empty())
    }

    async fn create_record(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))?;
        records.push(Code {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn first_record(&self) -> Result<Option<Code>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StoreError::Backend("Lock poisoned".into()))?;
        Ok(records.first().cloned())
    }
}
