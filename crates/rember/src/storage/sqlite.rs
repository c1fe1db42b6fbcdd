//! SQLite storage implementation
//!
//! Provides a document store and the local code store on top of a single
//! SQLite database file. Documents are kept as JSON text, one row per
//! `(collection, key)`.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::{DocumentStore, LocalCodeStore};
use crate::error::StoreError;
use crate::model::{Code, Document};

/// Open a pool, creating the database file when missing
async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StoreError::Backend(format!("Invalid database path: {}", e)))?
        .create_if_missing(true);

    SqlitePool::connect_with(options)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to connect to SQLite: {}", e)))
}

/// Default database location when `DATABASE_URL` is unset
fn database_url_from_env() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/rember.db".to_string())
}

/// SQLite-backed document store scoped to one collection
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteDocumentStore {
    /// Create a new document store for `collection` in the given database
    pub async fn new(database_url: &str, collection: impl Into<String>) -> Result<Self, StoreError> {
        let pool = connect(database_url).await?;
        Self::with_pool(pool, collection).await
    }

    /// Create a document store sharing an existing pool
    pub async fn with_pool(pool: SqlitePool, collection: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            collection: collection.into(),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create a document store from the DATABASE_URL environment variable
    ///
    /// Example: sqlite:./data/rember.db
    pub async fn from_env(collection: impl Into<String>) -> Result<Self, StoreError> {
        Self::new(&database_url_from_env(), collection).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,              -- JSON object
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to create documents table: {}", e)))?;

        Ok(())
    }

    async fn write(&self, key: &str, document: &Document) -> Result<(), StoreError> {
        let body = serde_json::to_string(document)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO documents (collection, key, body, updated_at)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(body)
        .bind(now_rfc3339()?)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to save document '{}': {}", key, e)))?;

        Ok(())
    }
}

fn now_rfc3339() -> Result<String, StoreError> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| StoreError::Backend(format!("Failed to format timestamp: {}", e)))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        debug!(collection = %self.collection, key, "fetching document");

        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND key = ?")
            .bind(&self.collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to get document '{}': {}", key, e)))?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        self.write(key, &fields).await
    }

    async fn update(&self, key: &str, fields: Document) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND key = ?")
            .bind(&self.collection)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to get document '{}': {}", key, e)))?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let body: String = row.get("body");
        let mut document: Document = serde_json::from_str(&body)?;
        document.extend(fields);

        sqlx::query("UPDATE documents SET body = ?, updated_at = ? WHERE collection = ? AND key = ?")
            .bind(serde_json::to_string(&document)?)
            .bind(now_rfc3339()?)
            .bind(&self.collection)
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                StoreError::Backend(format!("Failed to update document '{}': {}", key, e))
            })?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to commit update: {}", e)))?;

        Ok(())
    }
}

/// SQLite-backed record of codes registered on this device
#[derive(Debug, Clone)]
pub struct SqliteCodeStore {
    pool: SqlitePool,
}

impl SqliteCodeStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = connect(database_url).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(&database_url_from_env()).await
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS codes (
                id TEXT PRIMARY KEY,             -- UUID
                name TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("Failed to create codes table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl LocalCodeStore for SqliteCodeStore {
    async fn has_any_record(&self) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM codes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to count codes: {}", e)))?;

        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn create_record(&self, id: Uuid, name: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO codes (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(now_rfc3339()?)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to save code '{}': {}", name, e)))?;

        Ok(())
    }

    async fn first_record(&self) -> Result<Option<Code>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM codes ORDER BY created_at ASC, rowid ASC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to get code: {}", e)))?;

        match row {
            Some(row) => {
                let id: String = row.get("id");
                let id = Uuid::parse_str(&id)
                    .map_err(|e| StoreError::Backend(format!("Invalid code id '{}': {}", id, e)))?;
                Ok(Some(Code {
                    id,
                    name: row.get("name"),
                }))
            }
            None => Ok(None),
        }
    }
}
