//! Database operations for Threadcast
//!
//! One sqlite file holds both the source feed (`source_items`, written by the
//! upstream analysis process) and the key-value cache (`kv_cache`) used by the
//! dedup ledger and schedule state.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::cache::Cache;
use crate::error::Result;
use crate::feed::SourceFeed;
use crate::types::SourceItem;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::CacheError::IoError)?;
        }

        // Use forward slashes for SQLite URL (works on both Windows and Unix)
        // Use mode=rwc to allow creating the database file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(crate::error::CacheError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::CacheError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Insert a source item into a room's feed
    pub async fn insert_source_item(&self, room: &str, item: &SourceItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO source_items (id, room, text, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(room)
        .bind(&item.text)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::CacheError::SqlxError)?;

        Ok(())
    }
}

#[async_trait]
impl SourceFeed for Database {
    async fn list_items(&self, room: &str) -> Result<Vec<SourceItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, text, created_at
            FROM source_items
            WHERE room = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(room)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::CacheError::SqlxError)?;

        Ok(rows
            .into_iter()
            .map(|r| SourceItem {
                id: r.get("id"),
                text: r.get("text"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}

#[async_trait]
impl Cache for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value FROM kv_cache WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::CacheError::SqlxError)?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_cache (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(crate::error::CacheError::SqlxError)?;

        Ok(())
    }
}
