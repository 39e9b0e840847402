//! Dedup ledger
//!
//! Tracks which source items have already been published, as a JSON array of
//! item ids stored in the cache under `{account}/published`. Items are only
//! ever appended; nothing here deletes or rewrites source items. A corrupt
//! cache entry is logged and treated as empty so one bad write cannot wedge
//! the daemon (the worst case is a repeated publish, consistent with
//! at-least-once delivery).

use std::sync::Arc;
use tracing::warn;

use crate::cache::Cache;
use crate::error::Result;

pub struct DedupLedger {
    cache: Arc<dyn Cache>,
    key: String,
}

impl DedupLedger {
    pub fn new(cache: Arc<dyn Cache>, account: &str) -> Self {
        Self {
            cache,
            key: format!("{}/published", account),
        }
    }

    /// Has this item already been published?
    pub async fn is_published(&self, item_id: &str) -> Result<bool> {
        let ids = self.load_ids().await?;
        Ok(ids.iter().any(|id| id == item_id))
    }

    /// Record an item as published. Appends at most once; re-marking an
    /// already-present id is a no-op.
    pub async fn mark_published(&self, item_id: &str) -> Result<()> {
        let mut ids = self.load_ids().await?;
        if ids.iter().any(|id| id == item_id) {
            return Ok(());
        }
        ids.push(item_id.to_string());

        let serialized = serde_json::to_string(&ids).map_err(|e| {
            crate::error::CacheError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        self.cache.set(&self.key, &serialized).await
    }

    async fn load_ids(&self) -> Result<Vec<String>> {
        let raw = match self.cache.get(&self.key).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                warn!(
                    "Corrupt published ledger under {:?} ({}), treating as empty",
                    self.key, e
                );
                Ok(Vec::new())
            }
        }
    }
}
