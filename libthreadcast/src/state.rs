//! Schedule state
//!
//! Persists the most recent successful first-segment publish under
//! `{account}/last_post` so the interval scheduler survives restarts.
//! The stored timestamp is monotonic: recording an older publish never
//! moves it backwards.

use std::sync::Arc;
use tracing::warn;

use crate::cache::Cache;
use crate::error::Result;
use crate::types::LastPostRecord;

pub struct ScheduleState {
    cache: Arc<dyn Cache>,
    key: String,
}

impl ScheduleState {
    pub fn new(cache: Arc<dyn Cache>, account: &str) -> Self {
        Self {
            cache,
            key: format!("{}/last_post", account),
        }
    }

    /// The last recorded publish, if any. A corrupt entry is logged and
    /// treated as absent, which at worst triggers one early publish.
    pub async fn last_post(&self) -> Result<Option<LastPostRecord>> {
        let raw = match self.cache.get(&self.key).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match serde_json::from_str::<LastPostRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(
                    "Corrupt last-post record under {:?} ({}), treating as absent",
                    self.key, e
                );
                Ok(None)
            }
        }
    }

    /// Record a publish. The stored timestamp only moves forward; the id
    /// always reflects the given record.
    pub async fn record(&self, record: &LastPostRecord) -> Result<()> {
        let previous = self.last_post().await?.map(|r| r.timestamp).unwrap_or(0);
        let effective = LastPostRecord {
            id: record.id.clone(),
            timestamp: record.timestamp.max(previous),
        };

        let serialized = serde_json::to_string(&effective).map_err(|e| {
            crate::error::CacheError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e,
            ))
        })?;
        self.cache.set(&self.key, &serialized).await
    }
}
