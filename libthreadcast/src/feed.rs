//! Source feed abstraction
//!
//! Where pending analysis items come from. The daemon reads them from the
//! sqlite database; tests use [`MemoryFeed`]. The feed is read-only: items
//! are never deleted or mutated, consumption is tracked by the dedup ledger.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::Result;
use crate::types::SourceItem;

#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// List all items in `room`, oldest first.
    ///
    /// Returns every stored item; the caller filters out those already
    /// marked in the dedup ledger.
    async fn list_items(&self, room: &str) -> Result<Vec<SourceItem>>;
}

/// In-memory feed for tests.
#[derive(Default)]
pub struct MemoryFeed {
    items: Mutex<Vec<SourceItem>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<SourceItem>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn push(&self, item: SourceItem) {
        self.items.lock().unwrap().push(item);
    }
}

#[async_trait]
impl SourceFeed for MemoryFeed {
    async fn list_items(&self, _room: &str) -> Result<Vec<SourceItem>> {
        let mut items = self.items.lock().unwrap().clone();
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }
}
