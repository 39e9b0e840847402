//! Core types for Threadcast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of generated analysis text awaiting publication.
///
/// Source items are produced by the upstream analysis process and are
/// read-only to this crate; they are only ever marked as published through
/// the dedup ledger, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    pub id: String,
    pub text: String,
    pub created_at: i64,
}

impl SourceItem {
    pub fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// One ordered piece of a thread, derived deterministically from a source
/// item's sanitized text. Ephemeral: not persisted beyond the publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 0-based position within the thread
    pub index: usize,
    pub text: String,
    pub is_final: bool,
}

/// The result of successfully publishing one segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPost {
    /// Platform-assigned identifier
    pub remote_id: String,
    /// Remote id of the prior post in the same thread; absent for the first
    pub in_reply_to_id: Option<String>,
    pub published_at: i64,
}

/// Cached record of the most recent successful first-segment publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastPostRecord {
    pub id: String,
    pub timestamp: i64,
}
