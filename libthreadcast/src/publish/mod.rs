//! Publishing platform abstraction

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PublishedPost;

pub mod mock;

pub use mock::MockPublisher;

/// A platform that can publish one post, optionally as a reply.
///
/// Implementations map their transport failures onto the `PublishError`
/// taxonomy; `Network` and `RateLimit` are treated as transient by the
/// sequencer's retry loop, `Authentication` and `Rejected` are not.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `text`, replying to `in_reply_to` when given. Returns the
    /// platform-assigned post on success.
    async fn publish(&self, text: &str, in_reply_to: Option<&str>) -> Result<PublishedPost>;

    /// Platform name for logs
    fn name(&self) -> &str;
}
