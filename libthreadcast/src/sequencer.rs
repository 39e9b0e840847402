//! Publish sequencer
//!
//! Publishes the segments of one thread in order, chaining each post as a
//! reply to the previous successful one. Transient platform failures are
//! retried with exponential backoff; a segment that still fails is skipped
//! and the thread continues, so one flaky call does not abandon the rest of
//! the content. The sequencer reports per-segment outcomes instead of
//! failing the whole thread.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{PublishError, Result, ThreadcastError};
use crate::publish::Publisher;
use crate::types::{PublishedPost, Segment};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// What happened to one segment.
#[derive(Debug)]
pub enum SegmentOutcome {
    Published(PublishedPost),
    Skipped {
        index: usize,
        error: ThreadcastError,
    },
}

/// Result of publishing one thread.
#[derive(Debug)]
pub struct ThreadReceipt {
    /// The first successfully published post, used for schedule state.
    pub first: Option<PublishedPost>,
    pub outcomes: Vec<SegmentOutcome>,
}

impl ThreadReceipt {
    pub fn published_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SegmentOutcome::Published(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.published_count()
    }
}

fn is_transient_error(error: &ThreadcastError) -> bool {
    matches!(
        error,
        ThreadcastError::Publish(PublishError::Network(_) | PublishError::RateLimit(_))
    )
}

/// Publish one segment, retrying transient failures with exponential
/// backoff (1s, 2s). Non-transient failures return immediately.
pub async fn publish_with_retry(
    publisher: &dyn Publisher,
    text: &str,
    in_reply_to: Option<&str>,
) -> Result<PublishedPost> {
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        match publisher.publish(text, in_reply_to).await {
            Ok(post) => return Ok(post),
            Err(e) if is_transient_error(&e) && attempt < MAX_ATTEMPTS => {
                debug!(
                    "Publish attempt {}/{} on {} failed ({}), retrying in {:?}",
                    attempt,
                    MAX_ATTEMPTS,
                    publisher.name(),
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!("retry loop returns on the final attempt")
}

/// Publish a thread's segments in order.
///
/// Each post replies to the previous successful one, so when a middle
/// segment is skipped the next segment chains to the last post that made it
/// out. Ordering is strict: segment N+1 is never attempted before segment
/// N's outcome is decided.
pub async fn publish_thread(publisher: &dyn Publisher, segments: &[Segment]) -> ThreadReceipt {
    let mut outcomes = Vec::with_capacity(segments.len());
    let mut first: Option<PublishedPost> = None;
    let mut previous_id: Option<String> = None;

    for segment in segments {
        match publish_with_retry(publisher, &segment.text, previous_id.as_deref()).await {
            Ok(post) => {
                previous_id = Some(post.remote_id.clone());
                if first.is_none() {
                    first = Some(post.clone());
                }
                outcomes.push(SegmentOutcome::Published(post));
            }
            Err(e) => {
                warn!(
                    "Skipping segment {} after failed publish on {}: {}",
                    segment.index,
                    publisher.name(),
                    e
                );
                outcomes.push(SegmentOutcome::Skipped {
                    index: segment.index,
                    error: e,
                });
            }
        }
    }

    ThreadReceipt { first, outcomes }
}
