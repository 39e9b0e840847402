//! Post scheduler
//!
//! Decides when publishing happens: a jittered interval loop gated on the
//! time since the last successful post. Each idle period draws a fresh
//! uniform delay from the configured window, so posting times do not fall
//! into a fixed rhythm. A cycle walks every pending source item in order;
//! errors inside a cycle are caught and logged, never fatal to the loop.

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::compose::{compose_thread, TextGenerator};
use crate::config::{PostingConfig, SegmentConfig};
use crate::error::{Result, ThreadcastError};
use crate::feed::SourceFeed;
use crate::ledger::DedupLedger;
use crate::publish::Publisher;
use crate::sanitize::sanitize;
use crate::sequencer::publish_thread;
use crate::state::ScheduleState;
use crate::types::LastPostRecord;

/// Counters from one publishing cycle, for logs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleReport {
    /// Pending items examined this cycle
    pub items_seen: usize,
    /// Items whose thread got at least one segment out (or would have, in
    /// dry-run mode)
    pub threads_published: usize,
}

pub struct PostScheduler {
    feed: Arc<dyn SourceFeed>,
    publisher: Arc<dyn Publisher>,
    generator: Option<Arc<dyn TextGenerator>>,
    ledger: DedupLedger,
    state: ScheduleState,
    room: String,
    posting: PostingConfig,
    segments: SegmentConfig,
    shutdown: Arc<AtomicBool>,
}

impl PostScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: Arc<dyn SourceFeed>,
        cache: Arc<dyn Cache>,
        publisher: Arc<dyn Publisher>,
        generator: Option<Arc<dyn TextGenerator>>,
        account: &str,
        room: &str,
        posting: PostingConfig,
        segments: SegmentConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            feed,
            publisher,
            generator,
            ledger: DedupLedger::new(cache.clone(), account),
            state: ScheduleState::new(cache, account),
            room: room.to_string(),
            posting,
            segments,
            shutdown,
        }
    }

    /// Run the scheduler loop until shutdown is requested.
    ///
    /// Never more than one cycle is in flight. Every pass through the loop
    /// sleeps before the next gate evaluation: after a triggered cycle the
    /// drawn delay is waited out in full, even when the cycle published
    /// nothing (empty feed, dry run, or persistent failures), so each
    /// trigger schedules exactly one future trigger and the loop never
    /// spins against the feed.
    pub async fn run(&self) -> Result<()> {
        if self.posting.post_immediately {
            info!("post_immediately set, running initial publishing pass");
            self.run_cycle_logged().await;
        }

        while !self.shutdown.load(Ordering::Relaxed) {
            let delay = self.draw_delay();
            debug!("Next publishing window in {} minutes", delay.as_secs() / 60);

            match self.elapsed_since_last_post().await {
                Err(e) => {
                    warn!("Could not read last-post record: {}", e);
                    sleep_checking_shutdown(Duration::from_secs(60), &self.shutdown).await;
                }
                Ok(elapsed) if elapsed >= delay => {
                    self.run_cycle_logged().await;
                    // Rearm unconditionally; the gate alone would re-fire
                    // immediately whenever the cycle recorded no new post.
                    sleep_checking_shutdown(delay, &self.shutdown).await;
                }
                Ok(elapsed) => {
                    sleep_checking_shutdown(delay - elapsed, &self.shutdown).await;
                }
            }
        }

        info!("Shutdown requested, stopping scheduler loop");
        Ok(())
    }

    /// Draw the idle delay uniformly from the configured window, inclusive
    /// on both ends.
    pub fn draw_delay(&self) -> Duration {
        let minutes = rand::thread_rng().gen_range(
            self.posting.interval_min_minutes..=self.posting.interval_max_minutes,
        );
        Duration::from_secs(minutes * 60)
    }

    /// Time since the last recorded publish. An absent record reports the
    /// maximum elapsed time so the first cycle triggers without waiting.
    async fn elapsed_since_last_post(&self) -> Result<Duration> {
        match self.state.last_post().await? {
            Some(record) => {
                let elapsed = chrono::Utc::now().timestamp() - record.timestamp;
                Ok(Duration::from_secs(elapsed.max(0) as u64))
            }
            None => Ok(Duration::MAX),
        }
    }

    async fn run_cycle_logged(&self) {
        match self.run_cycle().await {
            Ok(report) if report.items_seen > 0 => {
                info!(
                    "Publishing cycle done: {} of {} pending item(s) published",
                    report.threads_published, report.items_seen
                );
            }
            Ok(_) => debug!("Publishing cycle done: nothing pending"),
            Err(e) => warn!("Publishing cycle failed: {}", e),
        }
    }

    /// Run one publishing cycle over all pending source items.
    ///
    /// Items are processed strictly in order. Generation failures skip the
    /// item (retried next cycle); cache failures propagate and abort the
    /// cycle with nothing marked, so the next cycle retries from the same
    /// state. In dry-run mode segments are only logged and neither the
    /// ledger nor the last-post record is touched.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for item in self.feed.list_items(&self.room).await? {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested, finishing cycle early");
                break;
            }
            if self.ledger.is_published(&item.id).await? {
                continue;
            }
            report.items_seen += 1;

            let sanitized = sanitize(&item.text);
            if sanitized.is_empty() {
                warn!("Source item {} is empty after sanitizing, marking consumed", item.id);
                if !self.posting.dry_run {
                    self.ledger.mark_published(&item.id).await?;
                }
                continue;
            }

            let segments =
                match compose_thread(self.generator.as_deref(), &sanitized, &self.segments).await {
                    Ok(segments) => segments,
                    Err(e @ ThreadcastError::Generation(_)) => {
                        warn!("Skipping item {} this cycle: {}", item.id, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };

            if segments.is_empty() {
                warn!("Source item {} produced no segments, marking consumed", item.id);
                if !self.posting.dry_run {
                    self.ledger.mark_published(&item.id).await?;
                }
                continue;
            }

            if self.posting.dry_run {
                for segment in &segments {
                    info!(
                        "Dry run: would publish segment {}/{} of item {}: {:?}",
                        segment.index + 1,
                        segments.len(),
                        item.id,
                        segment.text
                    );
                }
                report.threads_published += 1;
                continue;
            }

            let receipt = publish_thread(self.publisher.as_ref(), &segments).await;
            match &receipt.first {
                Some(first) => {
                    self.state
                        .record(&LastPostRecord {
                            id: first.remote_id.clone(),
                            timestamp: first.published_at,
                        })
                        .await?;
                    self.ledger.mark_published(&item.id).await?;
                    info!(
                        "Published thread for item {} on {}: {} segment(s) out, {} skipped, first post {}",
                        item.id,
                        self.publisher.name(),
                        receipt.published_count(),
                        receipt.skipped_count(),
                        first.remote_id
                    );
                    report.threads_published += 1;
                }
                None => {
                    warn!(
                        "No segments published for item {}, will retry next cycle",
                        item.id
                    );
                }
            }
        }

        Ok(report)
    }
}

/// Sleep for `duration`, waking every second to honor shutdown.
async fn sleep_checking_shutdown(duration: Duration, shutdown: &AtomicBool) {
    let mut remaining = duration;
    while !remaining.is_zero() {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let tick = remaining.min(Duration::from_secs(1));
        sleep(tick).await;
        remaining -= tick;
    }
}
