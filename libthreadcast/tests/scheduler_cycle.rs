//! Publishing-cycle behavior: dedup across cycles, dry-run isolation, and
//! schedule-state bookkeeping, all against in-memory collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use libthreadcast::cache::Cache;
use libthreadcast::compose::MockGenerator;
use libthreadcast::config::{PostingConfig, SegmentConfig};
use libthreadcast::error::PublishError;
use libthreadcast::scheduler::PostScheduler;
use libthreadcast::types::LastPostRecord;
use libthreadcast::{MemoryCache, MemoryFeed, MockPublisher, Result, SourceFeed, SourceItem};

const ACCOUNT: &str = "default";
const ROOM: &str = "analysis";

struct Harness {
    feed: Arc<MemoryFeed>,
    cache: Arc<MemoryCache>,
    publisher: Arc<MockPublisher>,
}

impl Harness {
    fn new() -> Self {
        Self {
            feed: Arc::new(MemoryFeed::new()),
            cache: Arc::new(MemoryCache::new()),
            publisher: Arc::new(MockPublisher::succeeding()),
        }
    }

    fn scheduler(&self, posting: PostingConfig) -> PostScheduler {
        PostScheduler::new(
            self.feed.clone(),
            self.cache.clone(),
            self.publisher.clone(),
            None,
            ACCOUNT,
            ROOM,
            posting,
            SegmentConfig::default(),
            Arc::new(AtomicBool::new(false)),
        )
    }

    async fn published_ids(&self) -> Vec<String> {
        match self.cache.get("default/published").await.unwrap() {
            Some(raw) => serde_json::from_str(&raw).unwrap(),
            None => Vec::new(),
        }
    }

    async fn last_post(&self) -> Option<LastPostRecord> {
        self.cache
            .get("default/last_post")
            .await
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

/// Feed that counts how often it is listed; always empty.
struct CountingFeed {
    polls: AtomicUsize,
}

impl CountingFeed {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            polls: AtomicUsize::new(0),
        })
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceFeed for CountingFeed {
    async fn list_items(&self, _room: &str) -> Result<Vec<SourceItem>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

#[tokio::test(start_paused = true)]
async fn run_triggers_immediately_when_overdue() {
    let feed = CountingFeed::new();
    let cache = Arc::new(MemoryCache::new());

    // Last post 200 minutes ago against a 90-180 minute window: the first
    // gate evaluation fires a cycle without waiting.
    let stale = chrono::Utc::now().timestamp() - 200 * 60;
    cache
        .set(
            "default/last_post",
            &serde_json::to_string(&LastPostRecord {
                id: "old".to_string(),
                timestamp: stale,
            })
            .unwrap(),
        )
        .await
        .unwrap();

    let shutdown = Arc::new(AtomicBool::new(false));
    let scheduler = PostScheduler::new(
        feed.clone(),
        cache,
        Arc::new(MockPublisher::succeeding()),
        None,
        ACCOUNT,
        ROOM,
        PostingConfig::default(),
        SegmentConfig::default(),
        shutdown.clone(),
    );

    let handle = tokio::spawn(async move { scheduler.run().await });
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(
        feed.polls(),
        1,
        "overdue state should trigger exactly one immediate cycle"
    );

    shutdown.store(true, Ordering::SeqCst);
    handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn run_rearms_after_cycle_with_nothing_to_publish() {
    let feed = CountingFeed::new();
    let shutdown = Arc::new(AtomicBool::new(false));
    let scheduler = PostScheduler::new(
        feed.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(MockPublisher::succeeding()),
        None,
        ACCOUNT,
        ROOM,
        PostingConfig {
            interval_min_minutes: 5,
            interval_max_minutes: 5,
            ..PostingConfig::default()
        },
        SegmentConfig::default(),
        shutdown.clone(),
    );

    let handle = tokio::spawn(async move { scheduler.run().await });

    // 26 minutes against a fixed 5-minute delay: one immediate cycle, then
    // one per rearm at 5, 10, 15, 20, and 25 minutes. A loop that re-fires
    // whenever nothing was published would poll the feed without bound.
    tokio::time::sleep(Duration::from_secs(26 * 60)).await;

    let polls = feed.polls();
    assert!(polls >= 2, "scheduler never rearmed: {} poll(s)", polls);
    assert!(
        polls <= 7,
        "scheduler re-fired without waiting: {} polls in 26 minutes",
        polls
    );

    shutdown.store(true, Ordering::SeqCst);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn cycle_publishes_and_marks_items() {
    let harness = Harness::new();
    let item = SourceItem::new("Markets closed mixed after a volatile session.".to_string());
    let item_id = item.id.clone();
    harness.feed.push(item);

    let scheduler = harness.scheduler(PostingConfig::default());
    let report = scheduler.run_cycle().await.unwrap();

    assert_eq!(report.items_seen, 1);
    assert_eq!(report.threads_published, 1);
    assert_eq!(harness.published_ids().await, vec![item_id]);
    assert!(harness.last_post().await.is_some());
    assert_eq!(harness.publisher.published().len(), 1);
}

#[tokio::test]
async fn second_cycle_skips_published_items() {
    let harness = Harness::new();
    harness
        .feed
        .push(SourceItem::new("One-off analysis item.".to_string()));

    let scheduler = harness.scheduler(PostingConfig::default());
    scheduler.run_cycle().await.unwrap();
    let report = scheduler.run_cycle().await.unwrap();

    assert_eq!(report.items_seen, 0);
    assert_eq!(harness.publisher.published().len(), 1);
}

#[tokio::test]
async fn cycle_processes_pending_items_in_order() {
    let harness = Harness::new();
    let mut older = SourceItem::new("Older pending item.".to_string());
    older.created_at = 100;
    let mut newer = SourceItem::new("Newer pending item.".to_string());
    newer.created_at = 200;
    harness.feed.push(newer);
    harness.feed.push(older);

    let scheduler = harness.scheduler(PostingConfig::default());
    let report = scheduler.run_cycle().await.unwrap();

    assert_eq!(report.threads_published, 2);
    let published = harness.publisher.published();
    assert_eq!(published[0].text, "Older pending item.");
    assert_eq!(published[1].text, "Newer pending item.");
}

#[tokio::test]
async fn dry_run_cycle_has_no_side_effects() {
    let harness = Harness::new();
    harness
        .feed
        .push(SourceItem::new("Would-be published item.".to_string()));

    let scheduler = harness.scheduler(PostingConfig {
        dry_run: true,
        ..PostingConfig::default()
    });
    let report = scheduler.run_cycle().await.unwrap();

    assert_eq!(report.threads_published, 1);
    assert_eq!(harness.publisher.call_count(), 0);
    assert!(harness.published_ids().await.is_empty());
    assert!(harness.last_post().await.is_none());

    // The item stays pending for a later real run.
    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.items_seen, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_thread_leaves_item_unmarked() {
    let harness = Harness::new();
    harness
        .feed
        .push(SourceItem::new("Item that fails to go out.".to_string()));

    // One short item means one segment, three failing attempts.
    let publisher = Arc::new(MockPublisher::failing_calls_permanently(
        &[1, 2, 3],
        PublishError::Network("timeout".to_string()),
    ));
    let scheduler = PostScheduler::new(
        harness.feed.clone(),
        harness.cache.clone(),
        publisher.clone(),
        None,
        ACCOUNT,
        ROOM,
        PostingConfig::default(),
        SegmentConfig::default(),
        Arc::new(AtomicBool::new(false)),
    );

    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.threads_published, 0);
    assert!(harness.published_ids().await.is_empty());
    assert!(harness.last_post().await.is_none());

    // Next cycle retries the same item; calls 4+ succeed.
    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.threads_published, 1);
    assert_eq!(harness.published_ids().await.len(), 1);
}

#[tokio::test]
async fn generation_failure_skips_item_until_next_cycle() {
    let harness = Harness::new();
    harness
        .feed
        .push(SourceItem::new("Item needing the generator.".to_string()));

    let generator = Arc::new(MockGenerator::with_responses(vec![
        "not json",
        r#"{"thread": ["Recovered thread part."]}"#,
    ]));
    let scheduler = PostScheduler::new(
        harness.feed.clone(),
        harness.cache.clone(),
        harness.publisher.clone(),
        Some(generator),
        ACCOUNT,
        ROOM,
        PostingConfig::default(),
        SegmentConfig::default(),
        Arc::new(AtomicBool::new(false)),
    );

    // First cycle: malformed response, item skipped, nothing marked.
    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.threads_published, 0);
    assert!(harness.published_ids().await.is_empty());

    // Second cycle: generator recovers, item goes out.
    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.threads_published, 1);
    assert_eq!(harness.publisher.published()[0].text, "Recovered thread part.");
}

#[tokio::test]
async fn empty_after_sanitizing_is_consumed_without_publishing() {
    let harness = Harness::new();
    harness.feed.push(SourceItem::new("** ** `` > ".to_string()));

    let scheduler = harness.scheduler(PostingConfig::default());
    scheduler.run_cycle().await.unwrap();

    assert_eq!(harness.publisher.call_count(), 0);
    // Marked consumed so it is not re-examined forever.
    assert_eq!(harness.published_ids().await.len(), 1);
}

#[tokio::test]
async fn last_post_timestamp_never_moves_backwards() {
    let harness = Harness::new();

    // Seed a last-post record far in the future relative to mock publishes.
    let future = chrono::Utc::now().timestamp() + 10_000;
    harness
        .cache
        .set(
            "default/last_post",
            &serde_json::to_string(&LastPostRecord {
                id: "seed".to_string(),
                timestamp: future,
            })
            .unwrap(),
        )
        .await
        .unwrap();

    harness
        .feed
        .push(SourceItem::new("Fresh analysis item.".to_string()));
    let scheduler = harness.scheduler(PostingConfig::default());
    scheduler.run_cycle().await.unwrap();

    let record = harness.last_post().await.unwrap();
    assert_eq!(record.timestamp, future);
    // The id still tracks the newest publish.
    assert_eq!(record.id, "mock-1");
}
