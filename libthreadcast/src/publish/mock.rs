//! Mock publisher for testing
//!
//! Available in all builds so integration tests can script publish outcomes
//! call by call and inspect exactly what would have gone out.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{PublishError, Result};
use crate::types::PublishedPost;

/// A single captured publish call.
#[derive(Debug, Clone)]
pub struct CapturedPost {
    pub text: String,
    pub in_reply_to: Option<String>,
}

pub struct MockPublisher {
    /// 1-based call numbers that fail, and with which error
    failures: Mutex<std::collections::HashMap<usize, PublishError>>,
    /// Call numbers that fail on every attempt (not just once)
    permanent: HashSet<usize>,
    calls: AtomicUsize,
    published: Mutex<Vec<CapturedPost>>,
}

impl MockPublisher {
    /// Publisher where every call succeeds.
    pub fn succeeding() -> Self {
        Self {
            failures: Mutex::new(std::collections::HashMap::new()),
            permanent: HashSet::new(),
            calls: AtomicUsize::new(0),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Publisher where the given 1-based call numbers fail with `error`.
    /// Each scripted failure fires once; a retry of the same segment is a
    /// fresh call number.
    pub fn failing_calls(calls: &[usize], error: PublishError) -> Self {
        let mut publisher = Self::succeeding();
        let mut failures = std::collections::HashMap::new();
        for &n in calls {
            failures.insert(n, error.clone());
        }
        publisher.failures = Mutex::new(failures);
        publisher
    }

    /// Publisher where every attempt at the given call numbers and beyond
    /// within that segment fails; used with `failing_calls` semantics but
    /// the numbered calls are marked permanent.
    pub fn failing_calls_permanently(calls: &[usize], error: PublishError) -> Self {
        let mut publisher = Self::failing_calls(calls, error);
        publisher.permanent = calls.iter().copied().collect();
        publisher
    }

    /// Publisher that always fails with an authentication error.
    pub fn auth_failing() -> Self {
        let mut publisher = Self::succeeding();
        publisher.permanent = (1..=64).collect();
        let mut failures = std::collections::HashMap::new();
        for n in 1..=64 {
            failures.insert(
                n,
                PublishError::Authentication("invalid credentials".to_string()),
            );
        }
        publisher.failures = Mutex::new(failures);
        publisher
    }

    /// Every successfully published post, in call order.
    pub fn published(&self) -> Vec<CapturedPost> {
        self.published.lock().unwrap().clone()
    }

    /// Total publish calls made, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl crate::publish::Publisher for MockPublisher {
    async fn publish(&self, text: &str, in_reply_to: Option<&str>) -> Result<PublishedPost> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let scripted = {
            let mut failures = self.failures.lock().unwrap();
            if self.permanent.contains(&call) {
                failures.get(&call).cloned()
            } else {
                failures.remove(&call)
            }
        };
        if let Some(error) = scripted {
            return Err(error.into());
        }

        self.published.lock().unwrap().push(CapturedPost {
            text: text.to_string(),
            in_reply_to: in_reply_to.map(|s| s.to_string()),
        });

        Ok(PublishedPost {
            remote_id: format!("mock-{}", call),
            in_reply_to_id: in_reply_to.map(|s| s.to_string()),
            published_at: chrono::Utc::now().timestamp(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
