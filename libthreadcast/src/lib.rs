//! Threadcast - publish generated analysis as well-formed social threads
//!
//! This library turns raw generated text into sanitized, length-bounded
//! thread segments and publishes them on a jittered schedule with
//! at-least-once dedup tracking. Platform transports, text generation, and
//! storage sit behind traits so hosts can wire in their own collaborators.

pub mod cache;
pub mod compose;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod logging;
pub mod publish;
pub mod sanitize;
pub mod scheduler;
pub mod sequencer;
pub mod splitter;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use cache::{Cache, MemoryCache};
pub use config::Config;
pub use db::Database;
pub use error::{Result, ThreadcastError};
pub use feed::{MemoryFeed, SourceFeed};
pub use publish::{MockPublisher, Publisher};
pub use scheduler::PostScheduler;
pub use types::{PublishedPost, Segment, SourceItem};
