//! Thread composition
//!
//! Turns one sanitized source item into the ordered segments of a thread.
//! Two strategies: when a text generator is configured, it is asked to
//! rewrite the content as a JSON `{"thread": [...]}` body which is parsed
//! into a typed [`ThreadResponse`]; otherwise the deterministic splitter
//! partitions the text directly. A malformed generator reply fails with
//! `GenerationError::MalformedResponse` instead of silently collapsing to a
//! single-segment thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SegmentConfig;
use crate::error::{GenerationError, Result};
use crate::sanitize::strip_emoji;
use crate::splitter::{split, truncate_to_sentence};
use crate::types::Segment;

/// External text-generation service.
///
/// Consumed as a black box: the prompt goes in, raw text comes out. Network,
/// timeout, and quota failures surface as `GenerationError::Service`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Typed shape of a generator thread reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub thread: Vec<String>,
}

/// Build the rewrite instruction for one source item.
pub fn thread_prompt(content: &str, segments: &SegmentConfig) -> String {
    format!(
        "Rewrite the following content as a multi-part thread.\n\
         Requirements:\n\
         - Each part must be under {max} characters and at least {min} characters.\n\
         - The last part may be under {min} characters.\n\
         - Never use emojis or emoticons of any kind.\n\n\
         Content:\n{content}\n\n\
         Reply with JSON only, in the form:\n\
         ```json\n{{\"thread\": [\"first part\", \"second part\"]}}\n```",
        max = segments.max_len,
        min = segments.min_len,
        content = content,
    )
}

/// Parse a generator reply into a [`ThreadResponse`].
///
/// Accepts a fenced ```json block or a bare JSON object. Fails with
/// `MalformedResponse` when no JSON object is present, the JSON does not
/// match the expected shape, or the thread is empty.
pub fn parse_thread_response(raw: &str) -> Result<ThreadResponse> {
    let body = extract_json_object(raw).ok_or_else(|| {
        GenerationError::MalformedResponse("no JSON object in response".to_string())
    })?;

    let response: ThreadResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    if response.thread.iter().all(|part| part.trim().is_empty()) {
        return Err(GenerationError::MalformedResponse("thread array is empty".to_string()).into());
    }

    Ok(response)
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Compose the thread segments for one sanitized source item.
pub async fn compose_thread(
    generator: Option<&dyn TextGenerator>,
    sanitized: &str,
    segments: &SegmentConfig,
) -> Result<Vec<Segment>> {
    match generator {
        Some(generator) => {
            let prompt = thread_prompt(sanitized, segments);
            debug!("thread prompt:\n{}", prompt);
            let raw = generator.generate(&prompt).await?;
            let response = parse_thread_response(&raw)?;
            Ok(segments_from_parts(response.thread, segments))
        }
        None => Ok(split(sanitized, segments.max_len, segments.min_len)),
    }
}

/// Normalize generator-composed parts into segments: strip stray emoji,
/// drop empty parts, and enforce the length bound by sentence truncation.
fn segments_from_parts(parts: Vec<String>, segments: &SegmentConfig) -> Vec<Segment> {
    let texts: Vec<String> = parts
        .into_iter()
        .map(|part| strip_emoji(&part).trim().to_string())
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part.chars().count() > segments.max_len {
                truncate_to_sentence(&part, segments.max_len)
            } else {
                part
            }
        })
        .collect();

    let count = texts.len();
    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment {
            index,
            text,
            is_final: index + 1 == count,
        })
        .collect()
}

/// Scripted generator for tests and offline runs.
///
/// Available in all builds so integration tests can exercise the full
/// pipeline without a model service.
pub struct MockGenerator {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String>>>,
}

impl MockGenerator {
    /// Generator that replies with the given raw texts, in order.
    pub fn with_responses(responses: Vec<&str>) -> Self {
        Self {
            responses: std::sync::Mutex::new(
                responses.into_iter().map(|r| Ok(r.to_string())).collect(),
            ),
        }
    }

    /// Generator whose every call fails with a service error.
    pub fn failing(message: &str) -> Self {
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(Err(GenerationError::Service(message.to_string()).into()));
        Self {
            responses: std::sync::Mutex::new(queue),
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let mut queue = self.responses.lock().unwrap();
        match queue.pop_front() {
            Some(response) => response,
            None => Err(GenerationError::Service("no scripted response left".to_string()).into()),
        }
    }
}
