//! Deterministic thread splitting
//!
//! Partitions sanitized text into an ordered sequence of segments, each at
//! most `max_len` characters, preferring sentence boundaries. The function is
//! pure: identical input always yields identical output, so threads are
//! reproducible in tests without the model or network.

use std::collections::VecDeque;

use crate::types::Segment;

/// Hard upper bound on segment length, matching the platform post limit.
pub const MAX_SEGMENT_LEN: usize = 280;
/// Non-final segments are padded with words from the following sentence up
/// to at least this length.
pub const MIN_SEGMENT_LEN: usize = 250;

const ELLIPSIS: &str = "...";

/// Split `text` into ordered segments of at most `max_len` characters.
///
/// Sentences are accumulated greedily; when the next sentence would overflow
/// `max_len` the current segment is closed. A closing segment shorter than
/// `min_len` borrows leading words from the pending sentence (a segment below
/// `min_len` is only acceptable as the final one; the single escape hatch is
/// a word longer than the remaining budget). A single sentence longer than
/// `max_len` is truncated at the last whitespace before the limit and marked
/// with an ellipsis rather than failing.
pub fn split(text: &str, max_len: usize, min_len: usize) -> Vec<Segment> {
    debug_assert!(min_len < max_len);

    let mut queue: VecDeque<String> = split_sentences(text)
        .into_iter()
        .map(|s| truncate_oversized(&s, max_len))
        .collect();

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();

    while let Some(sentence) = queue.pop_front() {
        let joined_len = if current.is_empty() {
            char_len(&sentence)
        } else {
            char_len(&current) + 1 + char_len(&sentence)
        };

        if joined_len <= max_len {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
            continue;
        }

        // Close the current segment, borrowing words first if it is short.
        let words: Vec<&str> = sentence.split_whitespace().collect();
        let mut taken = 0;
        while char_len(&current) < min_len && taken < words.len() {
            let word = words[taken];
            if char_len(&current) + 1 + char_len(word) > max_len {
                break;
            }
            current.push(' ');
            current.push_str(word);
            taken += 1;
        }

        parts.push(std::mem::take(&mut current));

        let remainder = words[taken..].join(" ");
        if !remainder.is_empty() {
            queue.push_front(remainder);
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    let count = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment {
            index,
            text,
            is_final: index + 1 == count,
        })
        .collect()
}

/// Truncate text to `max_len` characters, preferring a complete sentence.
///
/// Tries, in order: the last period within the limit, the last whitespace
/// within the limit plus an ellipsis, a hard cut plus an ellipsis. Exposed
/// for hosts that publish single posts instead of threads.
pub fn truncate_to_sentence(text: &str, max_len: usize) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }

    let window: String = text.chars().take(max_len).collect();
    if let Some(idx) = window.rfind('.') {
        let at_period = window[..=idx].trim();
        if !at_period.is_empty() {
            return at_period.to_string();
        }
    }

    truncate_oversized(text, max_len)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Scan sentence-terminated chunks. A sentence ends after a run of
/// terminators followed by whitespace; newlines also close a chunk so
/// statement-per-line generator output splits cleanly. Decimal points do
/// not split ("3.5" stays together).
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            push_trimmed(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().is_none_or(|next| next.is_whitespace()) {
                push_trimmed(&mut sentences, &mut current);
            }
        }
    }
    push_trimmed(&mut sentences, &mut current);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Hard-truncate a single over-long sentence at the last whitespace before
/// the limit and append an ellipsis marker. The result never exceeds
/// `max_len` characters.
fn truncate_oversized(sentence: &str, max_len: usize) -> String {
    if char_len(sentence) <= max_len {
        return sentence.to_string();
    }

    let budget: String = sentence
        .chars()
        .take(max_len.saturating_sub(char_len(ELLIPSIS)))
        .collect();

    let cut = match budget.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => budget[..idx].trim_end(),
        _ => budget.trim_end(),
    };

    format!("{}{}", cut, ELLIPSIS)
}
