//! Markup sanitation for generated analysis text
//!
//! Model output arrives with markdown artifacts that read badly as plain
//! social posts. `sanitize` strips them before the text is measured or
//! split. It is a pure, total function and idempotent:
//! `sanitize(sanitize(x)) == sanitize(x)`.

use regex::Regex;
use std::sync::LazyLock;

// Link syntax collapses to the link text; runs before reference-number
// removal so "[1](url)" style links are not mangled.
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*").unwrap());
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`").unwrap());
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:>\s?)+").unwrap());
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1F300}-\x{1F9FF}\x{2700}-\x{27BF}\x{2600}-\x{26FF}]").unwrap()
});
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Strip markdown/formatting artifacts from raw generated text.
pub fn sanitize(raw: &str) -> String {
    let text = LINK.replace_all(raw, "$1");
    let text = BOLD.replace_all(&text, "");
    let text = ITALIC.replace_all(&text, "");
    let text = REFERENCE.replace_all(&text, "");
    let text = HEADING.replace_all(&text, "");
    let text = CODE.replace_all(&text, "");
    let text = BLOCKQUOTE.replace_all(&text, "");
    let text = EMOJI.replace_all(&text, "");
    let text = BLANK_LINES.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Remove emoji code points only.
///
/// Generator-composed thread parts get this second pass before measurement,
/// since the generator is instructed not to emit emoji but occasionally does.
pub fn strip_emoji(text: &str) -> String {
    EMOJI.replace_all(text, "").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_emphasis_markers() {
        assert_eq!(sanitize("**bold** and *italic* text"), "bold and italic text");
    }

    #[test]
    fn test_removes_reference_markers() {
        assert_eq!(
            sanitize("Markets rallied today[1] on new data[12]."),
            "Markets rallied today on new data."
        );
    }

    #[test]
    fn test_removes_heading_markers() {
        assert_eq!(sanitize("## Summary\nPrices rose."), "Summary\nPrices rose.");
        assert_eq!(sanitize("###### Deep heading"), "Deep heading");
    }

    #[test]
    fn test_collapses_links_to_text() {
        assert_eq!(
            sanitize("See [the report](https://example.com/report) for details."),
            "See the report for details."
        );
    }

    #[test]
    fn test_numbered_link_keeps_label() {
        // Link collapsing runs before reference removal, so the label
        // survives and the bare reference style is still stripped.
        assert_eq!(sanitize("source [1](https://example.com)"), "source 1");
    }

    #[test]
    fn test_removes_code_and_blockquote_markers() {
        assert_eq!(sanitize("`inline code` here"), "inline code here");
        assert_eq!(sanitize("> quoted line\nplain line"), "quoted line\nplain line");
        assert_eq!(sanitize("> > nested quote"), "nested quote");
    }

    #[test]
    fn test_keeps_inline_greater_than() {
        assert_eq!(sanitize("5 > 3 is true"), "5 > 3 is true");
    }

    #[test]
    fn test_removes_emoji() {
        assert_eq!(sanitize("To the moon \u{1F680}\u{1F680}"), "To the moon");
        assert_eq!(strip_emoji("fine \u{2728} text"), "fine  text");
    }

    #[test]
    fn test_collapses_blank_lines() {
        assert_eq!(sanitize("para one\n\n\n\npara two"), "para one\npara two");
        assert_eq!(sanitize("para one\n  \n\t\npara two"), "para one\npara two");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize("   padded   "), "padded");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "**bold** [link](url) with [3] refs\n\n\n## heading\n> quote `code` \u{1F600}",
            "plain text stays plain",
            "",
            "> > > deeply quoted\n\n\n*emphasis*",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }
}
