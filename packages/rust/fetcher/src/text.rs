//! HTML-to-plain-text reduction for extraction input.
//!
//! Drops `<script>`/`<style>`/`<noscript>` subtrees, keeps every other text node,
//! collapses whitespace and caps the result at a character budget.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

/// Elements whose text never reaches the model.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Reduce an HTML document to a single line of visible text.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let doc = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);

    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        raw.push_str(text);
        raw.push(' ');
    }

    truncate_chars(&collapse_whitespace(&raw), max_chars)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Keep at most `max_chars` characters (not bytes).
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
