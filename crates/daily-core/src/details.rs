//! Event detail cleaning.
//!
//! Provider descriptions are often HTML. [`clean_details`] renders them as
//! Markdown-style text with `html2text` (links become numbered references)
//! and wraps bare URLs in Markdown links so any renderer can make them
//! clickable.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

/// Line width for rendered HTML; wide enough that URLs are never split.
const WRAP_WIDTH: usize = 500;

/// Loose test for an HTML tag anywhere in the text.
static HTML_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("Invalid HTML tag regex"));

/// An existing Markdown link (inline, reference or link definition), or a
/// bare http(s) URL.
static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\[[^\]]+\]\([^)]+\)|",
        r"\[[^\]]+\]\[\d+\]|",
        r"(?m)^\[\d+\]: \S+|",
        r"https?://[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*",
    ))
    .expect("Invalid link regex")
});

static BLANK_LINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank lines regex"));

/// Returns true if the text contains something that looks like an HTML tag.
pub fn is_html(text: &str) -> bool {
    HTML_TAG_REGEX.is_match(text)
}

/// Cleans event details for display as Markdown.
pub fn clean_details(details: &str) -> String {
    let markdown = if is_html(details) {
        debug!("converting HTML details to markdown");
        html_to_markdown(details)
    } else {
        details.to_string()
    };

    linkify(&markdown)
}

/// Wraps bare URLs as `[url](url)`, leaving Markdown links untouched.
pub fn linkify(text: &str) -> String {
    LINK_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let matched = &caps[0];
            if matched.starts_with('[') {
                matched.to_string()
            } else {
                format!("[{}]({})", matched, matched)
            }
        })
        .into_owned()
}

fn html_to_markdown(html: &str) -> String {
    let rendered = match html2text::from_read(html.as_bytes(), WRAP_WIDTH) {
        Ok(rendered) => rendered,
        Err(e) => {
            warn!(error = %e, "failed to convert HTML details, showing them as is");
            return html.to_string();
        }
    };

    let trimmed: Vec<&str> = rendered.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    BLANK_LINES_REGEX
        .replace_all(joined.trim(), "\n\n")
        .into_owned()
}
