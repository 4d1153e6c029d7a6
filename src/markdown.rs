//! Markdown rendering for wiki pages.
//!
//! Pages are rendered to HTML first and linked second. `[[...]]` survives
//! rendering as literal text, and rendered `<code>`/`<pre>` elements are
//! whole markup spans to the rewriter, so code never gets keyword links.

use std::sync::LazyLock;

use comrak::Options;
use regex::Regex;
use serde::Serialize;

use crate::config::ZettelkastenConfig;
use crate::model::Document;
use crate::wiki::links::unescape_html;
use crate::wiki::rewrite;

fn gfm_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options
}

/// GitHub-flavoured markdown to HTML. Raw HTML in the source is not passed
/// through.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }
    comrak::markdown_to_html(markdown, &gfm_options())
}

/// Render a page body and insert wiki and keyword links.
pub fn render_page(
    markdown: &str,
    corpus: &[Document],
    config: &ZettelkastenConfig,
    base_path: &str,
    self_id: u64,
) -> String {
    rewrite(&markdown_to_html(markdown), corpus, config, base_path, self_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub id: String,
}

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s+(.+)$").expect("heading pattern is valid"));

/// Anchor id for a heading: lowercase, punctuation dropped, whitespace runs
/// turned into `-`.
pub fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                id.push('-');
            }
            in_space = true;
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            id.push(c);
            in_space = false;
        }
    }
    id
}

/// ATX headings in source order, for a table of contents.
pub fn extract_headings(markdown: &str) -> Vec<Heading> {
    HEADING
        .captures_iter(markdown)
        .map(|caps| {
            let text = caps[2].trim().to_string();
            Heading { level: caps[1].len(), id: heading_id(&text), text }
        })
        .collect()
}

static PLAIN_TEXT_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?s)```.*?```", ""),
        (r"!\[([^\]]+)\]\([^)]+\)", "${1}"),
        (r"\[([^\]]+)\]\([^)]+\)", "${1}"),
        (r"\[\[(.*?)\]\]", "${1}"),
        (r"`([^`]+)`", "${1}"),
        (r"#{1,6}\s+", ""),
        (r"(?m)^\s*[-*+]\s+", ""),
        (r"(?m)^\s*\d+\.\s+", ""),
        (r"\*\*(.*?)\*\*", "${1}"),
        (r"__(.*?)__", "${1}"),
        (r"\*(.*?)\*", "${1}"),
        (r"_(.*?)_", "${1}"),
        (r"<[^>]+>", ""),
        (r"\s+", " "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (Regex::new(pattern).expect("plain text pattern is valid"), replacement)
    })
    .collect()
});

/// Strip markdown syntax for indexing and previews.
pub fn markdown_to_plain_text(markdown: &str) -> String {
    let mut text = unescape_html(markdown).into_owned();
    for (pattern, replacement) in PLAIN_TEXT_RULES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text.trim().to_string()
}
