//! Query ranking, snippets and highlighting.
//!
//! Score for one document against a lowercased query:
//!
//! | signal                               | points                 |
//! |--------------------------------------|------------------------|
//! | title equals query                   | 100                    |
//! | otherwise title contains query       | 50                     |
//! | each occurrence in body              | 2                      |
//! | each label whose name contains query | 5                      |
//! | updated `d` < 30 whole days ago      | `max(0, (30 - d) / 10)` |
//!
//! All comparisons are case-insensitive. The recency bonus applies whether
//! or not anything else matched.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::model::{Document, Label};

/// Queries shorter than this many characters return nothing.
pub const MIN_QUERY_CHARS: usize = 2;
/// Characters of context either side of the first match in a snippet.
pub const SNIPPET_CONTEXT: usize = 80;
/// Snippet length when the query does not occur in the text.
const LEAD_CHARS: usize = 150;
const RECENT_DAYS: i64 = 30;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub issue_id: u64,
    pub title: String,
    pub slug: String,
    pub snippet: String,
    pub labels: Vec<Label>,
    pub score: f64,
}

impl SearchResult {
    fn new(doc: &Document, query: &str, score: f64) -> Self {
        Self {
            issue_id: doc.id,
            title: doc.title.clone(),
            slug: doc.slug(),
            snippet: extract_context(&doc.body, query, SNIPPET_CONTEXT),
            labels: doc.labels.clone(),
            score,
        }
    }
}

fn query_too_short(query: &str) -> bool {
    query.chars().count() < MIN_QUERY_CHARS
}

fn recency_bonus(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - updated_at).num_seconds().div_euclid(SECONDS_PER_DAY);
    if days < RECENT_DAYS {
        ((RECENT_DAYS - days) as f64 / 10.0).max(0.0)
    } else {
        0.0
    }
}

/// Score of `doc` for an already-lowercased `query`.
pub fn score_document(doc: &Document, query: &str, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;

    let title = doc.title.to_lowercase();
    if title == query {
        score += 100.0;
    } else if title.contains(query) {
        score += 50.0;
    }

    score += 2.0 * doc.body.to_lowercase().matches(query).count() as f64;

    let labels = doc.labels.iter().filter(|l| l.name.to_lowercase().contains(query)).count();
    score += 5.0 * labels as f64;

    score + recency_bonus(doc.updated_at, now)
}

/// Rank `corpus` against `query`, best first. Zero scores are dropped and
/// ties keep corpus order. `now` anchors the recency bonus.
pub fn search(corpus: &[Document], query: &str, now: DateTime<Utc>) -> Vec<SearchResult> {
    if query_too_short(query) {
        return Vec::new();
    }
    let lowered = query.to_lowercase();

    let mut results: Vec<SearchResult> = corpus
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &lowered, now);
            (score > 0.0).then(|| SearchResult::new(doc, query, score))
        })
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
}

/// Documents whose title or body contains `query`, in corpus order and
/// unranked (`score` is 0).
pub fn filter_by_query(corpus: &[Document], query: &str) -> Vec<SearchResult> {
    if query_too_short(query) {
        return Vec::new();
    }
    let lowered = query.to_lowercase();
    corpus
        .iter()
        .filter(|doc| doc.title.to_lowercase().contains(&lowered) || doc.body.to_lowercase().contains(&lowered))
        .map(|doc| SearchResult::new(doc, query, 0.0))
        .collect()
}

fn literal_pattern(query: &str) -> Option<Regex> {
    match Regex::new(&format!("(?i){}", regex::escape(query))) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(%query, error = %e, "search pattern does not compile");
            None
        }
    }
}

/// Window of `radius` characters around the first case-insensitive match,
/// with `...` on cut sides. Without a match, the first 150 characters.
pub fn extract_context(text: &str, query: &str, radius: usize) -> String {
    if text.is_empty() || query.is_empty() {
        return String::new();
    }

    let found = literal_pattern(query).and_then(|re| re.find(text).map(|m| (m.start(), m.end())));
    let Some((start, end)) = found else {
        return lead(text);
    };

    let from = match radius {
        0 => start,
        _ => text[..start].char_indices().rev().nth(radius - 1).map_or(0, |(i, _)| i),
    };
    let to = text[end..].char_indices().nth(radius).map_or(text.len(), |(i, _)| end + i);

    let mut excerpt = String::new();
    if from > 0 {
        excerpt.push_str("...");
    }
    excerpt.push_str(&text[from..to]);
    if to < text.len() {
        excerpt.push_str("...");
    }
    excerpt
}

fn lead(text: &str) -> String {
    match text.char_indices().nth(LEAD_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Wrap every case-insensitive occurrence of `query` in a highlight mark.
/// Returns `text` unchanged when there is nothing to highlight.
pub fn highlight_text(text: &str, query: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }
    match literal_pattern(query) {
        Some(re) => re.replace_all(text, r#"<mark class="search-highlight">$0</mark>"#).into_owned(),
        None => text.to_string(),
    }
}
