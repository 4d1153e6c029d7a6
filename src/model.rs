//! Tickets, labels and comments as the wiki sees them.
//!
//! [`IssuePayload`] mirrors the tracker's JSON and is what the source and
//! snapshot layers deserialize; [`Document`] is the cleaned-up page every
//! other module works with.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slug::generate_slug;

/// Ticket state on the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Six hex digits, no leading `#`.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

/// A ticket treated as a wiki page. `id` is the ticket number; `title` is the
/// join key for every link match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<Label>,
    pub state: IssueState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub comment_count: u64,
}

impl Document {
    pub fn slug(&self) -> String {
        generate_slug(&self.title)
    }

    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

/// Ticket object exactly as the tracker API (and the static snapshot)
/// serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub user: Option<Author>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present only on merge/change requests, which share the issues endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl IssuePayload {
    pub fn is_change_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn into_document(self) -> Document {
        Document {
            id: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            labels: self.labels,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
            html_url: self.html_url,
            author: self.user,
            comment_count: self.comments,
        }
    }
}

/// Keep real tickets only, converted to documents, in input order.
pub fn documents_from_payloads(payloads: Vec<IssuePayload>) -> Vec<Document> {
    payloads
        .into_iter()
        .filter(|p| !p.is_change_request())
        .map(IssuePayload::into_document)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<Author>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: String,
}

/// A label aggregated across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub count: usize,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Category id: lowercase name with every non-word character turned into `-`.
fn category_id(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect()
}

/// Unique labels across the corpus with their usage count, most used first.
/// Labels whose names map to the same id are merged; the first seen wins.
pub fn extract_categories(corpus: &[Document]) -> Vec<Category> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Category> = HashMap::new();

    for label in corpus.iter().flat_map(|doc| doc.labels.iter()) {
        let id = category_id(&label.name);
        match by_id.get_mut(&id) {
            Some(category) => category.count += 1,
            None => {
                order.push(id.clone());
                by_id.insert(
                    id.clone(),
                    Category {
                        id,
                        name: label.name.clone(),
                        count: 1,
                        color: label.color.clone(),
                        description: label.description.clone(),
                    },
                );
            }
        }
    }

    let mut categories: Vec<Category> =
        order.into_iter().filter_map(|id| by_id.remove(&id)).collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count));
    categories
}

/// First document whose title slug equals `slug`.
pub fn find_by_slug<'a>(corpus: &'a [Document], slug: &str) -> Option<&'a Document> {
    corpus.iter().find(|doc| doc.slug() == slug)
}
