//! Cached access to the ticket corpus.
//!
//! [`DocumentStore`] sits between the wiki and an [`IssueSource`]. Every read
//! goes through a TTL cache; remote failures degrade to the static snapshot
//! and then to an empty result. Nothing here returns an error to the caller;
//! failures are only visible in the logs.
//!
//! Concurrent misses on the same key each hit the source. The last write
//! wins and entries are replaced whole, so readers never see a partial value.

pub mod cache;
pub mod snapshot;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::{Comment, Document, IssuePayload, documents_from_payloads};
use crate::source::{self, IssueSource, SourceError};

pub use cache::{CacheEntry, Clock, ManualClock};
pub use snapshot::{SnapshotError, read_snapshot};

#[derive(Debug, Default)]
struct CacheState {
    open: Option<CacheEntry<Vec<Document>>>,
    documents: HashMap<u64, CacheEntry<Document>>,
    comments: HashMap<u64, CacheEntry<Vec<Comment>>>,
}

/// Where a listing came from. Snapshot results are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cache,
    Remote,
    Snapshot,
}

/// Clone freely; clones share one cache.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    source: IssueSource,
    snapshot_path: Option<PathBuf>,
    ttl: Duration,
    clock: Clock,
    state: Arc<RwLock<CacheState>>,
}

impl DocumentStore {
    pub fn new(source: IssueSource, snapshot_path: Option<PathBuf>, ttl: Duration) -> Self {
        Self {
            source,
            snapshot_path,
            ttl,
            clock: Clock::System,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    /// Build the configured source and wrap it with the configured cache.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let source = source::build(&config.source, config.github_token.clone())?;
        Ok(Self::new(source, config.cache.snapshot_path.clone(), config.cache.ttl))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached entry.
    pub async fn invalidate(&self) {
        *self.state.write().await = CacheState::default();
        debug!("document cache invalidated");
    }

    /// Open tickets, change requests excluded. Empty when both the source and
    /// the snapshot fail.
    pub async fn list_open_documents(&self) -> Vec<Document> {
        self.open_documents().await.0
    }

    async fn open_documents(&self) -> (Vec<Document>, Origin) {
        let now = self.clock.now();
        {
            let state = self.state.read().await;
            if let Some(entry) = &state.open {
                if entry.is_fresh(now, self.ttl) {
                    debug!(count = entry.value.len(), "open documents served from cache");
                    return (entry.value.clone(), Origin::Cache);
                }
            }
        }

        match self.source.list_open_issues().await {
            Ok(payloads) => {
                let documents = documents_from_payloads(payloads);
                info!(count = documents.len(), source = self.source.name(), "fetched open documents");
                self.state.write().await.open =
                    Some(CacheEntry::new(documents.clone(), self.clock.now()));
                (documents, Origin::Remote)
            }
            Err(e) => {
                warn!(error = %e, "listing open issues failed, falling back to snapshot");
                let documents: Vec<Document> = self
                    .snapshot_payloads()
                    .await
                    .map(documents_from_payloads)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(Document::is_open)
                    .collect();
                info!(count = documents.len(), "open documents served from snapshot");
                (documents, Origin::Snapshot)
            }
        }
    }

    /// One ticket by id, open or closed. `None` for change requests and when
    /// neither the source nor the snapshot has it.
    pub async fn get_document(&self, id: u64) -> Option<Document> {
        let now = self.clock.now();
        {
            let state = self.state.read().await;
            if let Some(entry) = state.documents.get(&id) {
                if entry.is_fresh(now, self.ttl) {
                    debug!(issue = id, "document served from cache");
                    return Some(entry.value.clone());
                }
            }
        }

        let (open, origin) = self.open_documents().await;
        if let Some(document) = open.into_iter().find(|d| d.id == id) {
            if origin != Origin::Snapshot {
                self.cache_document(document.clone()).await;
            }
            return Some(document);
        }

        match self.source.fetch_issue(id).await {
            Ok(payload) if payload.is_change_request() => {
                debug!(issue = id, "ignoring change request");
                None
            }
            Ok(payload) => {
                let document = payload.into_document();
                self.cache_document(document.clone()).await;
                Some(document)
            }
            Err(e) => {
                warn!(issue = id, error = %e, "fetching issue failed, falling back to snapshot");
                self.snapshot_document(id).await
            }
        }
    }

    /// Comments on a ticket. Empty on failure; comments have no snapshot.
    pub async fn get_comments(&self, id: u64) -> Vec<Comment> {
        let now = self.clock.now();
        {
            let state = self.state.read().await;
            if let Some(entry) = state.comments.get(&id) {
                if entry.is_fresh(now, self.ttl) {
                    debug!(issue = id, "comments served from cache");
                    return entry.value.clone();
                }
            }
        }

        match self.source.fetch_comments(id).await {
            Ok(comments) => {
                debug!(issue = id, count = comments.len(), "fetched comments");
                self.state
                    .write()
                    .await
                    .comments
                    .insert(id, CacheEntry::new(comments.clone(), self.clock.now()));
                comments
            }
            Err(e) => {
                warn!(issue = id, error = %e, "fetching comments failed");
                Vec::new()
            }
        }
    }

    async fn cache_document(&self, document: Document) {
        let entry = CacheEntry::new(document, self.clock.now());
        self.state.write().await.documents.insert(entry.value.id, entry);
    }

    async fn snapshot_payloads(&self) -> Option<Vec<IssuePayload>> {
        let path = self.snapshot_path.as_deref()?;
        match read_snapshot(path).await {
            Ok(payloads) => Some(payloads),
            Err(e) => {
                warn!(error = %e, "snapshot fallback failed");
                None
            }
        }
    }

    async fn snapshot_document(&self, id: u64) -> Option<Document> {
        self.snapshot_payloads()
            .await?
            .into_iter()
            .find(|p| p.number == id && !p.is_change_request())
            .map(IssuePayload::into_document)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::IssueState;
    use crate::source::fixture::FixtureSource;

    fn payload(number: u64, title: &str, state: IssueState) -> IssuePayload {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().unwrap();
        IssuePayload {
            number,
            title: title.into(),
            body: Some(format!("body of {title}")),
            html_url: String::new(),
            state,
            labels: Vec::new(),
            user: None,
            comments: 0,
            created_at: at,
            updated_at: at,
            pull_request: None,
        }
    }

    fn store(fixture: &FixtureSource, clock: &ManualClock) -> DocumentStore {
        DocumentStore::new(IssueSource::Fixture(fixture.clone()), None, Duration::from_secs(300))
            .with_clock(Clock::Manual(clock.clone()))
    }

    #[tokio::test]
    async fn listing_is_cached_until_ttl() {
        let fixture = FixtureSource::new(vec![payload(1, "Alpha", IssueState::Open)]);
        let clock = ManualClock::new();
        let store = store(&fixture, &clock);

        assert_eq!(store.list_open_documents().await.len(), 1);
        clock.advance(Duration::from_secs(299));
        assert_eq!(store.list_open_documents().await.len(), 1);
        assert_eq!(fixture.calls(), 1);

        clock.advance(Duration::from_secs(1));
        store.list_open_documents().await;
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn get_document_uses_listing_then_direct_fetch() {
        let fixture = FixtureSource::new(vec![
            payload(1, "Alpha", IssueState::Open),
            payload(2, "Old", IssueState::Closed),
        ]);
        let store = store(&fixture, &ManualClock::new());

        assert_eq!(store.get_document(1).await.map(|d| d.title), Some("Alpha".into()));
        assert_eq!(fixture.calls(), 1);

        let closed = store.get_document(2).await.unwrap();
        assert_eq!(closed.state, IssueState::Closed);
        // listing (cached) + direct fetch
        assert_eq!(fixture.calls(), 2);

        store.get_document(2).await;
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn change_request_is_not_a_document() {
        let mut pr = payload(5, "Bump deps", IssueState::Closed);
        pr.pull_request = Some(serde_json::json!({}));
        let store = store(&FixtureSource::new(vec![pr]), &ManualClock::new());
        assert!(store.get_document(5).await.is_none());
    }

    #[tokio::test]
    async fn outage_without_snapshot_degrades_to_empty() {
        let fixture = FixtureSource::new(vec![payload(1, "Alpha", IssueState::Open)]);
        fixture.set_offline(true);
        let store = store(&fixture, &ManualClock::new());
        assert!(store.list_open_documents().await.is_empty());
        assert!(store.get_document(1).await.is_none());
        assert!(store.get_comments(1).await.is_empty());
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let fixture = FixtureSource::new(vec![payload(1, "Alpha", IssueState::Open)]);
        let store = store(&fixture, &ManualClock::new());
        store.list_open_documents().await;
        store.invalidate().await;
        store.list_open_documents().await;
        assert_eq!(fixture.calls(), 2);
    }
}
