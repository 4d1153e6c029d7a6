//! In-memory issue source backed by a JSON file or test data.
//!
//! Behaves like the GitHub source from the store's point of view: listing
//! returns open tickets only (change requests included), a missing number is
//! a 404 and `set_offline(true)` makes every call fail at the transport level.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::model::{Comment, IssuePayload, IssueState};
use crate::source::SourceError;

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    issues: Arc<Vec<IssuePayload>>,
    comments: Arc<HashMap<u64, Vec<Comment>>>,
    offline: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl FixtureSource {
    pub fn new(issues: Vec<IssuePayload>) -> Self {
        Self { issues: Arc::new(issues), ..Self::default() }
    }

    /// Load a JSON array of ticket payloads.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path)
            .map_err(|e| SourceError::Request(format!("cannot read {}: {e}", path.display())))?;
        let issues: Vec<IssuePayload> = serde_json::from_str(&text)
            .map_err(|e| SourceError::Decode(format!("{}: {e}", path.display())))?;
        Ok(Self::new(issues))
    }

    pub fn with_comments(mut self, number: u64, comments: Vec<Comment>) -> Self {
        Arc::make_mut(&mut self.comments).insert(number, comments);
        self
    }

    /// Simulate an outage. Shared by every clone.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls made against this source (all clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Real sources suspend on I/O; keep that interleaving visible.
        tokio::task::yield_now().await;
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Request("fixture source is offline".into()));
        }
        Ok(())
    }

    pub async fn list_open_issues(&self) -> Result<Vec<IssuePayload>, SourceError> {
        self.enter().await?;
        Ok(self.issues.iter().filter(|i| i.state == IssueState::Open).cloned().collect())
    }

    pub async fn fetch_issue(&self, number: u64) -> Result<IssuePayload, SourceError> {
        self.enter().await?;
        self.issues
            .iter()
            .find(|i| i.number == number)
            .cloned()
            .ok_or_else(|| SourceError::Status { status: 404, message: "Not Found".into() })
    }

    pub async fn fetch_comments(&self, number: u64) -> Result<Vec<Comment>, SourceError> {
        self.enter().await?;
        Ok(self.comments.get(&number).cloned().unwrap_or_default())
    }
}
