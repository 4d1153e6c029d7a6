//! Remote ticket sources.
//!
//! `IssueSource` is an enum over concrete backends. Adding a backend means a
//! new module, a new variant and a new arm in each method; callers never see
//! trait objects.
//!
//! Sources are shared immutable capabilities; clone them freely. They only
//! fetch; filtering of change requests, caching and fallbacks belong to
//! [`DocumentStore`](crate::store::DocumentStore).

pub mod fixture;
#[cfg(feature = "source-github")]
pub mod github;

use thiserror::Error;

use crate::config::SourceConfig;
use crate::model::{Comment, IssuePayload};

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unknown source provider: {0}")]
    UnknownProvider(String),
    #[error("source misconfigured: {0}")]
    Misconfigured(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

// ── Source enum ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum IssueSource {
    #[cfg(feature = "source-github")]
    GitHub(github::GitHubSource),
    Fixture(fixture::FixtureSource),
}

impl IssueSource {
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "source-github")]
            IssueSource::GitHub(_) => "github",
            IssueSource::Fixture(_) => "fixture",
        }
    }

    /// One page of open tickets. May include change requests.
    pub async fn list_open_issues(&self) -> Result<Vec<IssuePayload>, SourceError> {
        match self {
            #[cfg(feature = "source-github")]
            IssueSource::GitHub(s) => s.list_open_issues().await,
            IssueSource::Fixture(s) => s.list_open_issues().await,
        }
    }

    /// A single ticket by number, in any state.
    pub async fn fetch_issue(&self, number: u64) -> Result<IssuePayload, SourceError> {
        match self {
            #[cfg(feature = "source-github")]
            IssueSource::GitHub(s) => s.fetch_issue(number).await,
            IssueSource::Fixture(s) => s.fetch_issue(number).await,
        }
    }

    pub async fn fetch_comments(&self, number: u64) -> Result<Vec<Comment>, SourceError> {
        match self {
            #[cfg(feature = "source-github")]
            IssueSource::GitHub(s) => s.fetch_comments(number).await,
            IssueSource::Fixture(s) => s.fetch_comments(number).await,
        }
    }
}

/// Construct the configured source.
///
/// `token` is sourced from `GITHUB_TOKEN` (never TOML) and is `None` for
/// anonymous access.
#[cfg_attr(not(feature = "source-github"), allow(unused_variables))]
pub fn build(config: &SourceConfig, token: Option<String>) -> Result<IssueSource, SourceError> {
    match config.provider.as_str() {
        #[cfg(feature = "source-github")]
        "github" => Ok(IssueSource::GitHub(github::GitHubSource::new(
            config.api_base_url.clone(),
            config.owner.clone(),
            config.repo.clone(),
            config.per_page,
            config.timeout_seconds,
            token,
        )?)),
        "fixture" => {
            let path = config.fixture_path.as_deref().ok_or_else(|| {
                SourceError::Misconfigured("fixture provider needs source.fixture_path".into())
            })?;
            Ok(IssueSource::Fixture(fixture::FixtureSource::from_path(path)?))
        }
        other => Err(SourceError::UnknownProvider(other.to_string())),
    }
}
