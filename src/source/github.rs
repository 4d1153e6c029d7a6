//! GitHub REST v3 issue source.
//!
//! Only the three read endpoints the wiki needs. Tickets and pull requests
//! share `/issues`; telling them apart is the store's job.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, trace};

use crate::model::{Comment, IssuePayload};
use crate::source::SourceError;

const USER_AGENT: &str = concat!("issue-wiki/", env!("CARGO_PKG_VERSION"));
const MEDIA_TYPE: &str = "application/vnd.github+json";

/// Reads tickets from one repository. Cheap to clone; `reqwest::Client` is an
/// `Arc` internally.
#[derive(Debug, Clone)]
pub struct GitHubSource {
    client: Client,
    api_base_url: String,
    owner: String,
    repo: String,
    per_page: u32,
    token: Option<String>,
}

impl GitHubSource {
    /// `token` is sent as `Authorization: Bearer <token>` when present.
    pub fn new(
        api_base_url: String,
        owner: String,
        repo: String,
        per_page: u32,
        timeout_seconds: u64,
        token: Option<String>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, owner, repo, per_page, token })
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base_url, self.owner, self.repo, tail)
    }

    pub async fn list_open_issues(&self) -> Result<Vec<IssuePayload>, SourceError> {
        let url = self.repo_url(&format!("/issues?state=open&per_page={}", self.per_page));
        let issues: Vec<IssuePayload> = self.get_json(&url).await?;
        debug!(count = issues.len(), "listed open issues");
        Ok(issues)
    }

    pub async fn fetch_issue(&self, number: u64) -> Result<IssuePayload, SourceError> {
        self.get_json(&self.repo_url(&format!("/issues/{number}"))).await
    }

    pub async fn fetch_comments(&self, number: u64) -> Result<Vec<Comment>, SourceError> {
        self.get_json(&self.repo_url(&format!("/issues/{number}/comments"))).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        debug!(%url, "GET");

        let mut req = self.client.get(url).header(ACCEPT, MEDIA_TYPE);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await.map_err(|e| {
            error!(%url, error = %e, "GitHub request failed (transport)");
            SourceError::Request(e.to_string())
        })?;

        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Request(format!("failed to read response body: {e}")))?;
        trace!(%url, bytes = body.len(), "GitHub response body");

        serde_json::from_str(&body).map_err(|e| {
            error!(%url, error = %e, "failed to deserialize GitHub response");
            SourceError::Decode(e.to_string())
        })
    }
}

// Error body GitHub sends with every 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: String,
    #[serde(default)]
    documentation_url: Option<String>,
}

/// Pass successful responses through; turn anything else into
/// `SourceError::Status` carrying GitHub's own message when it sent one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => match env.documentation_url {
            Some(doc) => format!("{} ({doc})", env.message),
            None => env.message,
        },
        Err(_) => body,
    };

    error!(%status, %message, "GitHub request returned HTTP error");
    Err(SourceError::Status { status: status.as_u16(), message })
}
