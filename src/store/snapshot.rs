//! Static snapshot of the ticket corpus, used when the remote is unreachable.
//!
//! The file is a JSON array of ticket payloads in the tracker's own format.

use std::path::Path;

use thiserror::Error;

use crate::model::IssuePayload;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read snapshot {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read every payload in the snapshot, change requests included.
pub async fn read_snapshot(path: &Path) -> Result<Vec<IssuePayload>, SnapshotError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SnapshotError::Read { path: path.display().to_string(), source })?;
    serde_json::from_str(&text)
        .map_err(|source| SnapshotError::Parse { path: path.display().to_string(), source })
}
