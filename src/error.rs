//! Application-wide error types.
//!
//! Only start-up and CLI paths return these. Store and text-processing
//! operations degrade to empty results and log instead.

use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
