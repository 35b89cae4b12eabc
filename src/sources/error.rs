use std::time::Duration;

use thiserror::Error;

use crate::http::HttpError;

/// Why a source adapter could not produce a fresh value. Never escapes an
/// adapter's public fetch method; it only decides what gets logged.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(#[from] HttpError),
    #[error("source did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}
