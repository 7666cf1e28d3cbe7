use reqwest::StatusCode;
use thiserror::Error;

/// Why a backend call produced no usable result.
///
/// Callers treat every variant the same way: log it and leave widget state
/// untouched for this cycle.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{path} answered {status}")]
    Http { status: StatusCode, path: String },

    #[error("malformed response from {path}: {source}")]
    MalformedResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchFailure::Network(_) => "network",
            FetchFailure::Http { .. } => "http",
            FetchFailure::MalformedResponse { .. } => "malformed",
        }
    }
}

/// The audio cue could not be played. Never fatal.
#[derive(Debug, Error)]
#[error("audio cue unavailable: {0}")]
pub struct PlaybackUnavailable(pub String);
