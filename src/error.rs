//! Failure taxonomy.
//!
//! Nothing in the search/playback pipeline is allowed to surface an error to
//! the user. Provider calls fail with [`ProviderError`]; the pipeline turns
//! each of those into a [`Degraded`] value, logs it and carries on with a
//! safe default.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("invalid {provider} response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),
}

/// A recovered failure. Logged at `warn`, never shown as an error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Degraded {
    #[error("metadata resolution failed ({0}); using raw input")]
    ResolutionFailure(String),

    #[error("lyrics not found ({0})")]
    LyricsNotFound(String),

    #[error("video not found ({0})")]
    VideoNotFound(String),

    #[error("player not ready yet")]
    PlayerNotReady,
}
