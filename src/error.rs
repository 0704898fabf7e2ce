//! Error taxonomy for the request path.
//!
//! Startup, configuration, and CLI code use `anyhow`. The two components
//! on the request path return these typed errors so the HTTP layer can
//! map them to status codes without inspecting message text.
//!
//! Generation failures are deliberately absent: the model capability
//! reports them as [`GenerationOutcome::Degraded`](crate::models::GenerationOutcome)
//! instead of failing the request.

use thiserror::Error;

/// Failure of an evidence lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// The query was empty. Raised before any network call.
    #[error("query must not be empty")]
    InvalidQuery,

    /// The search call could not be completed (network error, non-success
    /// status, or malformed response).
    #[error("{0}")]
    Unavailable(String),
}

/// Failure of one orchestrated fact-check turn.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// The user utterance was unusable (e.g. empty).
    #[error("{0}")]
    InvalidInput(String),

    /// Evidence retrieval failed; the turn cannot proceed.
    #[error("{0}")]
    ServiceUnavailable(String),
}
