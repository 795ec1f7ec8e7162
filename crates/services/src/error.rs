//! Shared error types for the services crate.

use thiserror::Error;

use ritual_core::model::QuestionError;

/// Errors that make a session impossible to start (fatal to the ritual).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question request failed")]
    Http(#[from] reqwest::Error),
    #[error("question service answered with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question service yielded {got} questions, need {need}")]
    TooFew { got: usize, need: usize },
    #[error(transparent)]
    Invalid(#[from] QuestionError),
}

/// Errors from the attempt-start endpoint. Never fatal: the identity manager
/// degrades to a locally synthesized attempt id.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt request failed")]
    Http(#[from] reqwest::Error),
    #[error("attempt service answered with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("attempt response carried no identifier")]
    MissingId,
}

/// Errors from the completion endpoint. Never fatal: logged, and the other
/// channel is still attempted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("completion request failed")]
    Http(#[from] reqwest::Error),
    #[error("completion service answered with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("completion payload could not be encoded")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the optional host platform surface. Silent/cosmetic: every
/// call site guards and swallows these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("host platform unavailable")]
    Unavailable,
    #[error("host send failed: {0}")]
    Send(String),
}

/// Errors emitted by the session state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("no questions available for session")]
    Empty,
    #[error("option display index {index} is out of range")]
    InvalidOption { index: usize },
    #[error("selection is locked after resolution")]
    Locked,
}
