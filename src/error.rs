//! Error types for Hazardwatch.

use thiserror::Error;

use crate::model::HazardType;

/// Failure of a single upstream fetch attempt.
///
/// Every transport, status and decoding failure is converted into one of these
/// at the adapter boundary. The feed cache absorbs them; they never reach the
/// aggregator's callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("malformed payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

/// Failure of [`Aggregator::select_event`](crate::aggregator::Aggregator::select_event).
///
/// This is a caller error (a stale selection), not a transport fault. Callers
/// should re-fetch the list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("{hazard_type} event '{id}' is not in the most recent fetch")]
    NotFound { hazard_type: HazardType, id: String },
}
