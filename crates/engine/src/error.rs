//! Errors the client core can return.
//!
//! - [`RequestFailed`] wraps any failure of the remote API, whatever its
//!   cause (transport, HTTP status, decoding). Callers treat them uniformly.
//! - [`InvalidState`] is returned when an operation is attempted in a state
//!   that does not allow it (e.g. saving while a request is in flight).
//! - [`MissingId`] is returned when an operation needs a persisted entity.
//!
//!  [`RequestFailed`]: EngineError::RequestFailed
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`MissingId`]: EngineError::MissingId
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("request failed: {0}")]
    RequestFailed(#[source] BoxError),
    #[error("operation not allowed while {0}")]
    InvalidState(&'static str),
    #[error("{0} has no identifier")]
    MissingId(&'static str),
}

impl EngineError {
    pub fn request_failed<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::RequestFailed(err.into())
    }
}
