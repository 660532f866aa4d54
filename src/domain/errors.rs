use crate::domain::entities::ListKind;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single call against the Remote Key Service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No response was obtained (DNS, connect, reset, ...).
    #[error("Network error: {0}")]
    Transport(String),
    /// Non-success status. `message` is the server's `detail`/`message`/`error`
    /// field, the raw body, or `HTTP error! status: N`.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Success status but the payload does not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a user-initiated mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("No {0} keys selected")]
    EmptySelection(ListKind),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

pub type MutationResult<T> = Result<T, MutationError>;
