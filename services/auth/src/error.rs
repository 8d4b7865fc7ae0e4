//! Session layer errors

use common::{ClientError, StoreError};
use thiserror::Error;

/// Failure of a session operation
#[derive(Error, Debug)]
pub enum SessionError {
    /// Login rejected, unreachable service, or malformed token response
    #[error("Login failed: {0}")]
    Auth(#[source] ClientError),

    /// The registration call itself failed
    #[error("Registration failed: {0}")]
    Registration(#[source] ClientError),

    /// Credentials could not be persisted
    #[error("Failed to store credentials: {0}")]
    Storage(#[from] StoreError),
}

impl SessionError {
    /// Underlying client error, when the failure came from the service
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            SessionError::Auth(e) | SessionError::Registration(e) => Some(e),
            SessionError::Storage(_) => None,
        }
    }
}

/// Type alias for Result with SessionError
pub type SessionResult<T> = Result<T, SessionError>;
