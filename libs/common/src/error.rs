//! Custom error types for the common library
//!
//! This module defines the error taxonomy shared by every client crate:
//! transport failures, HTTP failures classified by status, and local
//! storage and configuration failures.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Error type for durable key-value storage
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error occurred while reading or writing the backing file
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for calls against the remote task service
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received (connection failure, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401/403 that the refresh cycle could not resolve
    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Any other 4xx
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 5xx, or any status the client does not expect
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A successful response whose body has an unexpected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Durable storage failure
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Classify a failing HTTP response by status code.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = describe_error_body(status, body);
        let status = status.as_u16();
        match status {
            401 | 403 => ClientError::Auth { status, message },
            400..=499 => ClientError::Validation { status, message },
            _ => ClientError::Server { status, message },
        }
    }

    /// An authentication failure raised locally rather than by the server.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ClientError::Auth {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            message: message.into(),
        }
    }

    /// HTTP status attached to this error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Auth { status, .. }
            | ClientError::Validation { status, .. }
            | ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }
}

/// Extract a human readable message from a failing response body.
///
/// The service answers with `{"detail": ...}`, `{"error": ...}`, field error
/// maps such as `{"email": ["already taken"]}`, or a bare list of strings.
/// Anything else falls back to a generic message naming the status.
pub fn describe_error_body(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| detail_from_value(&value))
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()))
}

fn detail_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(detail_from_value).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(detail) = map.get(key).and_then(detail_from_value) {
                    return Some(detail);
                }
            }

            let parts: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| {
                    detail_from_value(v).map(|detail| {
                        if field == "non_field_errors" {
                            detail
                        } else {
                            format!("{}: {}", field, detail)
                        }
                    })
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, ""),
            ClientError::Auth { status: 401, .. }
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::FORBIDDEN, ""),
            ClientError::Auth { status: 403, .. }
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, ""),
            ClientError::Validation { status: 404, .. }
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, ""),
            ClientError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn test_detail_field_is_preferred() {
        let body = r#"{"detail": "Given token not valid for any token type", "code": "token_not_valid"}"#;
        assert_eq!(
            describe_error_body(StatusCode::UNAUTHORIZED, body),
            "Given token not valid for any token type"
        );
    }

    #[test]
    fn test_field_errors_are_joined() {
        let body = r#"{"email": ["user with this email already exists."], "non_field_errors": ["Passwords don't match"]}"#;
        let message = describe_error_body(StatusCode::BAD_REQUEST, body);
        assert!(message.contains("email: user with this email already exists."));
        assert!(message.contains("Passwords don't match"));
    }

    #[test]
    fn test_string_list_body() {
        let body = r#"["Пользователь с email r@x.com не найден"]"#;
        assert_eq!(
            describe_error_body(StatusCode::BAD_REQUEST, body),
            "Пользователь с email r@x.com не найден"
        );
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(
            describe_error_body(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "request failed with status 500"
        );
        assert_eq!(
            describe_error_body(StatusCode::BAD_REQUEST, "{}"),
            "request failed with status 400"
        );
    }
}
