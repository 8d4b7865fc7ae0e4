//! Credential and token response models

use serde::{Deserialize, Serialize};

/// Access/refresh token pair as stored on the device
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens never show up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Response of the login endpoint
#[derive(Clone, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub access: String,
    #[serde(alias = "refreshToken", alias = "refresh_token")]
    pub refresh: String,
}

impl From<TokenPair> for Credential {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
        }
    }
}

/// Request for token refresh
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of the refresh endpoint
///
/// `refresh` is present when the server rotates refresh tokens.
#[derive(Clone, Deserialize)]
pub struct RefreshGrant {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub access: String,
    #[serde(default, alias = "refreshToken", alias = "refresh_token")]
    pub refresh: Option<String>,
}
