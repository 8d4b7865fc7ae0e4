//! Access token claim decoding
//!
//! The client holds no verification key, so claims are read without checking
//! the signature. They are used for display purposes only (the profile id);
//! the server remains the only authority on token validity.

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Deserializer};

/// Claims carried by the service's access tokens
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// User ID
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
    /// Token type (access or refresh)
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expiration time
    #[serde(default)]
    pub exp: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawId::Number(id)) => Some(id),
        Some(RawId::Text(text)) => text.parse().ok(),
        None => None,
    })
}

/// Read the claims of a token without verifying it
pub fn decode_unverified(token: &str) -> jsonwebtoken::errors::Result<AccessClaims> {
    let header = decode_header(token)?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(token_data.claims)
}

/// User id embedded in an access token, if the token is a readable JWT
pub fn user_id_from_token(token: &str) -> Option<i64> {
    decode_unverified(token).ok().and_then(|claims| claims.user_id)
}
