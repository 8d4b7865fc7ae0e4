//! Profile model and login/registration payloads

use serde::{Deserialize, Serialize};

/// Placeholder id used when the access token carries no usable `user_id`
pub const PLACEHOLDER_USER_ID: i64 = 1;

/// Placeholder surname for profiles synthesized at login
pub const PLACEHOLDER_LAST_NAME: &str = "User";

/// User profile as cached on the device and embedded in tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Profile {
    /// Build a local profile from the email used to log in
    ///
    /// The login endpoint returns tokens only, so the display name is derived
    /// from the email's local part with its first letter upper-cased.
    pub fn synthesize(email: &str, user_id: Option<i64>) -> Self {
        let local_part = email.split('@').next().unwrap_or_default();
        Self {
            id: user_id.unwrap_or(PLACEHOLDER_USER_ID),
            email: email.to_string(),
            first_name: capitalize(local_part),
            last_name: PLACEHOLDER_LAST_NAME.to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// User login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// New account payload
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Confirmation field required by the registration endpoint
    pub password2: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}
