//! Session layer models

pub mod session;
pub mod user;

// Re-export for convenience
pub use session::{Credential, RefreshGrant, RefreshRequest, TokenPair};
pub use user::{LoginRequest, Profile, RegisterRequest};
