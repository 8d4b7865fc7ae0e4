//! Authenticated session layer for the Taskbook client
//!
//! Credential storage, the shared session context, the request client that
//! attaches and refreshes bearer tokens, and the session state machine.

pub mod client;
pub mod context;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod models;
pub mod session;

pub use client::{ApiClient, ApiRequest};
pub use context::{ContextPhase, SessionContext, TokenSnapshot};
pub use credentials::{CredentialStore, StoredSession};
pub use error::{SessionError, SessionResult};
pub use models::{Credential, Profile};
pub use session::{Session, SessionManager, SessionState};
