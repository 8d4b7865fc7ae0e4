//! Session management
//!
//! [`SessionManager`] drives the authentication state machine:
//!
//! ```text
//! Unknown -> Restoring -> Authenticated | Anonymous
//! Anonymous -> (login) -> Authenticated
//! Authenticated -> (logout) -> Anonymous
//! ```
//!
//! State changes are published on a watch channel so front ends can follow
//! them without polling.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::client::{ApiClient, ApiRequest};
use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult};
use crate::jwt;
use crate::models::{Credential, LoginRequest, Profile, RegisterRequest, TokenPair};

/// Authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup, before `restore` ran
    Unknown,
    /// `restore` in progress
    Restoring,
    Authenticated(Profile),
    Anonymous,
}

impl SessionState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Session view exposed to the rest of the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<Profile>,
    pub authenticated: bool,
}

impl From<&SessionState> for Session {
    fn from(state: &SessionState) -> Self {
        let user = state.profile().cloned();
        Self {
            authenticated: user.is_some(),
            user,
        }
    }
}

/// Session manager for login, registration, logout and restoration
pub struct SessionManager {
    client: Arc<ApiClient>,
    context: Arc<SessionContext>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a session manager over the client's session context
    pub fn new(client: Arc<ApiClient>) -> Self {
        let context = client.context().clone();
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            client,
            context,
            state,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Session {
        Session::from(&*self.state.borrow())
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.borrow().profile().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated(_))
    }

    /// Follow state transitions
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Restore the stored session at startup
    ///
    /// Never fails: any storage problem, or a token without a cached profile,
    /// ends in `Anonymous`. Only the first call does any work, and a login or
    /// logout that completes while it runs takes precedence.
    pub async fn restore(&self) -> SessionState {
        let should_restore = self.state.send_if_modified(|state| {
            if *state == SessionState::Unknown {
                *state = SessionState::Restoring;
                true
            } else {
                false
            }
        });
        if !should_restore {
            debug!("Session already restored");
            return self.state();
        }

        let generation = self.context.generation().await;
        let next = match self.context.load().await {
            Ok(Some(stored)) => match stored.profile.clone() {
                Some(profile) => {
                    if !self.context.attach_if_current(&stored, generation).await {
                        info!("Credentials changed while restoring, keeping the newer session");
                        return self.state();
                    }
                    info!("Restored session for {}", profile.email);
                    SessionState::Authenticated(profile)
                }
                None => {
                    info!("Stored token has no cached profile, starting anonymous");
                    SessionState::Anonymous
                }
            },
            Ok(None) => {
                info!("No stored session");
                SessionState::Anonymous
            }
            Err(e) => {
                warn!("Failed to restore session: {}", e);
                SessionState::Anonymous
            }
        };

        // A login or logout that finished meanwhile already published its state
        self.state.send_if_modified(|state| {
            if *state == SessionState::Restoring {
                *state = next;
                true
            } else {
                false
            }
        });
        self.state()
    }

    /// Log in with email and password
    ///
    /// On failure the state is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<Profile> {
        self.authenticate(email, password, None).await
    }

    /// Create an account, then log into it
    ///
    /// If registration succeeds but the follow-up login fails, the account
    /// exists server-side and the error is reported as a login failure.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> SessionResult<Profile> {
        info!("Registration attempt for user: {}", email);

        let payload = RegisterRequest {
            email,
            password,
            password2: password,
            first_name,
            last_name,
        };
        let request = ApiRequest::post(&self.client.config().endpoints.register)
            .json(&payload)
            .map_err(SessionError::Registration)?;
        self.client
            .send_public(request)
            .await
            .map_err(|e| {
                error!("Registration failed for {}: {}", email, e);
                SessionError::Registration(e)
            })?;

        info!("Account created for {}, logging in", email);
        self.authenticate(email, password, Some((first_name, last_name)))
            .await
            .inspect_err(|e| warn!("Login after registration failed for {}: {}", email, e))
    }

    /// Log out
    ///
    /// Always succeeds from the caller's point of view; storage failures are
    /// only logged.
    pub async fn logout(&self) {
        if let Err(e) = self.context.clear().await {
            warn!("Failed to clear stored credentials: {}", e);
        }
        self.state.send_replace(SessionState::Anonymous);
        info!("Logged out");
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        names: Option<(&str, &str)>,
    ) -> SessionResult<Profile> {
        info!("Login attempt for user: {}", email);

        let tokens: TokenPair = self
            .client
            .post_public(
                &self.client.config().endpoints.login,
                &LoginRequest { email, password },
            )
            .await
            .map_err(|e| {
                error!("Login failed for {}: {}", email, e);
                SessionError::Auth(e)
            })?;

        let mut profile = Profile::synthesize(email, jwt::user_id_from_token(&tokens.access));
        if let Some((first_name, last_name)) = names {
            profile.first_name = first_name.to_string();
            profile.last_name = last_name.to_string();
        }

        self.context
            .save(&Credential::from(tokens), &profile)
            .await?;
        self.state
            .send_replace(SessionState::Authenticated(profile.clone()));

        info!("User {} authenticated", email);
        Ok(profile)
    }
}
