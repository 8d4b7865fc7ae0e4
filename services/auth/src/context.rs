//! Session context shared by the request client and the session manager
//!
//! The context owns the durable [`CredentialStore`] together with the token
//! currently attached to outbound requests. Every credential change goes
//! through here so the stored and attached tokens never diverge, and each
//! change bumps a generation counter that lets the request client tell a
//! stale 401 from one that still needs a refresh.

use common::{ClientError, ClientResult, KeyValueStore, StoreResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credentials::{CredentialStore, StoredSession};
use crate::models::{Credential, Profile, RefreshGrant};

/// Lifecycle of the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPhase {
    /// Created at startup, nothing attached yet
    Init,
    /// Credentials attached by login or restore
    Configured,
    /// Credentials removed by logout
    Cleared,
}

/// Token attached to requests at a given generation
#[derive(Clone)]
pub struct TokenSnapshot {
    pub access_token: Option<String>,
    pub generation: u64,
}

struct Attached {
    access_token: Option<String>,
    refresh_token: Option<String>,
    generation: u64,
    phase: ContextPhase,
}

impl Attached {
    fn replace(&mut self, access: Option<String>, refresh: Option<String>, phase: ContextPhase) {
        self.access_token = access;
        self.refresh_token = refresh;
        self.generation += 1;
        self.phase = phase;
    }
}

/// Shared session context
pub struct SessionContext {
    credentials: CredentialStore,
    attached: RwLock<Attached>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            credentials: CredentialStore::new(store),
            attached: RwLock::new(Attached {
                access_token: None,
                refresh_token: None,
                generation: 0,
                phase: ContextPhase::Init,
            }),
        }
    }

    pub async fn snapshot(&self) -> TokenSnapshot {
        let attached = self.attached.read().await;
        TokenSnapshot {
            access_token: attached.access_token.clone(),
            generation: attached.generation,
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.attached.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.attached.read().await.refresh_token.clone()
    }

    pub async fn phase(&self) -> ContextPhase {
        self.attached.read().await.phase
    }

    pub async fn generation(&self) -> u64 {
        self.attached.read().await.generation
    }

    /// Read the durable session without attaching it
    pub async fn load(&self) -> StoreResult<Option<StoredSession>> {
        self.credentials.load().await
    }

    /// Persist credentials and attach the access token
    pub async fn save(&self, credential: &Credential, profile: &Profile) -> StoreResult<()> {
        let mut attached = self.attached.write().await;
        self.credentials.save(credential, profile).await?;
        attached.replace(
            Some(credential.access_token.clone()),
            Some(credential.refresh_token.clone()),
            ContextPhase::Configured,
        );
        debug!("Credentials attached at generation {}", attached.generation);
        Ok(())
    }

    /// Attach previously stored credentials without writing them again
    pub async fn attach(&self, stored: &StoredSession) {
        let mut attached = self.attached.write().await;
        attached.replace(
            Some(stored.access_token.clone()),
            stored.refresh_token.clone(),
            ContextPhase::Configured,
        );
        debug!("Restored credentials attached at generation {}", attached.generation);
    }

    /// Attach stored credentials unless the context moved past `expected_generation`
    ///
    /// Returns false, leaving the context untouched, when another change
    /// such as a login landed while the stored session was being read.
    pub async fn attach_if_current(&self, stored: &StoredSession, expected_generation: u64) -> bool {
        let mut attached = self.attached.write().await;
        if attached.generation != expected_generation {
            return false;
        }
        attached.replace(
            Some(stored.access_token.clone()),
            stored.refresh_token.clone(),
            ContextPhase::Configured,
        );
        debug!("Restored credentials attached at generation {}", attached.generation);
        true
    }

    /// Install a refreshed access token obtained at `expected_generation`
    ///
    /// The grant is discarded when the credentials changed in the meantime,
    /// for instance because of a logout while the refresh was in flight.
    pub async fn install_refreshed(
        &self,
        grant: &RefreshGrant,
        expected_generation: u64,
    ) -> ClientResult<String> {
        let mut attached = self.attached.write().await;
        if attached.generation != expected_generation || attached.phase != ContextPhase::Configured {
            info!("Discarding refreshed token, session changed during refresh");
            return Err(ClientError::unauthorized(
                "Session changed while the access token was being refreshed",
            ));
        }

        self.credentials
            .save_access(&grant.access, grant.refresh.as_deref())
            .await?;

        let refresh = grant
            .refresh
            .clone()
            .or_else(|| attached.refresh_token.take());
        attached.replace(Some(grant.access.clone()), refresh, ContextPhase::Configured);
        debug!("Refreshed token attached at generation {}", attached.generation);
        Ok(grant.access.clone())
    }

    /// Detach and remove all credentials
    ///
    /// The attached token is dropped before storage is touched, so a storage
    /// failure never leaves requests carrying a token the user logged out of.
    pub async fn clear(&self) -> StoreResult<()> {
        {
            let mut attached = self.attached.write().await;
            attached.replace(None, None, ContextPhase::Cleared);
        }
        self.credentials.clear().await
    }
}
