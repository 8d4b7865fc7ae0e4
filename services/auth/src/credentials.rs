//! Durable credential storage
//!
//! The access token, refresh token and cached profile are three entries of a
//! [`KeyValueStore`], always written and removed together.

use common::{KeyValueStore, StoreResult};
use std::sync::Arc;
use tracing::info;

use crate::models::{Credential, Profile};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const PROFILE_KEY: &str = "user";

const ALL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, PROFILE_KEY];

/// Session data read back from storage
#[derive(Clone)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub profile: Option<Profile>,
}

/// Credential store over a durable key-value backend
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a full credential set and its profile
    pub async fn save(&self, credential: &Credential, profile: &Profile) -> StoreResult<()> {
        let profile_json = serde_json::to_string(profile)?;
        self.store
            .set_many(&[
                (ACCESS_TOKEN_KEY, credential.access_token.clone()),
                (REFRESH_TOKEN_KEY, credential.refresh_token.clone()),
                (PROFILE_KEY, profile_json),
            ])
            .await?;

        info!("Stored credentials for {}", profile.email);
        Ok(())
    }

    /// Persist a refreshed access token, and the rotated refresh token if any
    pub async fn save_access(&self, access_token: &str, refresh_token: Option<&str>) -> StoreResult<()> {
        let mut entries = vec![(ACCESS_TOKEN_KEY, access_token.to_string())];
        if let Some(refresh) = refresh_token {
            entries.push((REFRESH_TOKEN_KEY, refresh.to_string()));
        }
        self.store.set_many(&entries).await
    }

    /// Read the stored session
    ///
    /// Returns `None` when no access token is stored.
    pub async fn load(&self) -> StoreResult<Option<StoredSession>> {
        let Some(access_token) = self.store.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await?;
        let profile = match self.store.get(PROFILE_KEY).await? {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(Some(StoredSession {
            access_token,
            refresh_token,
            profile,
        }))
    }

    /// Remove every credential entry
    pub async fn clear(&self) -> StoreResult<()> {
        self.store.delete_many(&ALL_KEYS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryStore;

    fn credential() -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let backend = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(backend.clone());
        let profile = Profile::synthesize("a@b.com", None);

        assert!(store.load().await.unwrap().is_none());

        store.save(&credential(), &profile).await.unwrap();
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.access_token, "access");
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(stored.profile, Some(profile));
        assert_eq!(backend.len().await, 3);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_access_keeps_refresh_without_rotation() {
        let store = CredentialStore::new(Arc::new(MemoryStore::new()));
        store
            .save(&credential(), &Profile::synthesize("a@b.com", None))
            .await
            .unwrap();

        store.save_access("access-2", None).await.unwrap();
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.access_token, "access-2");
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh"));

        store.save_access("access-3", Some("refresh-3")).await.unwrap();
        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-3"));
    }

    #[tokio::test]
    async fn test_corrupt_profile_is_an_error() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(ACCESS_TOKEN_KEY, "access").await.unwrap();
        backend.set(PROFILE_KEY, "{not json").await.unwrap();

        let store = CredentialStore::new(backend);
        assert!(store.load().await.is_err());
    }
}
