//! Application state shared by the commands

use anyhow::{Result, bail};
use auth::{ApiClient, Profile, SessionContext, SessionManager};
use common::{ClientConfig, FileStore};
use std::sync::Arc;
use tasks::TaskSynchronizer;

/// Session and task layers wired over one durable store
pub struct AppState {
    pub session: SessionManager,
    pub tasks: TaskSynchronizer,
}

impl AppState {
    /// Build the client stack and restore any stored session
    pub async fn init(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.store_path.clone()));
        let context = Arc::new(SessionContext::new(store));
        let client = Arc::new(ApiClient::new(config, context)?);

        let session = SessionManager::new(client.clone());
        session.restore().await;

        Ok(Self {
            session,
            tasks: TaskSynchronizer::new(client),
        })
    }

    /// Profile of the logged-in user, or an error telling how to log in
    pub fn require_login(&self) -> Result<Profile> {
        match self.session.profile() {
            Some(profile) => Ok(profile),
            None => bail!("Not logged in, run `taskbook login <email>` first"),
        }
    }
}
