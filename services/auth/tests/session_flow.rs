//! Integration tests for login, registration, restoration and logout

use async_trait::async_trait;
use auth::{
    ApiClient, ContextPhase, Credential, Profile, SessionContext, SessionError, SessionManager,
    SessionState,
};
use common::{
    ClientConfig, ClientError, FileStore, KeyValueStore, MemoryStore, StoreError, StoreResult,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager_over(server: &MockServer, store: Arc<dyn KeyValueStore>) -> SessionManager {
    let context = Arc::new(SessionContext::new(store));
    let client = ApiClient::new(ClientConfig::for_base_url(server.uri()), context).unwrap();
    SessionManager::new(Arc::new(client))
}

fn access_token_for(user_id: i64) -> String {
    encode(
        &Header::default(),
        &json!({"token_type": "access", "exp": 4102444800u64, "user_id": user_id}),
        &EncodingKey::from_secret(b"server-secret"),
    )
    .unwrap()
}

async fn mount_login(server: &MockServer, email: &str, password: &str, access: &str) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"email": email, "password": password})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": access, "refresh": "refresh-1"})),
        )
        .mount(server)
        .await;
}

/// Store that accepts writes but cannot delete anything
struct UndeletableStore {
    inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for UndeletableStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        self.inner.set_many(entries).await
    }

    async fn delete_many(&self, _keys: &[&str]) -> StoreResult<()> {
        Err(StoreError::Backend("keychain locked".to_string()))
    }
}

/// Store whose reads return only after a delay
struct SlowStore {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl KeyValueStore for SlowStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self.inner.get(key).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        value
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        self.inner.set_many(entries).await
    }

    async fn delete_many(&self, keys: &[&str]) -> StoreResult<()> {
        self.inner.delete_many(keys).await
    }
}

#[tokio::test]
async fn test_restore_without_stored_session_is_anonymous() {
    let server = MockServer::start().await;
    let manager = manager_over(&server, Arc::new(MemoryStore::new()));

    assert_eq!(manager.state(), SessionState::Unknown);
    assert_eq!(manager.restore().await, SessionState::Anonymous);
    assert!(!manager.is_authenticated());
    assert!(manager.session().user.is_none());
}

#[tokio::test]
async fn test_login_then_restore_in_new_process() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let token = access_token_for(42);
    mount_login(&server, "ann@example.com", "s3cret", &token).await;

    let dir = TempDir::new()?;
    let store_path = dir.path().join("session.json");

    let first = manager_over(&server, Arc::new(FileStore::new(&store_path)));
    first.restore().await;
    let profile = first.login("ann@example.com", "s3cret").await?;
    assert_eq!(profile.id, 42);
    assert_eq!(profile.first_name, "Ann");
    assert_eq!(profile.last_name, "User");
    assert_eq!(first.state(), SessionState::Authenticated(profile.clone()));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());

    let second = manager_over(&server, Arc::new(FileStore::new(&store_path)));
    let restored = second.restore().await;
    assert_eq!(restored, SessionState::Authenticated(profile));

    let session = second.session();
    assert!(session.authenticated);
    assert_eq!(session.user.unwrap().email, "ann@example.com");
    Ok(())
}

#[tokio::test]
async fn test_restore_runs_once() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ann@example.com", "s3cret", "opaque").await;
    let manager = manager_over(&server, Arc::new(MemoryStore::new()));

    assert_eq!(manager.restore().await, SessionState::Anonymous);
    manager.login("ann@example.com", "s3cret").await?;

    // A late second restore leaves the logged-in state alone.
    assert!(matches!(manager.restore().await, SessionState::Authenticated(_)));
    Ok(())
}

#[tokio::test]
async fn test_login_during_slow_restore_wins() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let fresh = access_token_for(7);
    mount_login(&server, "new@example.com", "s3cret", &fresh).await;

    let inner = Arc::new(MemoryStore::new());
    SessionContext::new(inner.clone())
        .save(
            &Credential {
                access_token: "old-access".to_string(),
                refresh_token: "old-refresh".to_string(),
            },
            &Profile::synthesize("old@example.com", Some(3)),
        )
        .await?;

    let context = Arc::new(SessionContext::new(Arc::new(SlowStore {
        inner: inner.clone(),
    })));
    let client = ApiClient::new(ClientConfig::for_base_url(server.uri()), context.clone())?;
    let manager = Arc::new(SessionManager::new(Arc::new(client)));

    let restoring = tokio::spawn({
        let manager = manager.clone();
        async move { manager.restore().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let profile = manager.login("new@example.com", "s3cret").await?;

    let restored = restoring.await?;
    assert_eq!(restored, SessionState::Authenticated(profile.clone()));
    assert_eq!(manager.state(), SessionState::Authenticated(profile));
    assert_eq!(context.access_token().await.as_deref(), Some(fresh.as_str()));
    assert_eq!(context.refresh_token().await.as_deref(), Some("refresh-1"));
    Ok(())
}

#[tokio::test]
async fn test_failed_login_leaves_state_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "No active account found with the given credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let manager = manager_over(&server, store.clone());
    manager.restore().await;

    let result = manager.login("ann@example.com", "wrong").await;
    match result {
        Err(SessionError::Auth(ClientError::Auth { status, message })) => {
            assert_eq!(status, 401);
            assert_eq!(message, "No active account found with the given credentials");
        }
        other => panic!("expected login failure, got {:?}", other),
    }
    assert_eq!(manager.state(), SessionState::Anonymous);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_token_response_is_login_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "x"})))
        .mount(&server)
        .await;

    let manager = manager_over(&server, Arc::new(MemoryStore::new()));
    manager.restore().await;

    let result = manager.login("ann@example.com", "s3cret").await;
    assert!(matches!(
        result,
        Err(SessionError::Auth(ClientError::Decode(_)))
    ));
    assert_eq!(manager.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_register_then_login() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "email": "bob@example.com",
            "password": "pw12345678",
            "password2": "pw12345678",
            "first_name": "Bob",
            "last_name": "Stone"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"email": "bob@example.com"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_login(&server, "bob@example.com", "pw12345678", &access_token_for(7)).await;

    let manager = manager_over(&server, Arc::new(MemoryStore::new()));
    manager.restore().await;
    let profile = manager
        .register("bob@example.com", "pw12345678", "Bob", "Stone")
        .await?;

    assert_eq!(profile.id, 7);
    assert_eq!(profile.display_name(), "Bob Stone");
    assert_eq!(manager.profile(), Some(profile));
    Ok(())
}

#[tokio::test]
async fn test_rejected_registration_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"email": ["user with this email already exists."]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_over(&server, Arc::new(MemoryStore::new()));
    manager.restore().await;

    let result = manager
        .register("bob@example.com", "pw12345678", "Bob", "Stone")
        .await;
    match result {
        Err(SessionError::Registration(ClientError::Validation { message, .. })) => {
            assert_eq!(message, "email: user with this email already exists.");
        }
        other => panic!("expected registration failure, got {:?}", other),
    }
    assert_eq!(manager.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn test_logout_clears_storage_and_state() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ann@example.com", "s3cret", "opaque").await;

    let store = Arc::new(MemoryStore::new());
    let manager = manager_over(&server, store.clone());
    manager.restore().await;
    manager.login("ann@example.com", "s3cret").await?;
    assert!(!store.is_empty().await);

    let mut updates = manager.subscribe();
    manager.logout().await;

    assert_eq!(manager.state(), SessionState::Anonymous);
    assert!(updates.has_changed()?);
    assert_eq!(*updates.borrow_and_update(), SessionState::Anonymous);
    assert!(store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_logout_survives_storage_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_login(&server, "ann@example.com", "s3cret", "opaque").await;

    let store = Arc::new(UndeletableStore {
        inner: MemoryStore::new(),
    });
    let context = Arc::new(SessionContext::new(store));
    let client = Arc::new(ApiClient::new(
        ClientConfig::for_base_url(server.uri()),
        context.clone(),
    )?);
    let manager = SessionManager::new(client);
    manager.restore().await;
    manager.login("ann@example.com", "s3cret").await?;

    manager.logout().await;

    assert_eq!(manager.state(), SessionState::Anonymous);
    assert_eq!(context.phase().await, ContextPhase::Cleared);
    assert!(context.access_token().await.is_none());
    Ok(())
}
