//! Authenticated request client
//!
//! Attaches the session's bearer token to every request and recovers from an
//! expired access token with one refresh-and-retry per request. Concurrent
//! 401s share a single refresh call: refreshes are serialized, and a request
//! that waited on the lock reuses whatever the refresh it waited on produced.

use common::{ClientConfig, ClientError, ClientResult};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::context::SessionContext;
use crate::models::{RefreshGrant, RefreshRequest};

/// A request that can be re-issued after a token refresh
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Set once the request has been re-issued after a refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Decode(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// HTTP client bound to one session context
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    context: Arc<SessionContext>,
    refresh_lock: Mutex<()>,
    // Bumped each time a refresh attempt settles, while holding `refresh_lock`.
    refresh_epoch: AtomicU64,
}

impl ApiClient {
    pub fn new(config: ClientConfig, context: Arc<SessionContext>) -> ClientResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::Transport)?;

        info!("API client configured for {}", config.base_url);
        Ok(Self {
            http,
            config,
            context,
            refresh_lock: Mutex::new(()),
            refresh_epoch: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Send an authenticated request and return the response body
    ///
    /// A 401 triggers at most one refresh and one re-issue. If the refresh is
    /// impossible or fails, the original 401 is returned.
    pub async fn send(&self, mut request: ApiRequest) -> ClientResult<String> {
        loop {
            let snapshot = self.context.snapshot().await;
            let response = self
                .dispatch(&request, snapshot.access_token.as_deref())
                .await?;

            if response.status() != StatusCode::UNAUTHORIZED || request.retried {
                return read_body(response).await;
            }

            request.retried = true;
            debug!(
                "{} {} returned 401, refreshing access token",
                request.method, request.path
            );

            if let Err(e) = self.refresh_access_token(snapshot.generation).await {
                warn!("Token refresh failed: {}", e);
                return read_body(response).await;
            }
        }
    }

    /// Send a request without credentials and without the refresh cycle
    pub async fn send_public(&self, request: ApiRequest) -> ClientResult<String> {
        let response = self.dispatch(&request, None).await?;
        read_body(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.send(ApiRequest::get(path)).await?;
        parse_body(&body)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send(ApiRequest::post(path).json(body)?).await?;
        parse_body(&body)
    }

    /// POST without a request body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = self.send(ApiRequest::post(path)).await?;
        parse_body(&body)
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send(ApiRequest::patch(path).json(body)?).await?;
        parse_body(&body)
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    /// Unauthenticated JSON POST used by login, registration and refresh
    pub async fn post_public<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send_public(ApiRequest::post(path).json(body)?).await?;
        parse_body(&body)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> ClientResult<reqwest::Response> {
        let url = self.config.url(&request.path);
        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = bearer.is_some(),
            retried = request.retried,
            "Dispatching request"
        );
        Ok(builder.send().await?)
    }

    /// Obtain a fresh access token after a 401 seen at `stale_generation`
    async fn refresh_access_token(&self, stale_generation: u64) -> ClientResult<String> {
        let observed_epoch = self.refresh_epoch.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // Credentials moved on while we waited: a refresh or login already
        // produced a newer token, or a logout removed it.
        let current = self.context.snapshot().await;
        if current.generation != stale_generation {
            return current
                .access_token
                .ok_or_else(|| ClientError::unauthorized("Session was cleared"));
        }

        // A refresh settled while we waited without changing the credentials,
        // so it failed. Share its outcome instead of calling again.
        if self.refresh_epoch.load(Ordering::Acquire) != observed_epoch {
            return Err(ClientError::unauthorized("Access token refresh failed"));
        }

        let result = self.request_refresh(stale_generation).await;
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn request_refresh(&self, generation: u64) -> ClientResult<String> {
        let refresh = self
            .context
            .refresh_token()
            .await
            .ok_or_else(|| ClientError::unauthorized("No refresh token available"))?;

        info!("Refreshing access token");
        let grant: RefreshGrant = self
            .post_public(
                &self.config.endpoints.refresh,
                &RefreshRequest { refresh: &refresh },
            )
            .await?;

        self.context.install_refreshed(&grant, generation).await
    }
}

async fn read_body(response: reqwest::Response) -> ClientResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::from_status(status, &body))
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    // Bodiless success responses decode as JSON null.
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}
