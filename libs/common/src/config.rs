//! Client configuration
//!
//! Configuration is layered with the `config` crate: built-in defaults, then
//! an optional file named by `TASKBOOK_CONFIG`, then `TASKBOOK_*` environment
//! variables. Nested keys use a double underscore, e.g.
//! `TASKBOOK_ENDPOINTS__LOGIN=/users/token/`.

use config::{Config, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "TASKBOOK_CONFIG";

const ENV_PREFIX: &str = "TASKBOOK";

/// Remote service paths, relative to `base_url`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub register: String,
    pub login: String,
    pub refresh: String,
    pub tasks: String,
    pub tasks_mine: String,
    /// Also the target of task creation
    pub tasks_created: String,
    pub tasks_completed: String,
    /// Template with an `{id}` placeholder
    pub task_detail: String,
    /// Template with an `{id}` placeholder
    pub task_complete: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            register: "/register".to_string(),
            login: "/login".to_string(),
            refresh: "/refresh".to_string(),
            tasks: "/tasks".to_string(),
            tasks_mine: "/tasks/mine".to_string(),
            tasks_created: "/tasks/created".to_string(),
            tasks_completed: "/tasks/completed".to_string(),
            task_detail: "/tasks/{id}".to_string(),
            task_complete: "/tasks/{id}/complete".to_string(),
        }
    }
}

impl Endpoints {
    pub fn task_detail(&self, id: i64) -> String {
        self.task_detail.replace("{id}", &id.to_string())
    }

    pub fn task_complete(&self, id: i64) -> String {
        self.task_complete.replace("{id}", &id.to_string())
    }
}

/// Client configuration struct
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL of the task service
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Location of the durable credential file
    pub store_path: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            store_path: default_store_path(),
            log_filter: "info".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

fn default_store_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskbook")
        .join("session.json")
}

impl ClientConfig {
    /// Load configuration from defaults, the optional file named by
    /// `TASKBOOK_CONFIG`, and `TASKBOOK_*` environment variables
    pub fn load() -> ClientResult<Self> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Load configuration with an explicit optional file layer
    pub fn load_from(file: Option<&Path>) -> ClientResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ClientConfig = builder
            .build()
            .and_then(Config::try_deserialize::<ClientConfig>)
            .map_err(|e| ClientError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is usable
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Absolute URL for a service path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configuration pointing at `base_url` with everything else defaulted
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
