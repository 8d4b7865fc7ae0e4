//! Common library for the Taskbook client
//!
//! This crate provides shared functionality used across the client crates,
//! including configuration, durable key-value storage, error handling, and
//! tracing setup.

pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;

pub use config::{ClientConfig, Endpoints};
pub use error::{ClientError, ClientResult, StoreError, StoreResult};
pub use store::{FileStore, KeyValueStore, MemoryStore};
