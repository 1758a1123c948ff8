//! Revocation cache abstraction.
//!
//! The authority only needs four operations from the blacklist store, so
//! backends are swappable at startup: Redis in production, an in-process map
//! for tests and single-node deployments.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use self::memory::InMemoryRevocationCache;
pub use self::redis::{RedisConfig, RedisRevocationCache};

/// Errors reported by a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Revocation cache not initialized")]
    NotInitialized,

    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid TTL: entries must expire after at least one second")]
    InvalidTtl,

    #[error("Cache backend error: {0}")]
    Backend(String),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

/// Key/value store with per-entry expiry used as the token blacklist.
#[async_trait]
pub trait RevocationCache: Send + Sync {
    /// Establish the backing connection. Calling it again is a no-op.
    async fn initialize(&self) -> Result<(), CacheError>;

    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl`. A zero TTL is rejected.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Release the connection. Subsequent calls fail with `NotInitialized`.
    async fn close(&self);

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}

pub(crate) fn ttl_seconds(ttl: Duration) -> Result<u64, CacheError> {
    match ttl.as_secs() {
        0 => Err(CacheError::InvalidTtl),
        secs => Ok(secs),
    }
}
