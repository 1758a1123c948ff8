use super::{ttl_seconds, CacheError, RevocationCache};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `host:port` or a full `redis://` URL
    pub address: String,
    /// Optional AUTH password
    pub password: Option<String>,
    /// Upper bound for every command, connection included
    pub timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_string(),
            password: None,
            timeout: Duration::from_secs(2),
        }
    }
}

impl RedisConfig {
    /// Connection URL with the password folded in.
    #[must_use]
    pub fn url(&self) -> String {
        let host = self
            .address
            .strip_prefix("redis://")
            .unwrap_or(&self.address);

        match self.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => format!("redis://:{}@{}", password, host),
            None => format!("redis://{}", host),
        }
    }
}

pub struct RedisRevocationCache {
    config: RedisConfig,
    conn: RwLock<Option<ConnectionManager>>,
}

impl RedisRevocationCache {
    /// Create the cache. No connection is made until `initialize`.
    #[must_use]
    pub fn new(config: RedisConfig) -> Self {
        RedisRevocationCache {
            config,
            conn: RwLock::new(None),
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.conn
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(CacheError::NotInitialized)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout(self.config.timeout))?
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl RevocationCache for RedisRevocationCache {
    async fn initialize(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.write().await;
        if conn.is_some() {
            return Ok(());
        }

        let client = redis::Client::open(self.config.url())
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        let manager = self.bounded(ConnectionManager::new(client)).await?;

        info!(address = %self.config.address, "Connected to Redis");
        *conn = Some(manager);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let secs = ttl_seconds(ttl)?;
        let mut conn = self.connection().await?;

        // SET EX keeps value and expiry in one command.
        self.bounded(conn.set_ex::<_, _, ()>(key, value, secs)).await
    }

    async fn close(&self) {
        if self.conn.write().await.take().is_some() {
            debug!("Redis connection released");
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_without_password() {
        let config = RedisConfig::default();
        assert_eq!(config.url(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn test_url_with_password() {
        let config = RedisConfig {
            address: "redis://cache.internal:6380".to_string(),
            password: Some("s3cret".to_string()),
            ..RedisConfig::default()
        };
        assert_eq!(config.url(), "redis://:s3cret@cache.internal:6380");
    }

    #[test]
    fn test_empty_password_ignored() {
        let config = RedisConfig {
            password: Some(String::new()),
            ..RedisConfig::default()
        };
        assert_eq!(config.url(), "redis://127.0.0.1:6379");
    }

    #[tokio::test]
    async fn test_operations_before_initialize() {
        let cache = RedisRevocationCache::new(RedisConfig::default());

        assert!(matches!(cache.get("token").await, Err(CacheError::NotInitialized)));
        assert!(matches!(
            cache.set("token", "token", Duration::from_secs(60)).await,
            Err(CacheError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected_before_connecting() {
        let cache = RedisRevocationCache::new(RedisConfig::default());
        let result = cache.set("token", "token", Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::InvalidTtl)));
    }
}
