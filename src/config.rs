//! Centralized configuration for the JWT service.
//!
//! All configuration is loaded from environment variables (optionally seeded
//! from a `.env` file) and validated at startup.

use crate::authority::RevocationFailMode;
use crate::error::TokenError;
use crate::storage::{InMemoryRevocationCache, RedisConfig, RedisRevocationCache, RevocationCache};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Revocation cache backend selection.
#[derive(Debug, Clone)]
pub enum CacheBackend {
    Redis(RedisConfig),
    /// Process-local map; revocations are lost on restart.
    Memory,
}

impl CacheBackend {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory => "memory",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(TokenError::config(format!("Invalid log format: {}", s))),
        }
    }
}

impl FromStr for RevocationFailMode {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(TokenError::config(format!("Invalid revocation fail mode: {}", s))),
        }
    }
}

/// JWT service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing `keys/`
    pub key_store_path: PathBuf,
    /// Token lifetime in minutes
    pub token_lifetime_minutes: u32,
    pub cache: CacheBackend,
    pub fail_mode: RevocationFailMode,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_store_path = match lookup("KEY_STORE_PATH") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => executable_dir()?,
        };

        let token_lifetime_minutes: u32 = parse_env(&lookup, "JWT_TOKEN_EXPIRATION", 15)?;
        if token_lifetime_minutes == 0 {
            return Err(TokenError::config("JWT_TOKEN_EXPIRATION must be at least 1 minute"));
        }

        let cache = match lookup("CACHE_BACKEND")
            .unwrap_or_else(|| "redis".to_string())
            .to_lowercase()
            .as_str()
        {
            "redis" => {
                let defaults = RedisConfig::default();
                CacheBackend::Redis(RedisConfig {
                    address: lookup("REDIS_ADDRESS").unwrap_or(defaults.address),
                    password: lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()),
                    timeout: Duration::from_millis(parse_env(&lookup, "REDIS_TIMEOUT_MS", 2000)?),
                })
            }
            "memory" => CacheBackend::Memory,
            other => return Err(TokenError::config(format!("Invalid CACHE_BACKEND: {}", other))),
        };

        let fail_mode = parse_env(&lookup, "REVOCATION_FAIL_MODE", RevocationFailMode::Open)?;
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_format = parse_env(&lookup, "LOG_FORMAT", LogFormat::Text)?;

        Ok(Self {
            key_store_path,
            token_lifetime_minutes,
            cache,
            fail_mode,
            log_level,
            log_format,
        })
    }

    /// Instantiate the configured cache. It still needs `initialize()`.
    #[must_use]
    pub fn build_cache(&self) -> Arc<dyn RevocationCache> {
        match &self.cache {
            CacheBackend::Redis(redis) => Arc::new(RedisRevocationCache::new(redis.clone())),
            CacheBackend::Memory => Arc::new(InMemoryRevocationCache::new()),
        }
    }
}

/// Parse a variable with a default value.
fn parse_env<T, F>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}

fn executable_dir() -> Result<PathBuf, TokenError> {
    let exe = env::current_exe()
        .map_err(|e| TokenError::config(format!("Cannot resolve executable path: {}", e)))?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or_else(|| TokenError::config("Executable has no parent directory"))
}
