//! Multi-client JWT authority.
//!
//! Each registered client owns an RSA key pair loaded from
//! `<base>/keys/<client>/{key,key.pub}`. Tokens are signed with RS512 under
//! the client's private key, verified against its public key, and revoked by
//! placing the exact token string on a TTL-bound blacklist.
//!
//! - [`keystore`]: per-client key pairs and the guarded one-time loader
//! - [`authority`]: generate, validate and destroy
//! - [`storage`]: the revocation cache trait with Redis and in-memory backends
//! - [`service`]: request-level facade returning [`api`] payloads

#![forbid(unsafe_code)]

pub mod api;
pub mod authority;
pub mod config;
pub mod error;
pub mod jwt;
pub mod keystore;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod tracing_config;

pub use authority::{IssuedToken, RevocationCheck, RevocationFailMode, TokenAuthority, ValidatedToken};
pub use config::Config;
pub use error::{ErrorCode, TokenError};
pub use jwt::{ClaimValue, ClaimsMap};
pub use keystore::{KeyStoreLoader, KeyStoreRegistry};
pub use service::TokenService;
pub use storage::{CacheError, InMemoryRevocationCache, RedisRevocationCache, RevocationCache};
