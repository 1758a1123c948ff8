//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use jwt_service::keystore::{KeyEntry, KeyStoreRegistry};
use jwt_service::storage::{CacheError, InMemoryRevocationCache, RevocationCache};
use jwt_service::{ClaimsMap, RevocationFailMode, TokenAuthority, TokenService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ACME_PRIVATE: &str = include_str!("../fixtures/keys/acme/key");
pub const ACME_PUBLIC: &str = include_str!("../fixtures/keys/acme/key.pub");
pub const GLOBEX_PRIVATE: &str = include_str!("../fixtures/keys/globex/KEY");
pub const GLOBEX_PUBLIC: &str = include_str!("../fixtures/keys/globex/Key.Pub");

pub fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn registry() -> Arc<KeyStoreRegistry> {
    Arc::new(KeyStoreRegistry::load(fixtures_path()).expect("fixture key store loads"))
}

pub fn authority(cache: Arc<dyn RevocationCache>) -> TokenAuthority {
    TokenAuthority::new(registry(), cache, 15)
}

pub fn memory_authority() -> (Arc<InMemoryRevocationCache>, TokenAuthority) {
    let cache = Arc::new(InMemoryRevocationCache::new());
    (cache.clone(), authority(cache))
}

pub fn failing_authority(fail_mode: RevocationFailMode) -> TokenAuthority {
    authority(Arc::new(FailingCache)).with_fail_mode(fail_mode)
}

pub fn memory_service() -> TokenService {
    TokenService::new(Arc::new(memory_authority().1))
}

pub fn alice() -> ClaimsMap {
    let mut claims = ClaimsMap::new();
    claims.insert("sub".into(), "alice".into());
    claims.insert("grant".into(), "access_token".into());
    claims
}

/// Sign arbitrary claims with acme's private key, bypassing the authority.
pub fn sign_as_acme(claims: &ClaimsMap) -> String {
    let entry = KeyEntry::from_pem("acme", ACME_PRIVATE, ACME_PUBLIC).expect("acme fixture parses");
    encode(&Header::new(Algorithm::RS512), claims, entry.encoding_key()).expect("fixture signing")
}

/// An HS512 token keyed with acme's public PEM, the classic confusion attack.
pub fn hmac_forgery(claims: &ClaimsMap) -> String {
    encode(
        &Header::new(Algorithm::HS512),
        claims,
        &EncodingKey::from_secret(ACME_PUBLIC.as_bytes()),
    )
    .expect("hmac signing")
}

/// Claims with the given expiry, ready for [`sign_as_acme`].
pub fn claims_expiring_at(exp: i64) -> ClaimsMap {
    let mut claims = alice();
    claims.remove("grant");
    claims.insert("type".into(), "access_token".into());
    claims.insert("iat".into(), (exp - 900).into());
    claims.insert("exp".into(), exp.into());
    claims
}

/// Cache whose every operation fails as if Redis were down.
pub struct FailingCache;

#[async_trait]
impl RevocationCache for FailingCache {
    async fn initialize(&self) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".into()))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Connection("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(2000)))
    }

    async fn close(&self) {}

    fn backend(&self) -> &'static str {
        "failing"
    }
}
