//! Token authority: issues, validates and revokes per-client RS512 tokens.

use crate::error::TokenError;
use crate::jwt::claims::{CLAIM_EXPIRES_AT, CLAIM_EXPIRES_IN, CLAIM_ISSUED_AT};
use crate::jwt::{issue_claims, remaining_seconds, revocation_ttl, ClaimValue, ClaimsMap, JwtSerializer};
use crate::keystore::{KeyEntry, KeyStoreRegistry};
use crate::metrics;
use crate::storage::RevocationCache;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// What validation does when the blacklist cannot be consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationFailMode {
    /// Continue with signature checks and flag the result as unchecked.
    #[default]
    Open,
    /// Reject the validation with `CacheUnavailable`.
    Closed,
}

/// Whether the blacklist was actually consulted for a validated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationCheck {
    Clear,
    Unavailable,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: ClaimsMap,
    pub expires_in: u64,
}

/// Claims of a token that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    /// Caller-facing claims: `iat` dropped, `exp` replaced by `expires_in`.
    pub claims: ClaimsMap,
    pub revocation: RevocationCheck,
}

pub struct TokenAuthority {
    registry: Arc<KeyStoreRegistry>,
    cache: Arc<dyn RevocationCache>,
    serializer: JwtSerializer,
    token_lifetime: Duration,
    fail_mode: RevocationFailMode,
    /// Clients whose key failed to sign; refused until restart.
    disabled: RwLock<HashSet<String>>,
}

impl TokenAuthority {
    /// `token_lifetime_minutes` applies to every issued token.
    pub fn new(
        registry: Arc<KeyStoreRegistry>,
        cache: Arc<dyn RevocationCache>,
        token_lifetime_minutes: u32,
    ) -> Self {
        TokenAuthority {
            registry,
            cache,
            serializer: JwtSerializer::new(),
            token_lifetime: Duration::from_secs(u64::from(token_lifetime_minutes) * 60),
            fail_mode: RevocationFailMode::default(),
            disabled: RwLock::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_fail_mode(mut self, fail_mode: RevocationFailMode) -> Self {
        self.fail_mode = fail_mode;
        self
    }

    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    #[must_use]
    pub fn registry(&self) -> &KeyStoreRegistry {
        &self.registry
    }

    /// True once a signing failure has taken the client out of service.
    #[must_use]
    pub fn is_client_disabled(&self, client_id: &str) -> bool {
        self.disabled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(client_id)
    }

    fn disable_client(&self, client_id: &str) {
        self.disabled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client_id.to_string());
    }

    fn lookup(&self, client_id: &str) -> Result<&KeyEntry, TokenError> {
        let entry = self
            .registry
            .lookup(client_id)
            .ok_or_else(|| TokenError::ClientUnknown(client_id.to_string()))?;

        if self.is_client_disabled(client_id) {
            return Err(TokenError::ClientDisabled(client_id.to_string()));
        }
        Ok(entry)
    }

    /// Sign `claims` with the client's private key.
    ///
    /// A signing failure means the loaded key is corrupt. The client is
    /// disabled for the rest of the process lifetime and every later request
    /// for it fails with `ClientDisabled`.
    #[instrument(skip(self, claims))]
    pub fn generate_token(&self, claims: ClaimsMap, client_id: &str) -> Result<IssuedToken, TokenError> {
        let entry = self.lookup(client_id)?;

        let expires_in = self.token_lifetime.as_secs();
        let issued_at = Utc::now().timestamp();
        let claims = issue_claims(claims, issued_at, issued_at + expires_in as i64);

        let token = self
            .serializer
            .serialize(&claims, entry.encoding_key())
            .map_err(|e| {
                error!(client_id = %client_id, error = %e, "Error signing the token, disabling client");
                self.disable_client(client_id);
                TokenError::SigningFailed {
                    client_id: client_id.to_string(),
                    reason: e.to_string(),
                }
            })?;

        metrics::record_token_issued(client_id);
        debug!(expires_in, "Token issued");

        Ok(IssuedToken {
            token,
            claims,
            expires_in,
        })
    }

    /// True when the exact token string is on the blacklist.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, TokenError> {
        match self.cache.get(token).await {
            Ok(found) => {
                metrics::record_cache_operation("get", "ok");
                Ok(found.is_some())
            }
            Err(e) => {
                metrics::record_cache_operation("get", "error");
                Err(e.into())
            }
        }
    }

    /// Verify the token against the client's public key, without the blacklist.
    pub fn parse_token(&self, token: &str, client_id: &str) -> Result<ClaimsMap, TokenError> {
        let entry = self.lookup(client_id)?;
        self.serializer.deserialize(token, entry.decoding_key())
    }

    /// Full validation: client, blacklist, algorithm, signature and expiry.
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str, client_id: &str) -> Result<ValidatedToken, TokenError> {
        let entry = match self.lookup(client_id) {
            Ok(entry) => entry,
            Err(e) => {
                let outcome = match e {
                    TokenError::ClientDisabled(_) => "client_disabled",
                    _ => "unknown_client",
                };
                metrics::record_validation(outcome);
                return Err(e);
            }
        };

        let revocation = match self.is_revoked(token).await {
            Ok(true) => {
                metrics::record_validation("revoked");
                debug!("Token found in blacklist");
                return Err(TokenError::RevokedToken);
            }
            Ok(false) => RevocationCheck::Clear,
            Err(e) => {
                metrics::record_validation("cache_degraded");
                match self.fail_mode {
                    RevocationFailMode::Open => {
                        warn!(error = %e, "Blacklist check unavailable, validating signature only");
                        RevocationCheck::Unavailable
                    }
                    RevocationFailMode::Closed => return Err(e),
                }
            }
        };

        let claims = match self.serializer.deserialize(token, entry.decoding_key()) {
            Ok(claims) => claims,
            Err(e) => {
                metrics::record_validation("invalid");
                debug!(error = %e, "Token rejected");
                return Err(e);
            }
        };

        metrics::record_validation("valid");
        Ok(ValidatedToken {
            claims: caller_claims(claims, Utc::now()),
            revocation,
        })
    }

    /// Blacklist the token until shortly after its own expiry.
    ///
    /// The token is not verified here; callers check ownership first. Returns
    /// the TTL written to the cache.
    #[instrument(skip(self, token))]
    pub async fn destroy(&self, token: &str) -> Result<Duration, TokenError> {
        let claims = self.serializer.deserialize_unverified(token)?;
        let expires_at = claims
            .get(CLAIM_EXPIRES_AT)
            .and_then(ClaimValue::as_i64)
            .ok_or_else(|| TokenError::MalformedRequest("Token has no expiration claim".to_string()))?;

        let ttl = revocation_ttl(expires_at, Utc::now());

        match self.cache.set(token, token, ttl).await {
            Ok(()) => {
                metrics::record_cache_operation("set", "ok");
                metrics::record_token_revoked("ok");
                debug!(ttl_secs = ttl.as_secs(), "Token blacklisted");
                Ok(ttl)
            }
            Err(e) => {
                metrics::record_cache_operation("set", "error");
                metrics::record_token_revoked("error");
                Err(e.into())
            }
        }
    }

    /// Release the revocation cache connection.
    pub async fn close(&self) {
        info!(backend = self.cache.backend(), "Closing revocation cache");
        self.cache.close().await;
    }
}

/// Drop `iat` and swap `exp` for the seconds left.
fn caller_claims(mut claims: ClaimsMap, now: DateTime<Utc>) -> ClaimsMap {
    claims.remove(CLAIM_ISSUED_AT);
    if let Some(expires_at) = claims.remove(CLAIM_EXPIRES_AT).as_ref().and_then(ClaimValue::as_i64) {
        claims.insert(
            CLAIM_EXPIRES_IN.to_string(),
            remaining_seconds(expires_at, now).into(),
        );
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRevocationCache;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn authority(cache: Arc<InMemoryRevocationCache>) -> TokenAuthority {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let registry = Arc::new(KeyStoreRegistry::load(fixtures).unwrap());
        TokenAuthority::new(registry, cache, 15)
    }

    fn alice() -> ClaimsMap {
        let mut claims = ClaimsMap::new();
        claims.insert("sub".into(), "alice".into());
        claims.insert("grant".into(), "access_token".into());
        claims
    }

    #[test]
    fn test_caller_claims_transformation() {
        let mut claims = ClaimsMap::new();
        claims.insert("sub".into(), "alice".into());
        claims.insert(CLAIM_ISSUED_AT.into(), 1_000_i64.into());
        claims.insert(CLAIM_EXPIRES_AT.into(), 1_900_i64.into());

        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        let out = caller_claims(claims, now);

        assert_eq!(out.len(), 2);
        assert_eq!(out[CLAIM_EXPIRES_IN].as_i64(), Some(900));
        assert!(!out.contains_key(CLAIM_ISSUED_AT));
        assert!(!out.contains_key(CLAIM_EXPIRES_AT));
    }

    #[test]
    fn test_generate_reports_lifetime() {
        let authority = authority(Arc::new(InMemoryRevocationCache::new()));
        let issued = authority.generate_token(alice(), "acme").unwrap();

        assert_eq!(issued.expires_in, 900);
        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.claims["type"].as_str(), Some("access_token"));
    }

    #[test]
    fn test_generate_unknown_client() {
        let authority = authority(Arc::new(InMemoryRevocationCache::new()));
        let err = authority.generate_token(alice(), "initech").unwrap_err();
        assert!(matches!(err, TokenError::ClientUnknown(ref id) if id == "initech"));
    }

    #[tokio::test]
    async fn test_destroy_then_validate() {
        let cache = Arc::new(InMemoryRevocationCache::new());
        let authority = authority(cache.clone());
        let issued = authority.generate_token(alice(), "acme").unwrap();

        assert!(authority.validate_token(&issued.token, "acme").await.is_ok());

        let ttl = authority.destroy(&issued.token).await.unwrap();
        assert!(ttl >= Duration::from_secs(959) && ttl <= Duration::from_secs(960));
        assert!(authority.is_revoked(&issued.token).await.unwrap());

        let err = authority.validate_token(&issued.token, "acme").await.unwrap_err();
        assert!(matches!(err, TokenError::RevokedToken));
    }

    #[tokio::test]
    async fn test_signing_failure_disables_client() {
        let acme = KeyEntry::from_pem(
            "acme",
            include_str!("../tests/fixtures/keys/acme/key"),
            include_str!("../tests/fixtures/keys/acme/key.pub"),
        )
        .unwrap();
        let corrupt = KeyEntry::from_keys(
            "corrupt",
            jsonwebtoken::EncodingKey::from_rsa_der(b"not a key"),
            acme.decoding_key().clone(),
        );
        let registry = Arc::new(KeyStoreRegistry::from_entries([acme, corrupt]));
        let authority = TokenAuthority::new(registry, Arc::new(InMemoryRevocationCache::new()), 15);

        let err = authority.generate_token(alice(), "corrupt").unwrap_err();
        assert!(matches!(err, TokenError::SigningFailed { .. }));
        assert!(authority.is_client_disabled("corrupt"));

        assert!(matches!(
            authority.generate_token(alice(), "corrupt"),
            Err(TokenError::ClientDisabled(_))
        ));
        assert!(matches!(
            authority.validate_token("a.b.c", "corrupt").await,
            Err(TokenError::ClientDisabled(_))
        ));

        // Other clients keep working.
        assert!(!authority.is_client_disabled("acme"));
        assert!(authority.generate_token(alice(), "acme").is_ok());
    }

    #[tokio::test]
    async fn test_destroy_garbage() {
        let authority = authority(Arc::new(InMemoryRevocationCache::new()));
        let err = authority.destroy("garbage").await.unwrap_err();
        assert!(matches!(err, TokenError::MalformedRequest(_)));
    }
}
