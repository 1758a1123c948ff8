use crate::error::TokenError;
use crate::jwt::claims::{ClaimsMap, CLAIM_EXPIRES_AT};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// The only algorithm this service signs with or accepts.
pub const PINNED_ALGORITHM: Algorithm = Algorithm::RS512;

/// Compact JWS encoding and verification pinned to RS512.
pub struct JwtSerializer {
    validation: Validation,
}

impl Default for JwtSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JwtSerializer {
    #[must_use]
    pub fn new() -> Self {
        let mut validation = Validation::new(PINNED_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&[CLAIM_EXPIRES_AT]);

        JwtSerializer { validation }
    }

    /// Sign `claims` into a compact token.
    pub fn serialize(&self, claims: &ClaimsMap, key: &EncodingKey) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(PINNED_ALGORITHM), claims, key)
    }

    /// Reject anything whose header names an algorithm other than RS512.
    ///
    /// Runs before any signature work so substituted algorithms never reach
    /// the verifier.
    pub fn check_algorithm(&self, token: &str) -> Result<(), TokenError> {
        let header = decode_header(token)
            .map_err(|e| TokenError::invalid_token(format!("Invalid header: {}", e)))?;

        if header.alg != PINNED_ALGORITHM {
            return Err(TokenError::invalid_token(format!(
                "Unexpected signing method: {:?}",
                header.alg
            )));
        }
        Ok(())
    }

    /// Verify signature and expiry, returning the raw claim set.
    pub fn deserialize(&self, token: &str, key: &DecodingKey) -> Result<ClaimsMap, TokenError> {
        self.check_algorithm(token)?;

        decode::<ClaimsMap>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::invalid_token("Token is expired"),
                ErrorKind::InvalidSignature => TokenError::invalid_token("Signature verification failed"),
                _ => TokenError::invalid_token(e.to_string()),
            })
    }

    /// Read the claim set without verifying anything.
    pub fn deserialize_unverified(&self, token: &str) -> Result<ClaimsMap, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(TokenError::MalformedRequest("Invalid token format".to_string()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| TokenError::MalformedRequest(e.to_string()))?;

        serde_json::from_slice(&payload).map_err(|e| TokenError::MalformedRequest(e.to_string()))
    }
}
