//! Serde payloads exchanged at the service boundary.

use crate::authority::{RevocationCheck, ValidatedToken};
use crate::error::TokenError;
use crate::jwt::ClaimsMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body carrying a raw token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Response to a successful generate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
    pub expires_in: u64,
}

/// Caller claims for a generate call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimsPayload {
    pub claims: ClaimsMap,
}

/// Response to a successful validate call.
///
/// `revocation_checked` is false when the blacklist could not be consulted,
/// so a revoked token may have been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationPayload {
    pub claims: ClaimsMap,
    pub revocation_checked: bool,
}

impl From<ValidatedToken> for ValidationPayload {
    fn from(validated: ValidatedToken) -> Self {
        ValidationPayload {
            claims: validated.claims,
            revocation_checked: validated.revocation == RevocationCheck::Clear,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub error: String,
    pub message: String,
}

impl From<&TokenError> for ErrorData {
    fn from(err: &TokenError) -> Self {
        let code = err.code();
        ErrorData {
            error: code.as_str().to_string(),
            message: code.message().to_string(),
        }
    }
}

/// Transport-neutral response: an HTTP-style status and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => ApiResponse { status: 200, body },
            Err(e) => Self::from_error(&TokenError::MalformedRequest(e.to_string())),
        }
    }

    /// 200 with an empty object, used by destroy.
    #[must_use]
    pub fn no_content() -> Self {
        ApiResponse {
            status: 200,
            body: json!({}),
        }
    }

    /// Internal details stay in logs; the body only carries the table entry.
    #[must_use]
    pub fn from_error(err: &TokenError) -> Self {
        let body = serde_json::to_value(ErrorData::from(err)).unwrap_or_else(|_| json!({}));
        ApiResponse {
            status: err.code().status(),
            body,
        }
    }

    pub fn from_result<T: Serialize>(result: &Result<T, TokenError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(e) => Self::from_error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_payload_shape() {
        let payload = TokenPayload {
            token: "a.b.c".into(),
            expires_in: 900,
        };
        let response = ApiResponse::ok(&payload);

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"token": "a.b.c", "expires_in": 900}));
    }

    #[test]
    fn test_revoked_reads_as_invalid_token() {
        let response = ApiResponse::from_error(&TokenError::RevokedToken);

        assert_eq!(response.status, 400);
        assert_eq!(
            response.body,
            json!({"error": "invalid_token", "message": "Invalid token"})
        );
    }

    #[test]
    fn test_cache_error_is_server_side() {
        let result: Result<TokenPayload, _> = Err(TokenError::CacheUnavailable("refused".into()));
        let response = ApiResponse::from_result(&result);

        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "err_redis");
        assert!(!response.body.to_string().contains("refused"));
    }

    #[test]
    fn test_unchecked_revocation_is_visible() {
        let validated = ValidatedToken {
            claims: ClaimsMap::new(),
            revocation: RevocationCheck::Unavailable,
        };
        let response = ApiResponse::ok(&ValidationPayload::from(validated));

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"claims": {}, "revocation_checked": false}));
    }

    #[test]
    fn test_no_content() {
        let response = ApiResponse::no_content();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({}));
    }

    #[test]
    fn test_claims_payload_parses_nested_values() {
        let payload: ClaimsPayload = serde_json::from_value(json!({
            "claims": {"sub": "alice", "grant": "access_token", "roles": ["read"]}
        }))
        .unwrap();

        assert_eq!(payload.claims.len(), 3);
        assert_eq!(payload.claims["sub"].as_str(), Some("alice"));
    }
}
