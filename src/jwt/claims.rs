use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller key remapped to [`CLAIM_TYPE`].
pub const CLAIM_GRANT: &str = "grant";
/// Token type, e.g. `access_token`.
pub const CLAIM_TYPE: &str = "type";
pub const CLAIM_ISSUED_AT: &str = "iat";
pub const CLAIM_EXPIRES_AT: &str = "exp";
/// Remaining validity in seconds, reported instead of `exp` on validation.
pub const CLAIM_EXPIRES_IN: &str = "expires_in";

/// Flat claim set carried by a token.
pub type ClaimsMap = BTreeMap<String, ClaimValue>;

/// A single claim value: anything JSON can express except `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<ClaimValue>),
    Mapping(BTreeMap<String, ClaimValue>),
}

impl ClaimValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of a numeric claim. Fractional timestamps are truncated.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            _ => None,
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ClaimValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for ClaimValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl<T: Into<ClaimValue>> From<Vec<T>> for ClaimValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<ClaimsMap> for ClaimValue {
    fn from(map: ClaimsMap) -> Self {
        Self::Mapping(map)
    }
}

/// Build the signed claim set from caller claims.
///
/// `grant` is moved to `type` and wins over a caller-supplied `type`;
/// `iat`/`exp` always come from the issuer.
#[must_use]
pub fn issue_claims(request: ClaimsMap, issued_at: i64, expires_at: i64) -> ClaimsMap {
    let mut claims = ClaimsMap::new();
    let mut grant = None;

    for (key, value) in request {
        if key == CLAIM_GRANT {
            grant = Some(value);
        } else {
            claims.insert(key, value);
        }
    }

    if let Some(grant) = grant {
        claims.insert(CLAIM_TYPE.to_string(), grant);
    }
    claims.insert(CLAIM_ISSUED_AT.to_string(), issued_at.into());
    claims.insert(CLAIM_EXPIRES_AT.to_string(), expires_at.into());

    claims
}
