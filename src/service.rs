//! Request-level facade over the token authority.

use crate::api::{ClaimsPayload, TokenPayload, TokenRequest, ValidationPayload};
use crate::authority::TokenAuthority;
use crate::error::TokenError;
use std::sync::Arc;

/// Validates request shape, then delegates to [`TokenAuthority`].
#[derive(Clone)]
pub struct TokenService {
    authority: Arc<TokenAuthority>,
}

impl TokenService {
    pub fn new(authority: Arc<TokenAuthority>) -> Self {
        TokenService { authority }
    }

    pub fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    pub fn generate(&self, request: ClaimsPayload, client_id: &str) -> Result<TokenPayload, TokenError> {
        require_client(client_id)?;
        let issued = self.authority.generate_token(request.claims, client_id)?;

        Ok(TokenPayload {
            token: issued.token,
            expires_in: issued.expires_in,
        })
    }

    /// The payload reports whether the blacklist was actually consulted.
    pub async fn validate(&self, request: TokenRequest, client_id: &str) -> Result<ValidationPayload, TokenError> {
        require_client(client_id)?;
        require_token(&request.token)?;
        let validated = self.authority.validate_token(&request.token, client_id).await?;

        Ok(validated.into())
    }

    /// Revoke a token the client itself issued.
    ///
    /// The signature is checked first so a client cannot blacklist tokens
    /// belonging to another client. A token that fails that check is reported
    /// as an unparseable request.
    pub async fn destroy(&self, request: TokenRequest, client_id: &str) -> Result<(), TokenError> {
        require_client(client_id)?;
        require_token(&request.token)?;
        self.authority
            .parse_token(&request.token, client_id)
            .map_err(|e| match e {
                TokenError::InvalidToken(reason) => TokenError::MalformedRequest(reason),
                other => other,
            })?;
        self.authority.destroy(&request.token).await?;
        Ok(())
    }
}

fn require_client(client_id: &str) -> Result<(), TokenError> {
    if client_id.is_empty() {
        return Err(TokenError::ClientUnknown(String::new()));
    }
    Ok(())
}

fn require_token(token: &str) -> Result<(), TokenError> {
    if token.is_empty() {
        return Err(TokenError::MalformedRequest("Token is required".to_string()));
    }
    Ok(())
}
