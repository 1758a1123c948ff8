//! Error taxonomy for the token authority.
//!
//! Every failure carries a stable [`ErrorCode`]. The code's wire string,
//! human-readable message and response status live in [`ERROR_TABLE`], so the
//! boundary layer never has to invent its own wording.

use crate::storage::CacheError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Cannot load key store from {}: {reason}", .path.display())]
    KeyLoad { path: PathBuf, reason: String },

    #[error("No keys defined for client ID {0}")]
    ClientUnknown(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Revocation cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Error signing token for client {client_id}: {reason}")]
    SigningFailed { client_id: String, reason: String },

    #[error("Client {0} is disabled after a signing failure")]
    ClientDisabled(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TokenError {
    pub(crate) fn key_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TokenError::KeyLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        TokenError::InvalidToken(reason.into())
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        TokenError::Config(reason.into())
    }

    /// Stable code reported to callers.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::KeyLoad { .. } => ErrorCode::KeyStore,
            Self::ClientUnknown(_) => ErrorCode::InvalidClient,
            Self::MalformedRequest(_) => ErrorCode::ParsingRequest,
            Self::InvalidToken(_) | Self::RevokedToken => ErrorCode::InvalidToken,
            Self::CacheUnavailable(_) => ErrorCode::Cache,
            Self::SigningFailed { .. } | Self::ClientDisabled(_) => ErrorCode::CreatingToken,
            Self::Config(_) => ErrorCode::Configuration,
        }
    }

    /// True for any rejection the caller sees as `invalid_token`, revoked included.
    #[must_use]
    pub const fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::RevokedToken)
    }

    /// Only an unreachable cache is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::CacheUnavailable(_))
    }
}

impl From<CacheError> for TokenError {
    fn from(err: CacheError) -> Self {
        TokenError::CacheUnavailable(err.to_string())
    }
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ErrorCode {
    InvalidClient = 0,
    ParsingRequest = 1,
    InvalidToken = 2,
    CreatingToken = 3,
    Cache = 4,
    KeyStore = 5,
    Configuration = 6,
}

/// Row of the code → message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub wire: &'static str,
    pub message: &'static str,
    pub status: u16,
}

/// Indexed by `ErrorCode as usize`.
pub static ERROR_TABLE: [ErrorInfo; 7] = [
    ErrorInfo {
        code: ErrorCode::InvalidClient,
        wire: "invalid_client",
        message: "Invalid client",
        status: 400,
    },
    ErrorInfo {
        code: ErrorCode::ParsingRequest,
        wire: "err_parsing_token",
        message: "Error parsing token",
        status: 400,
    },
    ErrorInfo {
        code: ErrorCode::InvalidToken,
        wire: "invalid_token",
        message: "Invalid token",
        status: 400,
    },
    ErrorInfo {
        code: ErrorCode::CreatingToken,
        wire: "err_creating_token",
        message: "Error creating auth token",
        status: 500,
    },
    ErrorInfo {
        code: ErrorCode::Cache,
        wire: "err_redis",
        message: "There was an error connecting to the revocation cache",
        status: 500,
    },
    ErrorInfo {
        code: ErrorCode::KeyStore,
        wire: "err_key_store",
        message: "The key store could not be loaded",
        status: 500,
    },
    ErrorInfo {
        code: ErrorCode::Configuration,
        wire: "err_configuration",
        message: "Invalid service configuration",
        status: 500,
    },
];

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        Self::InvalidClient,
        Self::ParsingRequest,
        Self::InvalidToken,
        Self::CreatingToken,
        Self::Cache,
        Self::KeyStore,
        Self::Configuration,
    ];

    #[must_use]
    pub fn info(self) -> &'static ErrorInfo {
        &ERROR_TABLE[self as usize]
    }

    /// Wire representation, e.g. `invalid_token`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.info().wire
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        self.info().message
    }

    #[must_use]
    pub fn status(self) -> u16 {
        self.info().status
    }
}
