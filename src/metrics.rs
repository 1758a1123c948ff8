//! Prometheus metrics for the JWT service.
//!
//! Counters register lazily in the default registry; exposing them is left to
//! whatever transport hosts the service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_service_tokens_issued_total",
        "Total number of tokens issued",
        &["client"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Token validation outcomes.
pub static TOKEN_VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_service_token_validations_total",
        "Total number of token validations by outcome",
        &["outcome"]
    )
    .expect("Failed to register token_validations metric")
});

/// Tokens revoked counter.
pub static TOKENS_REVOKED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_service_tokens_revoked_total",
        "Total number of revocation attempts",
        &["status"]
    )
    .expect("Failed to register tokens_revoked metric")
});

/// Cache operations counter.
pub static CACHE_OPERATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "jwt_service_cache_operations_total",
        "Total number of revocation cache operations",
        &["operation", "status"]
    )
    .expect("Failed to register cache_operations metric")
});

/// Record a token issuance.
pub fn record_token_issued(client: &str) {
    TOKENS_ISSUED.with_label_values(&[client]).inc();
}

/// Record a validation outcome: `valid`, `revoked`, `invalid`, `unknown_client`,
/// `client_disabled`, `cache_degraded`.
pub fn record_validation(outcome: &str) {
    TOKEN_VALIDATIONS.with_label_values(&[outcome]).inc();
}

/// Record a revocation attempt.
pub fn record_token_revoked(status: &str) {
    TOKENS_REVOKED.with_label_values(&[status]).inc();
}

/// Record a cache operation.
pub fn record_cache_operation(operation: &str, status: &str) {
    CACHE_OPERATIONS
        .with_label_values(&[operation, status])
        .inc();
}
