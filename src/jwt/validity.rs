//! Remaining-validity arithmetic shared by validation and revocation.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Extra blacklist lifetime beyond a token's own expiry, absorbing clock skew.
pub const REVOCATION_GRACE: Duration = Duration::from_secs(60);

/// Whole seconds until `expires_at`, rounded up; zero once it has passed.
#[must_use]
pub fn remaining_seconds(expires_at: i64, now: DateTime<Utc>) -> u64 {
    let remaining_ms = expires_at
        .saturating_mul(1000)
        .saturating_sub(now.timestamp_millis());

    if remaining_ms <= 0 {
        0
    } else {
        (remaining_ms as u64).div_ceil(1000)
    }
}

/// TTL for a blacklist entry: remaining validity plus grace, never below grace.
#[must_use]
pub fn revocation_ttl(expires_at: i64, now: DateTime<Utc>) -> Duration {
    Duration::from_secs(remaining_seconds(expires_at, now)) + REVOCATION_GRACE
}
