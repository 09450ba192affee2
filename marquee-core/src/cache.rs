use async_trait::async_trait;

use crate::repository::BoxError;

/// Explicit key/value cache with per-entry TTL, injected into the operations
/// that need it rather than held as ambient state.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), BoxError>;
}

/// Fixed-window request rate limiting keyed by caller.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` while the caller is within `limit` hits per window.
    async fn check(&self, key: &str, limit: i64, window_seconds: i64) -> Result<bool, BoxError>;
}
