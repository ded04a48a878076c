use scriptorium_asyncutils::RetryPolicy;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Resource manager tuning.
///
/// Every field has a default, so a partial configuration source only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Per network call, in milliseconds.
    pub timeout_ms: u64,
    pub max_retry_attempts: usize,
    /// Delay after failed attempt `n` is `n × retry_base_delay_ms`.
    pub retry_base_delay_ms: u64,
    /// How long fetched content stays fresh, and how old metadata may get
    /// before it is re-fetched.
    pub cache_expiry_hours: u64,
    /// Reject fetched payloads that are empty or of the wrong family.
    pub validate_content: bool,
    /// Default for [`ResourceManager::context()`](crate::ResourceManager::context).
    pub offline: bool,
}
impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retry_attempts: 3,
            retry_base_delay_ms: 1_000,
            cache_expiry_hours: 24,
            validate_content: true,
            offline: false,
        }
    }
}
impl ManagerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retry_attempts,
            std::time::Duration::from_millis(self.retry_base_delay_ms),
            std::time::Duration::from_millis(self.timeout_ms),
        )
    }

    pub fn cache_expiry(&self) -> time::Duration {
        let hours = self.cache_expiry_hours.min(i64::MAX as u64 / 3_600);
        time::Duration::hours(hours as i64)
    }

    /// When content fetched at `now` stops being fresh. `None` (never
    /// expires) when the expiry reaches past the representable date range.
    pub fn expires_at(&self, now: UtcDateTime) -> Option<UtcDateTime> {
        now.checked_add(self.cache_expiry())
    }
}
