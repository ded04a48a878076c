use time::UtcDateTime;

/// Fixed platform quota for cached content.
pub const QUOTA_BYTES: u64 = 200 * 1024 * 1024;
/// Fraction of the quota after which storage counts as nearly full.
pub const NEAR_LIMIT_RATIO: f64 = 0.8;

/// Aggregate usage counters, recomputed after every content mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageInfo {
    pub total_size: u64,
    pub item_count: u64,
    pub last_cleanup: Option<UtcDateTime>,
}

/// Usage measured against [`QUOTA_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaInfo {
    pub used: u64,
    pub available: u64,
    pub total: u64,
    pub near_limit: bool,
}
impl QuotaInfo {
    pub fn new(used: u64, total: u64) -> Self {
        Self {
            used,
            available: total.saturating_sub(used),
            total,
            near_limit: used as f64 >= total as f64 * NEAR_LIMIT_RATIO,
        }
    }
}
impl From<&StorageInfo> for QuotaInfo {
    fn from(info: &StorageInfo) -> Self {
        Self::new(info.total_size, QUOTA_BYTES)
    }
}
