use scriptorium_storage::models::StorageInfo;

use crate::error::Error;
use crate::models::{timestamp, unsigned};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UsageRow {
    pub(crate) total_size: i64,
    pub(crate) item_count: i64,
    pub(crate) last_cleanup: Option<i64>,
}
impl TryFrom<UsageRow> for StorageInfo {
    type Error = Error;
    fn try_from(row: UsageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            total_size: unsigned(row.total_size, "total size")?,
            item_count: unsigned(row.item_count, "item count")?,
            last_cleanup: row.last_cleanup.map(|at| timestamp(at, "last cleanup")).transpose()?,
        })
    }
}
