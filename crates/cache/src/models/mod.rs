//! Row types and their conversions to and from the storage models.
//!
//! Timestamps are stored as whole unix seconds; sub-second precision is
//! dropped on the way in.

mod content;
mod metadata;
mod usage;

pub(crate) use self::content::ContentRow;
pub(crate) use self::metadata::MetadataRow;
pub(crate) use self::usage::UsageRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

fn timestamp(unix: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(unix).or_raise(|| ErrorKind::InvalidData(field))
}

fn size(value: u64, field: &'static str) -> Result<i64> {
    i64::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}

fn unsigned(value: i64, field: &'static str) -> Result<u64> {
    u64::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}
