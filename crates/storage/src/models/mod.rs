//! Storage models.
//!
//! These types are shared between the storage adapters (as rows) and the
//! resource manager (as cache entries).

mod content;
mod metadata;
mod payload;
mod resource;
mod usage;

pub use self::content::ResourceContent;
pub use self::metadata::{ResourceMetadata, TocEntry};
pub use self::payload::{Article, Chapter, Note, Payload, Question, ScriptureBook, Verse, WordLink, checksum};
pub use self::resource::{Locator, OrganizationType, ResourceType};
pub use self::usage::{NEAR_LIMIT_RATIO, QUOTA_BYTES, QuotaInfo, StorageInfo};
