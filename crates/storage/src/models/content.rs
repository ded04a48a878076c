use time::UtcDateTime;

use crate::error::Result;
use crate::key::{ContentKey, ResourceKey};
use crate::models::{Locator, OrganizationType, Payload, ResourceType, checksum};

/// One cached content unit (a book of scripture, a dictionary entry, ...).
///
/// Rows are replaced whole on every write; there is exactly one per key.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceContent {
    pub key: ContentKey,
    pub resource_type: ResourceType,
    pub locator: Locator,
    pub content: Payload,
    pub last_fetched: UtcDateTime,
    /// `None` never expires by time.
    pub cached_until: Option<UtcDateTime>,
    pub checksum: Option<String>,
    /// Serialized payload size in bytes.
    pub size: u64,
    /// Remote fingerprint of the file the payload came from.
    pub source_sha: Option<String>,
    /// Remote commit of the resource at fetch time.
    pub source_commit: Option<String>,
}
impl ResourceContent {
    /// Wrap a payload into a content envelope, computing its size and
    /// checksum from the serialized form.
    pub fn new(
        key: ContentKey,
        resource_type: ResourceType,
        organization: OrganizationType,
        content: Payload,
        fetched_at: UtcDateTime,
    ) -> Result<Self> {
        let bytes = content.to_json()?;
        let locator = Locator::new(organization, &key.content_id);
        Ok(Self {
            key,
            resource_type,
            locator,
            content,
            last_fetched: fetched_at,
            cached_until: None,
            checksum: Some(checksum(&bytes)),
            size: bytes.len() as u64,
            source_sha: None,
            source_commit: None,
        })
    }

    pub fn with_expiry(mut self, cached_until: Option<UtcDateTime>) -> Self {
        self.cached_until = cached_until;
        self
    }

    pub fn with_source(mut self, sha: Option<String>, commit: Option<String>) -> Self {
        self.source_sha = sha;
        self.source_commit = commit;
        self
    }

    pub fn resource_key(&self) -> &ResourceKey {
        &self.key.resource
    }

    pub fn book_code(&self) -> Option<&str> {
        self.locator.book_code()
    }

    pub fn article_id(&self) -> Option<&str> {
        self.locator.article_id()
    }

    /// Expired rows have a `cached_until` strictly in the past.
    pub fn is_expired(&self, now: UtcDateTime) -> bool {
        self.cached_until.is_some_and(|until| until < now)
    }

    /// Re-stamp the bookkeeping fields without touching the payload.
    pub fn restamp(&mut self, now: UtcDateTime, cached_until: Option<UtcDateTime>) {
        self.last_fetched = now;
        self.cached_until = cached_until;
    }
}
