//! The contract for per-family remote fetchers.
//!
//! Adapters talk to the remote content service; the resource manager decides
//! when to call them and what to do when they fail. One adapter serves one
//! resource family ([`ResourceType`]), primarily under one resource id, and
//! optionally under a priority list of alternative ids.

pub mod error;

use async_trait::async_trait;
use scriptorium_storage::models::{OrganizationType, Payload, ResourceMetadata, ResourceType, TocEntry};
use scriptorium_storage::{ContentKey, ResourceKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use time::UtcDateTime;

use crate::adapter::error::{ErrorKind, Result};

pub type AdapterHandle = Arc<dyn ResourceAdapter>;

/// Metadata for one resource instance, as reported by the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// Resource id the remote actually resolved (it may be any of the
    /// adapter's declared ids).
    pub id: String,
    pub title: String,
    pub description: String,
    pub name: String,
    pub version: String,
    pub available: bool,
    pub is_anchor: bool,
    pub toc: Vec<TocEntry>,
    pub commit_sha: Option<String>,
    pub file_hashes: BTreeMap<String, String>,
}
impl RemoteMetadata {
    /// Turn into a metadata row for `server/owner/language`, stamped `now`.
    pub fn into_metadata(
        self,
        server: &str,
        owner: &str,
        language: &str,
        resource_type: ResourceType,
        now: UtcDateTime,
    ) -> ResourceMetadata {
        let key = ResourceKey::new(server, owner, language, self.id);
        ResourceMetadata {
            title: self.title,
            description: self.description,
            name: self.name,
            version: self.version,
            available: self.available,
            is_anchor: self.is_anchor,
            toc: self.toc,
            commit_sha: self.commit_sha,
            file_hashes: self.file_hashes,
            ..ResourceMetadata::new(key, resource_type, now)
        }
    }
}

/// Remote fetcher for one resource family.
///
/// Only the metadata call and the content call matching
/// [`organization()`](Self::organization) need implementing; everything else
/// has a default.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn resource_type(&self) -> ResourceType;

    /// Primary resource id served by this adapter (e.g. `ult`).
    fn resource_id(&self) -> &str;

    /// Alternative resource ids, in priority order, tried when no adapter
    /// claims a resource id as its primary one.
    fn resource_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn organization(&self) -> OrganizationType {
        self.resource_type().organization()
    }

    /// Returns `true` if this adapter serves `resource_id`, either as its
    /// primary id or through its priority list.
    fn declares(&self, resource_id: &str) -> bool {
        self.resource_id() == resource_id || self.resource_ids().iter().any(|id| id == resource_id)
    }

    async fn get_resource_metadata(&self, server: &str, owner: &str, language: &str) -> Result<RemoteMetadata>;

    /// Content for a book-organized resource; the key's content id is the
    /// book code.
    async fn get_book_content(&self, _key: &ContentKey) -> Result<Payload> {
        exn::bail!(ErrorKind::Unsupported("book content"))
    }

    /// Content for an entry-organized resource; the key's content id is the
    /// article path.
    async fn get_entry_content(&self, _key: &ContentKey) -> Result<Payload> {
        exn::bail!(ErrorKind::Unsupported("entry content"))
    }

    /// Whether [`get_current_sha()`](Self::get_current_sha) and
    /// [`has_content_changed()`](Self::has_content_changed) are meaningful.
    fn supports_fingerprints(&self) -> bool {
        false
    }

    /// Current remote fingerprint of the file backing `key`.
    async fn get_current_sha(&self, _key: &ContentKey) -> Result<String> {
        exn::bail!(ErrorKind::Unsupported("fingerprints"))
    }

    /// Returns `true` if the remote content differs from `previous_sha`.
    ///
    /// Defaults to comparing against [`get_current_sha()`](Self::get_current_sha);
    /// override when the remote can answer more cheaply.
    async fn has_content_changed(&self, key: &ContentKey, previous_sha: &str) -> Result<bool> {
        Ok(self.get_current_sha(key).await? != previous_sha)
    }
}
