use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::{Duration, UtcDateTime};

use crate::key::ResourceKey;
use crate::models::ResourceType;

/// One sub-unit (usually a book) in a resource's table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Book code or entry identifier, e.g. `"gen"`.
    pub code: String,
    pub title: String,
    /// Remote file backing the unit, if the adapter reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
impl TocEntry {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self { code: code.into(), title: title.into(), path: None }
    }
}

/// Describes one resource instance, e.g. "the ULT in English from server X".
///
/// Unique per `server/owner/language/id`; saved rows are updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub id: String,
    pub server: String,
    pub owner: String,
    pub language: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: String,
    pub name: String,
    pub version: String,
    pub last_updated: UtcDateTime,
    pub available: bool,
    /// The scripture resource whose table of contents drives navigation.
    pub is_anchor: bool,
    pub toc: Vec<TocEntry>,
    /// Fingerprint of the whole resource (e.g. the repository commit).
    pub commit_sha: Option<String>,
    /// Per-file fingerprints, keyed by remote file path.
    pub file_hashes: BTreeMap<String, String>,
}
impl ResourceMetadata {
    /// Bare metadata row with empty display fields.
    pub fn new(key: ResourceKey, resource_type: ResourceType, last_updated: UtcDateTime) -> Self {
        Self {
            id: key.resource_id,
            server: key.server,
            owner: key.owner,
            language: key.language,
            resource_type,
            title: String::new(),
            description: String::new(),
            name: String::new(),
            version: String::new(),
            last_updated,
            available: true,
            is_anchor: false,
            toc: Vec::new(),
            commit_sha: None,
            file_hashes: BTreeMap::new(),
        }
    }

    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(&self.server, &self.owner, &self.language, &self.id)
    }

    /// Time elapsed since the row was last refreshed. Negative if the clock
    /// went backwards.
    pub fn age(&self, now: UtcDateTime) -> Duration {
        now - self.last_updated
    }
}
