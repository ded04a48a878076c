//! Cache key addressing.
//!
//! Every cached content unit is addressed by a canonical, slash-separated
//! key: `{server}/{owner}/{language}/{resource_id}/{content_id}`. The first
//! four segments identify the resource (its metadata row); the remainder
//! identifies the content unit inside it.
//!
//! For book-organized resources the content identifier is a single segment
//! (a book code). Entry-organized families address articles by a relative
//! path (`category/article`), so for those the content identifier swallows
//! every trailing segment.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

const SEPARATOR: char = '/';
const RESOURCE_SEGMENTS: usize = 4;

/// Resource identifiers whose content identifiers are multi-segment paths.
pub const MULTI_SEGMENT_RESOURCES: [&str; 2] = ["methodology-articles", "dictionary-entries"];

/// Returns `true` if content keys for `resource_id` carry a path (rather
/// than a single segment) as their content identifier.
pub fn has_multi_segment_content(resource_id: &str) -> bool {
    MULTI_SEGMENT_RESOURCES.contains(&resource_id)
}

/// Identity of one resource instance: the uniqueness key of a metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub server: String,
    pub owner: String,
    pub language: String,
    pub resource_id: String,
}
impl ResourceKey {
    pub fn new(
        server: impl Into<String>,
        owner: impl Into<String>,
        language: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            owner: owner.into(),
            language: language.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Address a content unit inside this resource.
    pub fn content(&self, content_id: impl Into<String>) -> ContentKey {
        ContentKey { resource: self.clone(), content_id: content_id.into() }
    }
}
impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.server, self.owner, self.language, self.resource_id)
    }
}

/// Identity of one cached content unit: the primary key of a content row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey {
    pub resource: ResourceKey,
    pub content_id: String,
}
impl ContentKey {
    /// Parse a canonical key string.
    ///
    /// Only [`MULTI_SEGMENT_RESOURCES`] keep every trailing segment as the
    /// content id. Any other resource takes the fifth segment alone, so
    /// `srv/own/en/ult/gen/extra` parses (and is cached) as
    /// `srv/own/en/ult/gen`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_storage::ContentKey;
    ///
    /// let key = ContentKey::parse("git.door43.org/unfoldingWord/en/ult/gen").unwrap();
    /// assert_eq!(key.content_id, "gen");
    ///
    /// let key = ContentKey::parse("git.door43.org/unfoldingWord/en/methodology-articles/translate/figs-metaphor").unwrap();
    /// assert_eq!(key.content_id, "translate/figs-metaphor");
    ///
    /// assert!(ContentKey::parse("git.door43.org/unfoldingWord/en").is_err());
    /// ```
    pub fn parse(key: &str) -> Result<Self> {
        let segments: Vec<&str> = key.split(SEPARATOR).collect();
        if segments.len() <= RESOURCE_SEGMENTS || segments.iter().any(|s| s.is_empty()) {
            exn::bail!(ErrorKind::InvalidKey(key.to_string()));
        }
        let resource = ResourceKey::new(segments[0], segments[1], segments[2], segments[3]);
        let content_id = match has_multi_segment_content(&resource.resource_id) {
            true => segments[RESOURCE_SEGMENTS..].join("/"),
            false => segments[RESOURCE_SEGMENTS].to_string(),
        };
        Ok(Self { resource, content_id })
    }

    pub fn server(&self) -> &str {
        &self.resource.server
    }

    pub fn owner(&self) -> &str {
        &self.resource.owner
    }

    pub fn language(&self) -> &str {
        &self.resource.language
    }

    pub fn resource_id(&self) -> &str {
        &self.resource.resource_id
    }
}
impl FromStr for ContentKey {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource, self.content_id)
    }
}
