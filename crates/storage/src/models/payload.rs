//! Typed content payloads.
//!
//! Payloads are serialized to JSON at the storage boundary and decoded once
//! when a row is read back.

use exn::ResultExt;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::models::ResourceType;

/// Content of one cached unit, tagged by resource family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum Payload {
    Scripture(ScriptureBook),
    Notes(Vec<Note>),
    Questions(Vec<Question>),
    WordLinks(Vec<WordLink>),
    /// Dictionary entries and methodology articles.
    Article(Article),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptureBook {
    pub book_code: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub verses: Vec<Verse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    /// Verse number, or a bridge such as `"4-5"`.
    pub number: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// `chapter:verse` reference.
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_reference: Option<String>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub reference: String,
    pub question: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLink {
    pub id: String,
    pub reference: String,
    pub orig_words: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u32>,
    /// Link to the dictionary entry, e.g. `rc://*/tw/dict/bible/kt/god`.
    pub tw_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Markdown body.
    pub body: String,
}

impl Payload {
    /// Returns `true` if this payload shape belongs to the given family.
    pub fn matches(&self, resource_type: ResourceType) -> bool {
        matches!(
            (self, resource_type),
            (Self::Scripture(_), ResourceType::Scripture)
                | (Self::Notes(_), ResourceType::Notes)
                | (Self::Questions(_), ResourceType::Questions)
                | (Self::WordLinks(_), ResourceType::WordLinks)
                | (Self::Article(_), ResourceType::Dictionary | ResourceType::Methodology)
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scripture(book) => book.chapters.is_empty(),
            Self::Notes(notes) => notes.is_empty(),
            Self::Questions(questions) => questions.is_empty(),
            Self::WordLinks(links) => links.is_empty(),
            Self::Article(article) => article.body.trim().is_empty(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).or_raise(|| ErrorKind::InvalidData("payload"))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).or_raise(|| ErrorKind::InvalidData("payload"))
    }
}

/// Integrity hint for serialized payload bytes (CRC32, lowercase hex).
///
/// Good enough to spot corruption. Not suitable for deduplication.
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(bytes))
}
