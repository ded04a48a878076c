use derive_more::Display;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Family of a translation resource.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    #[display("scripture")]
    Scripture,
    #[display("notes")]
    Notes,
    #[display("questions")]
    Questions,
    #[display("word-links")]
    WordLinks,
    /// Dictionary entries (key terms, names, other words).
    #[display("dictionary")]
    Dictionary,
    /// Methodology articles.
    #[display("methodology")]
    Methodology,
}
impl ResourceType {
    pub const ALL: [ResourceType; 6] = [
        Self::Scripture,
        Self::Notes,
        Self::Questions,
        Self::WordLinks,
        Self::Dictionary,
        Self::Methodology,
    ];

    /// How content of this family is usually addressed.
    pub fn organization(&self) -> OrganizationType {
        match self {
            Self::Scripture | Self::Notes | Self::Questions | Self::WordLinks => OrganizationType::Book,
            Self::Dictionary | Self::Methodology => OrganizationType::Entry,
        }
    }
}
impl FromStr for ResourceType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| Error::from(ErrorKind::InvalidData("resource type")))
    }
}

/// Whether content is addressed per book or per named entry.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum OrganizationType {
    #[display("book")]
    Book,
    #[display("entry")]
    Entry,
}

/// Sub-identifier of a content row inside its resource.
///
/// Book-organized resources carry a book code, entry-organized resources an
/// article id. Never both.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Locator {
    Book(String),
    Article(String),
}
impl Locator {
    pub fn new(organization: OrganizationType, content_id: impl Into<String>) -> Self {
        match organization {
            OrganizationType::Book => Self::Book(content_id.into()),
            OrganizationType::Entry => Self::Article(content_id.into()),
        }
    }

    pub fn organization(&self) -> OrganizationType {
        match self {
            Self::Book(_) => OrganizationType::Book,
            Self::Article(_) => OrganizationType::Entry,
        }
    }

    /// The wrapped identifier, whichever variant it is.
    pub fn content_id(&self) -> &str {
        match self {
            Self::Book(id) | Self::Article(id) => id,
        }
    }

    pub fn book_code(&self) -> Option<&str> {
        match self {
            Self::Book(code) => Some(code),
            Self::Article(_) => None,
        }
    }

    pub fn article_id(&self) -> Option<&str> {
        match self {
            Self::Article(id) => Some(id),
            Self::Book(_) => None,
        }
    }
}
