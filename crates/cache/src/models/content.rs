use exn::ResultExt;
use scriptorium_storage::ResourceKey;
use scriptorium_storage::models::{Locator, Payload, ResourceContent, ResourceType};

use crate::error::{Error, ErrorKind};
use crate::models::{size, timestamp, unsigned};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ContentRow {
    pub(crate) key: String,
    #[sqlx(default)]
    pub(crate) resource_key: String,
    pub(crate) server: String,
    pub(crate) owner: String,
    pub(crate) language: String,
    pub(crate) resource_id: String,
    pub(crate) resource_type: String,
    pub(crate) book_code: Option<String>,
    pub(crate) article_id: Option<String>,
    pub(crate) content: String,
    pub(crate) last_fetched: i64,
    pub(crate) cached_until: Option<i64>,
    pub(crate) checksum: Option<String>,
    pub(crate) size: i64,
    pub(crate) source_sha: Option<String>,
    pub(crate) source_commit: Option<String>,
}
impl TryFrom<&ResourceContent> for ContentRow {
    type Error = Error;
    fn try_from(content: &ResourceContent) -> Result<Self, Self::Error> {
        let payload = content.content.to_json().or_raise(|| ErrorKind::InvalidData("payload"))?;
        Ok(Self {
            key: content.key.to_string(),
            resource_key: content.resource_key().to_string(),
            server: content.key.server().to_string(),
            owner: content.key.owner().to_string(),
            language: content.key.language().to_string(),
            resource_id: content.key.resource_id().to_string(),
            resource_type: content.resource_type.to_string(),
            book_code: content.book_code().map(str::to_string),
            article_id: content.article_id().map(str::to_string),
            content: String::from_utf8(payload).or_raise(|| ErrorKind::InvalidData("payload"))?,
            last_fetched: content.last_fetched.unix_timestamp(),
            cached_until: content.cached_until.map(|until| until.unix_timestamp()),
            checksum: content.checksum.clone(),
            size: size(content.size, "size")?,
            source_sha: content.source_sha.clone(),
            source_commit: content.source_commit.clone(),
        })
    }
}
impl TryFrom<ContentRow> for ResourceContent {
    type Error = Error;
    fn try_from(row: ContentRow) -> Result<Self, Self::Error> {
        let locator = match (row.book_code, row.article_id) {
            (Some(code), None) => Locator::Book(code),
            (None, Some(id)) => Locator::Article(id),
            _ => exn::bail!(ErrorKind::InvalidData("locator")),
        };
        // Rebuilt from the columns rather than re-parsed, so the content id
        // survives whatever segments it contains.
        let key = ResourceKey::new(row.server, row.owner, row.language, row.resource_id)
            .content(locator.content_id());
        if key.to_string() != row.key {
            exn::bail!(ErrorKind::InvalidData("key"));
        }
        Ok(Self {
            key,
            resource_type: row
                .resource_type
                .parse::<ResourceType>()
                .or_raise(|| ErrorKind::InvalidData("resource type"))?,
            locator,
            content: Payload::from_json(row.content.as_bytes()).or_raise(|| ErrorKind::InvalidData("payload"))?,
            last_fetched: timestamp(row.last_fetched, "last fetched")?,
            cached_until: row.cached_until.map(|until| timestamp(until, "cached until")).transpose()?,
            checksum: row.checksum,
            size: unsigned(row.size, "size")?,
            source_sha: row.source_sha,
            source_commit: row.source_commit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_storage::ContentKey;
    use scriptorium_storage::models::{Article, OrganizationType};
    use time::UtcDateTime;

    fn article() -> ResourceContent {
        let key = ContentKey::parse("srv/own/en/dictionary-entries/kt/god").unwrap();
        let payload = Payload::Article(Article { title: "God".to_string(), body: "# God".to_string() });
        let fetched = UtcDateTime::from_unix_timestamp(1_750_000_000).unwrap();
        ResourceContent::new(key, ResourceType::Dictionary, OrganizationType::Entry, payload, fetched)
            .unwrap()
            .with_source(Some("sha1".to_string()), Some("commit1".to_string()))
    }

    #[test]
    fn test_row_conversion_keeps_multi_segment_ids() {
        let content = article();
        let row = ContentRow::try_from(&content).unwrap();
        assert_eq!(row.key, "srv/own/en/dictionary-entries/kt/god");
        assert_eq!(row.resource_key, "srv/own/en/dictionary-entries");
        assert_eq!(row.article_id.as_deref(), Some("kt/god"));
        assert_eq!(row.book_code, None);
        assert_eq!(ResourceContent::try_from(row).unwrap(), content);
    }

    #[test]
    fn test_both_locators_rejected() {
        let mut row = ContentRow::try_from(&article()).unwrap();
        row.book_code = Some("gen".to_string());
        let err = ResourceContent::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("locator"));
    }

    #[test]
    fn test_corrupt_payload_rejected() {
        let mut row = ContentRow::try_from(&article()).unwrap();
        row.content = "{\"kind\":\"unknown\"}".to_string();
        let err = ResourceContent::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("payload"));
    }
}
