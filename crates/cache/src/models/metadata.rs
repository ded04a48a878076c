use exn::ResultExt;
use scriptorium_storage::models::{ResourceMetadata, ResourceType, TocEntry};
use std::collections::BTreeMap;

use crate::error::{Error, ErrorKind};
use crate::models::timestamp;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MetadataRow {
    pub(crate) server: String,
    pub(crate) owner: String,
    pub(crate) language: String,
    pub(crate) id: String,
    pub(crate) resource_type: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) last_updated: i64,
    pub(crate) available: bool,
    pub(crate) is_anchor: bool,
    pub(crate) toc: String,
    pub(crate) commit_sha: Option<String>,
    pub(crate) file_hashes: String,
}
impl TryFrom<&ResourceMetadata> for MetadataRow {
    type Error = Error;
    fn try_from(metadata: &ResourceMetadata) -> Result<Self, Self::Error> {
        Ok(Self {
            server: metadata.server.clone(),
            owner: metadata.owner.clone(),
            language: metadata.language.clone(),
            id: metadata.id.clone(),
            resource_type: metadata.resource_type.to_string(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            last_updated: metadata.last_updated.unix_timestamp(),
            available: metadata.available,
            is_anchor: metadata.is_anchor,
            toc: serde_json::to_string(&metadata.toc).or_raise(|| ErrorKind::InvalidData("toc"))?,
            commit_sha: metadata.commit_sha.clone(),
            file_hashes: serde_json::to_string(&metadata.file_hashes)
                .or_raise(|| ErrorKind::InvalidData("file hashes"))?,
        })
    }
}
impl TryFrom<MetadataRow> for ResourceMetadata {
    type Error = Error;
    fn try_from(row: MetadataRow) -> Result<Self, Self::Error> {
        Ok(Self {
            resource_type: row
                .resource_type
                .parse::<ResourceType>()
                .or_raise(|| ErrorKind::InvalidData("resource type"))?,
            id: row.id,
            server: row.server,
            owner: row.owner,
            language: row.language,
            title: row.title,
            description: row.description,
            name: row.name,
            version: row.version,
            last_updated: timestamp(row.last_updated, "last updated")?,
            available: row.available,
            is_anchor: row.is_anchor,
            toc: serde_json::from_str::<Vec<TocEntry>>(&row.toc).or_raise(|| ErrorKind::InvalidData("toc"))?,
            commit_sha: row.commit_sha,
            file_hashes: serde_json::from_str::<BTreeMap<String, String>>(&row.file_hashes)
                .or_raise(|| ErrorKind::InvalidData("file hashes"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_storage::ResourceKey;
    use time::UtcDateTime;

    #[test]
    fn test_row_conversion() {
        let now = UtcDateTime::from_unix_timestamp(1_750_000_000).unwrap();
        let mut metadata =
            ResourceMetadata::new(ResourceKey::new("srv", "own", "en", "ult"), ResourceType::Scripture, now);
        metadata.toc = vec![TocEntry::new("gen", "Genesis"), TocEntry::new("exo", "Exodus")];
        metadata.file_hashes.insert("01-GEN.usfm".to_string(), "abc123".to_string());
        metadata.is_anchor = true;
        let row = MetadataRow::try_from(&metadata).unwrap();
        assert_eq!(row.resource_type, "scripture");
        assert_eq!(ResourceMetadata::try_from(row).unwrap(), metadata);
    }

    #[test]
    fn test_unknown_resource_type() {
        let metadata = ResourceMetadata::new(
            ResourceKey::new("srv", "own", "en", "ult"),
            ResourceType::Scripture,
            UtcDateTime::now(),
        );
        let mut row = MetadataRow::try_from(&metadata).unwrap();
        row.resource_type = "commentary".to_string();
        let err = ResourceMetadata::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("resource type"));
    }
}
