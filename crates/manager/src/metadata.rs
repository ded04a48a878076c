//! Metadata retrieval: merge, stale fallback and anchor normalization.

use exn::ResultExt;
use futures::future::join_all;
use scriptorium_storage::models::{ResourceMetadata, ResourceType};
use time::{Duration, UtcDateTime};
use tracing::instrument;

use crate::adapter::{AdapterHandle, RemoteMetadata};
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::manager::ResourceManager;

/// Metadata updated this recently is fresh regardless of the configured
/// expiry (bundled seed data is stamped at install time).
pub const SEED_FRESHNESS: Duration = Duration::minutes(5);

/// The cached row an adapter would have produced: same resource type, id
/// declared by the adapter, primary id first, then the priority list.
fn cached_for_adapter<'a>(adapter: &AdapterHandle, cached: &'a [ResourceMetadata]) -> Option<&'a ResourceMetadata> {
    let resource_type = adapter.resource_type();
    std::iter::once(adapter.resource_id().to_string())
        .chain(adapter.resource_ids())
        .find_map(|id| cached.iter().find(|row| row.resource_type == resource_type && row.id == id))
}

/// Build the row to store from a fresh remote answer and whatever was cached.
///
/// The remote TOC wins unless the cached one is strictly longer; cached
/// fingerprints are kept when the remote reports none.
fn merge(
    remote: RemoteMetadata,
    resource_type: ResourceType,
    cached: &[ResourceMetadata],
    (server, owner, language): (&str, &str, &str),
    now: UtcDateTime,
) -> ResourceMetadata {
    let mut row = remote.into_metadata(server, owner, language, resource_type, now);
    if let Some(previous) = cached.iter().find(|c| c.id == row.id && c.resource_type == resource_type) {
        if previous.toc.len() > row.toc.len() {
            row.toc = previous.toc.clone();
        }
        if row.commit_sha.is_none() {
            row.commit_sha = previous.commit_sha.clone();
        }
        if row.file_hashes.is_empty() {
            row.file_hashes = previous.file_hashes.clone();
        }
    }
    row
}

/// Only the first scripture row claiming to be the anchor keeps the flag.
pub(crate) fn normalize_anchors(rows: &mut [ResourceMetadata]) {
    let mut seen = false;
    for row in rows.iter_mut().filter(|row| row.resource_type == ResourceType::Scripture && row.is_anchor) {
        if seen {
            row.is_anchor = false;
        }
        seen = true;
    }
}

impl ResourceManager {
    fn is_metadata_fresh(&self, row: &ResourceMetadata, now: UtcDateTime) -> bool {
        let age = row.age(now);
        age <= self.config().cache_expiry() || age <= SEED_FRESHNESS
    }

    async fn fetch_metadata(
        &self,
        adapter: &AdapterHandle,
        server: &str,
        owner: &str,
        language: &str,
    ) -> Result<RemoteMetadata> {
        match self.remote(|_| adapter.get_resource_metadata(server, owner, language)).await {
            Ok(remote) => Ok(remote),
            Err(failure) => failure.raise(|_| {
                ErrorKind::MetadataFetchFailed(format!("{server}/{owner}/{language}/{}", adapter.resource_id()))
            }),
        }
    }

    /// Persist rows; a failure is logged, never raised, because the caller
    /// still gets the data.
    async fn persist_metadata(&self, rows: &[ResourceMetadata]) {
        if let Err(err) = self.storage().save_resource_metadata(rows).await {
            tracing::warn!(error = ?err, rows = rows.len(), "Failed to persist resource metadata");
        }
    }

    /// Metadata for every registered adapter's resource under
    /// `server/owner/language`.
    ///
    /// Offline, this is exactly what storage holds. Online, every adapter is
    /// asked concurrently; an adapter that fails contributes its cached row
    /// (re-stamped) or nothing. If no adapter contributes anything, the
    /// cached rows are returned as they are.
    #[instrument(skip(self, ctx), fields(offline = ctx.offline))]
    pub async fn get_resource_metadata(
        &self,
        ctx: &Context,
        server: &str,
        owner: &str,
        language: &str,
    ) -> Result<Vec<ResourceMetadata>> {
        let cached =
            self.storage().get_resource_metadata(server, owner, language).await.or_raise(|| ErrorKind::Storage)?;
        if ctx.offline {
            return Ok(cached);
        }

        let now = UtcDateTime::now();
        let adapters = self.registry().adapters();
        let results = join_all(adapters.iter().map(|a| self.fetch_metadata(a, server, owner, language))).await;
        let mut fresh = Vec::with_capacity(adapters.len());
        for (adapter, result) in adapters.iter().zip(results) {
            let row = match result {
                Ok(remote) => merge(remote, adapter.resource_type(), &cached, (server, owner, language), now),
                Err(err) => match cached_for_adapter(adapter, &cached) {
                    Some(row) => {
                        tracing::warn!(resource = %row.resource_key(), error = ?err, "Using cached metadata");
                        ResourceMetadata { last_updated: now, ..row.clone() }
                    },
                    None => {
                        tracing::warn!(adapter = adapter.resource_id(), error = ?err, "Skipping adapter");
                        continue;
                    },
                },
            };
            self.registry().record(row.resource_key(), adapter).await;
            fresh.push(row);
        }

        if fresh.is_empty() {
            return Ok(cached);
        }
        normalize_anchors(&mut fresh);
        self.persist_metadata(&fresh).await;
        Ok(fresh)
    }

    /// Metadata for the resource served by a single `adapter`.
    ///
    /// Cached metadata younger than the configured expiry (or than
    /// [`SEED_FRESHNESS`]) is returned without a remote call unless the
    /// context forces a refresh. A failed fetch falls back to the cached row;
    /// with nothing cached, fails with [`ErrorKind::MetadataFetchFailed`].
    #[instrument(skip(self, ctx, adapter), fields(adapter = adapter.resource_id(), offline = ctx.offline))]
    pub async fn get_or_fetch_metadata_for_adapter(
        &self,
        ctx: &Context,
        adapter: &AdapterHandle,
        server: &str,
        owner: &str,
        language: &str,
    ) -> Result<ResourceMetadata> {
        let rows =
            self.storage().get_resource_metadata(server, owner, language).await.or_raise(|| ErrorKind::Storage)?;
        let cached = cached_for_adapter(adapter, &rows).cloned();
        let now = UtcDateTime::now();

        if ctx.offline {
            return match cached {
                Some(row) => Ok(row),
                None => exn::bail!(ErrorKind::MetadataFetchFailed(format!(
                    "{server}/{owner}/{language}/{}",
                    adapter.resource_id()
                ))),
            };
        }
        if let Some(row) = &cached
            && !ctx.force_refresh
            && self.is_metadata_fresh(row, now)
        {
            tracing::debug!(resource = %row.resource_key(), "Cached metadata is fresh");
            self.registry().record(row.resource_key(), adapter).await;
            return Ok(row.clone());
        }

        let row = match self.fetch_metadata(adapter, server, owner, language).await {
            Ok(remote) => merge(remote, adapter.resource_type(), &rows, (server, owner, language), now),
            Err(err) => match cached {
                Some(row) => {
                    tracing::warn!(resource = %row.resource_key(), error = ?err, "Using cached metadata");
                    ResourceMetadata { last_updated: now, ..row }
                },
                None => return Err(err),
            },
        };
        self.registry().record(row.resource_key(), adapter).await;
        self.persist_metadata(std::slice::from_ref(&row)).await;
        Ok(row)
    }
}
