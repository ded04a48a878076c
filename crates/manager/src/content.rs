//! Content retrieval: cache decisions, fingerprint checks and stale fallback.

use exn::ResultExt;
use scriptorium_storage::ContentKey;
use scriptorium_storage::models::{OrganizationType, Payload, ResourceContent, ResourceType};
use time::UtcDateTime;
use tracing::instrument;

use crate::adapter::AdapterHandle;
use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::manager::ResourceManager;

impl ResourceManager {
    /// Payload for `key`, from storage or the remote.
    ///
    /// Offline, only storage is consulted and a miss is `Ok(None)`. Online,
    /// a cached row that has not expired is served unless the owning adapter
    /// reports (by fingerprint) that the remote changed. Anything else is
    /// fetched; if the fetch fails and any cached row exists, however old,
    /// that row is re-stamped and served instead of raising.
    #[instrument(skip(self, ctx), fields(offline = ctx.offline, force = ctx.force_refresh))]
    pub async fn get_or_fetch_content(
        &self,
        ctx: &Context,
        key: &str,
        resource_type: ResourceType,
    ) -> Result<Option<Payload>> {
        let key = ContentKey::parse(key).or_raise(|| ErrorKind::InvalidKey(key.to_string()))?;
        match self.load_content(ctx, &key, resource_type).await {
            Ok(payload) => Ok(payload),
            // Last chance: a row may have appeared, or the first read may
            // have been the thing that failed.
            Err(err) => match self.storage().get_resource_content(&key).await {
                Ok(Some(row)) => {
                    tracing::warn!(%key, error = ?err, "Serving cached content after failure");
                    Ok(Some(row.content))
                },
                _ => Err(err),
            },
        }
    }

    async fn load_content(
        &self,
        ctx: &Context,
        key: &ContentKey,
        resource_type: ResourceType,
    ) -> Result<Option<Payload>> {
        let cached = self.storage().get_resource_content(key).await.or_raise(|| ErrorKind::Storage)?;
        if ctx.offline {
            return Ok(cached.map(|row| row.content));
        }

        let now = UtcDateTime::now();
        if let Some(row) = &cached
            && !ctx.force_refresh
            && !row.is_expired(now)
            && !self.has_remote_changed(row, resource_type).await
        {
            tracing::debug!(%key, "Serving cached content");
            return Ok(Some(row.content.clone()));
        }

        let fetched = match self.registry().resolve(&key.resource, resource_type).await {
            Ok(adapter) => self.fetch_content(&adapter, key, resource_type, now).await,
            Err(err) => Err(err),
        };
        match fetched {
            Ok(row) => {
                if let Err(err) = self.storage().save_resource_content(&row).await {
                    tracing::warn!(%key, error = ?err, "Failed to persist fetched content");
                }
                Ok(Some(row.content))
            },
            Err(err) => match cached {
                Some(mut row) => {
                    tracing::warn!(%key, error = ?err, "Fetch failed, serving stale content");
                    row.restamp(now, self.config().expires_at(now));
                    if let Err(err) = self.storage().save_resource_content(&row).await {
                        tracing::warn!(%key, error = ?err, "Failed to re-stamp stale content");
                    }
                    Ok(Some(row.content))
                },
                None => Err(err),
            },
        }
    }

    /// Whether a cached, unexpired row needs re-fetching.
    ///
    /// Only ever `true` when the owning adapter supports fingerprints, the
    /// row carries one, and the adapter positively reports a change. A failed
    /// check counts as unchanged.
    async fn has_remote_changed(&self, row: &ResourceContent, resource_type: ResourceType) -> bool {
        let Some(previous) = row.source_sha.as_deref() else {
            return false;
        };
        let Ok(adapter) = self.registry().resolve(row.resource_key(), resource_type).await else {
            return false;
        };
        if !adapter.supports_fingerprints() {
            return false;
        }
        match self.remote(|_| adapter.has_content_changed(&row.key, previous)).await {
            Ok(changed) => {
                tracing::debug!(key = %row.key, changed, "Checked remote fingerprint");
                changed
            },
            Err(failure) => {
                tracing::warn!(key = %row.key, error = ?failure.source, "Fingerprint check failed");
                false
            },
        }
    }

    async fn fetch_content(
        &self,
        adapter: &AdapterHandle,
        key: &ContentKey,
        resource_type: ResourceType,
        now: UtcDateTime,
    ) -> Result<ResourceContent> {
        let organization = adapter.organization();
        let fetched = match organization {
            OrganizationType::Book => self.remote(|_| adapter.get_book_content(key)).await,
            OrganizationType::Entry => self.remote(|_| adapter.get_entry_content(key)).await,
        };
        let payload = match fetched {
            Ok(payload) => payload,
            Err(failure) => return failure.raise(|attempts| ErrorKind::FetchFailed { key: key.to_string(), attempts }),
        };
        if self.config().validate_content && (!payload.matches(resource_type) || payload.is_empty()) {
            exn::bail!(ErrorKind::InvalidContent(key.to_string()));
        }

        let source_sha = if adapter.supports_fingerprints() {
            self.remote(|_| adapter.get_current_sha(key)).await.ok()
        } else {
            None
        };
        let source_commit = match self.storage().get_resource_metadata(key.server(), key.owner(), key.language()).await {
            Ok(rows) => rows.into_iter().find(|row| row.id == key.resource_id()).and_then(|row| row.commit_sha),
            Err(_) => None,
        };
        Ok(ResourceContent::new(key.clone(), resource_type, organization, payload, now)
            .or_raise(|| ErrorKind::InvalidContent(key.to_string()))?
            .with_expiry(self.config().expires_at(now))
            .with_source(source_sha, source_commit))
    }
}
