//! Bulk content loading.

use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use scriptorium_storage::models::{Payload, ResourceType};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::manager::ResourceManager;

/// Upper bound on content loads in flight during a preload.
pub const MAX_PRELOAD_CONCURRENCY: usize = 8;

/// Progress events emitted by [`ResourceManager::preload_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the number of keys.
/// 2. [`Loaded`](Self::Loaded), [`Missing`](Self::Missing) or
///    [`Failed`](Self::Failed): once per key, in completion order.
/// 3. [`Complete`](Self::Complete): exactly once, with the totals.
#[derive(Debug)]
pub enum PreloadEvent {
    Started(usize),
    /// Content is available (cached or freshly fetched).
    Loaded(String),
    /// Offline and not cached.
    Missing(String),
    Failed { key: String, error: Error },
    Complete(PreloadSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    pub requested: usize,
    pub loaded: usize,
    pub missing: usize,
    pub failed: usize,
}

impl ResourceManager {
    /// Load every key concurrently, in the background of the caller's
    /// choosing. Individual failures are logged and counted, never raised.
    pub async fn preload_content<K: AsRef<str>>(
        &self,
        ctx: &Context,
        keys: &[K],
        resource_type: ResourceType,
    ) -> PreloadSummary {
        let events = self.preload_stream(ctx, keys, resource_type);
        futures::pin_mut!(events);
        let mut summary = PreloadSummary::default();
        while let Some(event) = events.next().await {
            match event {
                PreloadEvent::Failed { key, error } => {
                    tracing::warn!(%key, error = ?error, "Preload failed");
                },
                PreloadEvent::Complete(totals) => summary = totals,
                _ => {},
            }
        }
        tracing::info!(
            requested = summary.requested,
            loaded = summary.loaded,
            missing = summary.missing,
            failed = summary.failed,
            "Preload finished"
        );
        summary
    }

    /// Streams [`PreloadEvent`]s while loading every key through
    /// [`get_or_fetch_content`](Self::get_or_fetch_content), at most
    /// [`MAX_PRELOAD_CONCURRENCY`] at a time. A failing key never stops the
    /// others.
    pub fn preload_stream<'a, K: AsRef<str>>(
        &'a self,
        ctx: &'a Context,
        keys: &'a [K],
        resource_type: ResourceType,
    ) -> impl Stream<Item = PreloadEvent> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            let mut summary = PreloadSummary { requested: keys.len(), ..PreloadSummary::default() };
            yield PreloadEvent::Started(keys.len());

            let mut pending = keys.iter().map(|key| self.preload_one(ctx, key.as_ref(), resource_type));
            let mut loading = FuturesUnordered::new();
            loading.extend(pending.by_ref().take(MAX_PRELOAD_CONCURRENCY));
            while let Some((key, result)) = loading.next().await {
                let event = match result {
                    Ok(Some(_)) => {
                        summary.loaded += 1;
                        PreloadEvent::Loaded(key)
                    },
                    Ok(None) => {
                        summary.missing += 1;
                        PreloadEvent::Missing(key)
                    },
                    Err(error) => {
                        summary.failed += 1;
                        PreloadEvent::Failed { key, error }
                    },
                };
                yield event;
                if let Some(next) = pending.next() {
                    loading.push(next);
                }
            }

            yield PreloadEvent::Complete(summary);
        })
    }

    async fn preload_one(
        &self,
        ctx: &Context,
        key: &str,
        resource_type: ResourceType,
    ) -> (String, Result<Option<Payload>>) {
        (key.to_string(), self.get_or_fetch_content(ctx, key, resource_type).await)
    }
}
