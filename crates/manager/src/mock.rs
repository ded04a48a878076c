//! In-process [`ResourceAdapter`] test double.
//!
//! Serves canned metadata and content, counts every remote call, and can be
//! switched into a failing state at any time.

use async_trait::async_trait;
use scriptorium_storage::ContentKey;
use scriptorium_storage::models::{OrganizationType, Payload, ResourceType, TocEntry};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::adapter::error::{ErrorKind, Result};
use crate::adapter::{RemoteMetadata, ResourceAdapter};

/// Scriptable adapter with call counters.
pub struct MockAdapter {
    resource_type: ResourceType,
    resource_id: String,
    resource_ids: Vec<String>,
    organization: OrganizationType,
    metadata: RemoteMetadata,
    content: Mutex<HashMap<String, Payload>>,
    sha: Mutex<Option<String>>,
    delay: Option<Duration>,
    failing: AtomicBool,
    metadata_calls: AtomicUsize,
    content_calls: AtomicUsize,
    fingerprint_calls: AtomicUsize,
}
impl MockAdapter {
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        let resource_id = resource_id.into();
        Self {
            resource_type,
            organization: resource_type.organization(),
            metadata: RemoteMetadata {
                id: resource_id.clone(),
                title: resource_id.to_uppercase(),
                available: true,
                ..RemoteMetadata::default()
            },
            resource_id,
            resource_ids: Vec::new(),
            content: Mutex::new(HashMap::new()),
            sha: Mutex::new(None),
            delay: None,
            failing: AtomicBool::new(false),
            metadata_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
            fingerprint_calls: AtomicUsize::new(0),
        }
    }

    /// Declare alternative resource ids, in priority order.
    pub fn with_ids<I: Into<String>>(mut self, ids: impl IntoIterator<Item = I>) -> Self {
        self.resource_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_toc(mut self, toc: Vec<TocEntry>) -> Self {
        self.metadata.toc = toc;
        self
    }

    pub fn with_anchor(mut self, is_anchor: bool) -> Self {
        self.metadata.is_anchor = is_anchor;
        self
    }

    pub fn with_commit(mut self, commit_sha: impl Into<String>) -> Self {
        self.metadata.commit_sha = Some(commit_sha.into());
        self
    }

    /// Serve `payload` for the given content id.
    pub fn with_content(self, content_id: impl Into<String>, payload: Payload) -> Self {
        self.set_content(content_id, payload);
        self
    }

    /// Enable fingerprint support, reporting `sha` as the current remote
    /// fingerprint of every file.
    pub fn with_sha(self, sha: impl Into<String>) -> Self {
        self.set_sha(sha);
        self
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_content(&self, content_id: impl Into<String>, payload: Payload) {
        if let Ok(mut content) = self.content.lock() {
            content.insert(content_id.into(), payload);
        }
    }

    pub fn set_sha(&self, sha: impl Into<String>) {
        if let Ok(mut current) = self.sha.lock() {
            *current = Some(sha.into());
        }
    }

    /// Make every subsequent call fail with a network error (or succeed
    /// again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn fingerprint_calls(&self) -> usize {
        self.fingerprint_calls.load(Ordering::SeqCst)
    }

    /// Total number of remote calls of any kind.
    pub fn calls(&self) -> usize {
        self.metadata_calls() + self.content_calls() + self.fingerprint_calls()
    }

    async fn answer(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Network(format!("{} is unreachable", self.resource_id)));
        }
        Ok(())
    }

    fn content_for(&self, key: &ContentKey) -> Result<Payload> {
        let content = self.content.lock().map_err(|_| ErrorKind::InvalidResponse("poisoned".to_string()))?;
        match content.get(&key.content_id) {
            Some(payload) => Ok(payload.clone()),
            None => exn::bail!(ErrorKind::NotFound(key.to_string())),
        }
    }

    fn current_sha(&self) -> Option<String> {
        self.sha.lock().ok().and_then(|sha| sha.clone())
    }
}

#[async_trait]
impl ResourceAdapter for MockAdapter {
    fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    fn resource_id(&self) -> &str {
        &self.resource_id
    }

    fn resource_ids(&self) -> Vec<String> {
        self.resource_ids.clone()
    }

    fn organization(&self) -> OrganizationType {
        self.organization
    }

    async fn get_resource_metadata(&self, _server: &str, _owner: &str, _language: &str) -> Result<RemoteMetadata> {
        self.answer(&self.metadata_calls).await?;
        Ok(self.metadata.clone())
    }

    async fn get_book_content(&self, key: &ContentKey) -> Result<Payload> {
        self.answer(&self.content_calls).await?;
        if self.organization != OrganizationType::Book {
            exn::bail!(ErrorKind::Unsupported("book content"));
        }
        self.content_for(key)
    }

    async fn get_entry_content(&self, key: &ContentKey) -> Result<Payload> {
        self.answer(&self.content_calls).await?;
        if self.organization != OrganizationType::Entry {
            exn::bail!(ErrorKind::Unsupported("entry content"));
        }
        self.content_for(key)
    }

    fn supports_fingerprints(&self) -> bool {
        self.current_sha().is_some()
    }

    async fn get_current_sha(&self, _key: &ContentKey) -> Result<String> {
        self.answer(&self.fingerprint_calls).await?;
        match self.current_sha() {
            Some(sha) => Ok(sha),
            None => exn::bail!(ErrorKind::Unsupported("fingerprints")),
        }
    }
}
