//! Adapter lookup and the transient routing map.

use scriptorium_storage::ResourceKey;
use scriptorium_storage::models::ResourceType;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapter::AdapterHandle;
use crate::error::{ErrorKind, Result};

/// Registered adapters plus a best-effort map of which adapter last served
/// which resource.
///
/// The routing map is rebuilt from scratch every process and never
/// persisted. A stale or missing route only costs a slower lookup: resolution
/// always falls back to matching by resource type and id.
pub struct AdapterRegistry {
    adapters: Vec<AdapterHandle>,
    routes: RwLock<HashMap<ResourceKey, AdapterHandle>>,
}
impl AdapterRegistry {
    pub fn new(adapters: Vec<AdapterHandle>) -> Self {
        Self { adapters, routes: RwLock::new(HashMap::new()) }
    }

    pub fn adapters(&self) -> &[AdapterHandle] {
        &self.adapters
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Remember that `adapter` served `key`.
    pub async fn record(&self, key: ResourceKey, adapter: &AdapterHandle) {
        self.routes.write().await.insert(key, Arc::clone(adapter));
    }

    pub async fn route(&self, key: &ResourceKey) -> Option<AdapterHandle> {
        self.routes.read().await.get(key).cloned()
    }

    /// Find the adapter for `key`.
    ///
    /// Tries, in order: the routing map, an adapter whose primary id matches,
    /// then the first adapter listing the id in its priority list. An adapter
    /// is never picked for a resource type it does not declare.
    pub async fn resolve(&self, key: &ResourceKey, resource_type: ResourceType) -> Result<AdapterHandle> {
        if let Some(adapter) = self.route(key).await
            && adapter.resource_type() == resource_type
        {
            return Ok(adapter);
        }
        let candidates = self.adapters.iter().filter(|a| a.resource_type() == resource_type);
        if let Some(adapter) = candidates.clone().find(|a| a.resource_id() == key.resource_id) {
            return Ok(Arc::clone(adapter));
        }
        if let Some(adapter) = candidates.clone().find(|a| a.resource_ids().iter().any(|id| *id == key.resource_id)) {
            return Ok(Arc::clone(adapter));
        }
        let names: Vec<_> = candidates.map(|a| a.resource_id().to_string()).collect();
        exn::bail!(ErrorKind::AdapterNotFound {
            resource: key.to_string(),
            resource_type: resource_type.to_string(),
            candidates: if names.is_empty() { "none".to_string() } else { names.join(", ") },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;
    use rstest::rstest;

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new(vec![
            Arc::new(MockAdapter::new(ResourceType::Scripture, "ult").with_ids(["glt", "ulb"])),
            Arc::new(MockAdapter::new(ResourceType::Scripture, "ust").with_ids(["gst", "ulb"])),
            Arc::new(MockAdapter::new(ResourceType::Notes, "tn")),
        ])
    }

    #[rstest]
    #[case("ult", "ult")]
    #[case("ust", "ust")]
    #[case("glt", "ult")]
    #[case("gst", "ust")]
    #[case("ulb", "ult")]
    #[tokio::test]
    async fn test_resolution_order(#[case] resource_id: &str, #[case] expected: &str) {
        let key = ResourceKey::new("srv", "own", "en", resource_id);
        let adapter = registry().resolve(&key, ResourceType::Scripture).await.unwrap();
        assert_eq!(adapter.resource_id(), expected);
    }

    #[tokio::test]
    async fn test_route_wins() {
        let registry = registry();
        let key = ResourceKey::new("srv", "own", "en", "ulb");
        let ust = Arc::clone(&registry.adapters()[1]);
        registry.record(key.clone(), &ust).await;
        assert_eq!(registry.resolve(&key, ResourceType::Scripture).await.unwrap().resource_id(), "ust");
    }

    #[tokio::test]
    async fn test_never_crosses_resource_types() {
        let registry = registry();
        let key = ResourceKey::new("srv", "own", "en", "ult");
        let ult = Arc::clone(&registry.adapters()[0]);
        registry.record(key.clone(), &ult).await;
        let err = registry.resolve(&key, ResourceType::Notes).await.err().unwrap();
        assert_eq!(
            *err,
            ErrorKind::AdapterNotFound {
                resource: "srv/own/en/ult".to_string(),
                resource_type: "notes".to_string(),
                candidates: "tn".to_string(),
            }
        );
        let err = registry.resolve(&key, ResourceType::Questions).await.err().unwrap();
        assert!(err.to_string().contains("candidates: none"));
    }
}
