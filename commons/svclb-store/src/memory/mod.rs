use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{KIND_EXTERNAL_ID, LoadBalancer, ServiceKey};
use crate::traits::{
    LoadBalancerStore, PolicyStore, ServiceLister, StoreResult,
};

/// In-memory service collection for tests. Lookups for keys registered
/// through [`MemoryServiceLister::fail_lookup`] return an error instead of
/// an answer.
#[derive(Clone, Default)]
pub struct MemoryServiceLister {
    services: Arc<RwLock<HashSet<ServiceKey>>>,
    failing: Arc<RwLock<HashSet<ServiceKey>>>,
}

impl MemoryServiceLister {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, key: ServiceKey) {
        self.services.write().await.insert(key);
    }

    pub async fn remove(&self, key: &ServiceKey) {
        self.services.write().await.remove(key);
    }

    pub async fn fail_lookup(&self, key: ServiceKey) {
        self.failing.write().await.insert(key);
    }
}

#[async_trait]
impl ServiceLister for MemoryServiceLister {
    async fn list_service_keys(&self) -> Vec<ServiceKey> {
        self.services.read().await.iter().cloned().collect()
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> StoreResult<bool> {
        let key = ServiceKey::new(namespace, name);
        if self.failing.read().await.contains(&key) {
            return Err(StoreError::Connection(format!(
                "Lookup of {} unavailable",
                key
            )));
        }
        Ok(self.services.read().await.contains(&key))
    }
}

/// In-memory load balancer table for tests, with switches to make calls
/// fail and counters to observe them.
#[derive(Clone, Default)]
pub struct MemoryLbStore {
    lbs: Arc<RwLock<HashMap<String, LoadBalancer>>>,
    events_enabled: Arc<AtomicBool>,
    fail_events: Arc<AtomicBool>,
    fail_listing: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    delete_calls: Arc<AtomicUsize>,
    legacy_searches: Arc<AtomicUsize>,
}

impl MemoryLbStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, lb: LoadBalancer) {
        self.lbs.write().await.insert(lb.uuid.clone(), lb);
    }

    pub async fn contains(&self, uuid: &str) -> bool {
        self.lbs.read().await.contains_key(uuid)
    }

    pub async fn len(&self) -> usize {
        self.lbs.read().await.len()
    }

    pub fn events_enabled(&self) -> bool {
        self.events_enabled.load(Ordering::SeqCst)
    }

    pub fn set_fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// How many times `delete_load_balancers` has been called, failed
    /// calls included.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// How many times `find_legacy_load_balancers` has been called,
    /// failed calls included.
    pub fn legacy_searches(&self) -> usize {
        self.legacy_searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadBalancerStore for MemoryLbStore {
    async fn find_load_balancers(
        &self,
        external_ids: &HashMap<String, String>,
    ) -> StoreResult<Vec<LoadBalancer>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "Load balancer listing unavailable".into(),
            ));
        }
        let lbs = self.lbs.read().await;
        Ok(lbs
            .values()
            .filter(|lb| {
                external_ids.iter().all(|(k, v)| {
                    lb.external_ids.get(k).is_some_and(|found| found == v)
                })
            })
            .cloned()
            .collect())
    }

    async fn find_legacy_load_balancers(
        &self,
    ) -> StoreResult<Vec<LoadBalancer>> {
        self.legacy_searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "Load balancer listing unavailable".into(),
            ));
        }
        // Legacy records predate the external-ID tagging scheme.
        let lbs = self.lbs.read().await;
        Ok(lbs
            .values()
            .filter(|lb| !lb.external_ids.contains_key(KIND_EXTERNAL_ID))
            .cloned()
            .collect())
    }

    async fn delete_load_balancers(
        &self,
        uuids: &[String],
    ) -> StoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Delete rejected".into()));
        }
        let mut lbs = self.lbs.write().await;
        for uuid in uuids {
            lbs.remove(uuid);
        }
        Ok(())
    }

    async fn enable_controller_events(&self) -> StoreResult<()> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "Control plane unreachable".into(),
            ));
        }
        self.events_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory policy layer for tests; records which port groups were
/// purged.
#[derive(Clone, Default)]
pub struct MemoryPolicyStore {
    purged: Arc<RwLock<Vec<String>>>,
    fail_purge: Arc<AtomicBool>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn purged(&self) -> Vec<String> {
        self.purged.read().await.clone()
    }

    pub fn set_fail_purge(&self, fail: bool) {
        self.fail_purge.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn purge_reject_rules(
        &self,
        port_group_uuid: &str,
    ) -> StoreResult<()> {
        if self.fail_purge.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("Purge rejected".into()));
        }
        self.purged.write().await.push(port_group_uuid.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OWNER_EXTERNAL_ID, SERVICE_KIND};

    #[tokio::test]
    async fn find_filters_on_external_ids() {
        let store = MemoryLbStore::new();
        store
            .insert(LoadBalancer::service_owned("lb-1", "ns/web"))
            .await;
        store.insert(LoadBalancer::legacy("lb-2")).await;

        let filter = HashMap::from([(
            KIND_EXTERNAL_ID.to_string(),
            SERVICE_KIND.to_string(),
        )]);
        let found = store.find_load_balancers(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uuid, "lb-1");
        assert_eq!(
            found[0].external_ids.get(OWNER_EXTERNAL_ID).unwrap(),
            "ns/web"
        );
    }

    #[tokio::test]
    async fn legacy_search_returns_untagged_records() {
        let store = MemoryLbStore::new();
        store
            .insert(LoadBalancer::service_owned("lb-1", "ns/web"))
            .await;
        store.insert(LoadBalancer::legacy("lb-2")).await;

        let legacy = store.find_legacy_load_balancers().await.unwrap();
        assert_eq!(legacy.len(), 1);
        assert_eq!(legacy[0].uuid, "lb-2");
        assert_eq!(store.legacy_searches(), 1);
    }

    #[tokio::test]
    async fn delete_is_batched_and_counted() {
        let store = MemoryLbStore::new();
        store.insert(LoadBalancer::legacy("lb-1")).await;
        store.insert(LoadBalancer::legacy("lb-2")).await;

        store
            .delete_load_balancers(&["lb-1".into(), "lb-2".into()])
            .await
            .unwrap();
        assert_eq!(store.len().await, 0);
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_distinguished_from_absence() {
        let lister = MemoryServiceLister::new();
        lister.add(ServiceKey::new("ns", "web")).await;
        lister.fail_lookup(ServiceKey::new("ns", "db")).await;

        assert!(lister.get_service("ns", "web").await.unwrap());
        assert!(!lister.get_service("ns", "gone").await.unwrap());
        assert!(lister.get_service("ns", "db").await.is_err());
    }
}
