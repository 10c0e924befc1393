use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{LoadBalancer, ServiceKey};

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the source-of-truth service collection, backed by the
/// host controller's informer cache.
#[async_trait]
pub trait ServiceLister: Send + Sync {
    /// Snapshot of every service key currently known. Listing reads a
    /// local cache and cannot fail.
    async fn list_service_keys(&self) -> Vec<ServiceKey>;

    /// Whether `namespace/name` currently exists. `Err` means the lookup
    /// itself failed and existence is unknown, not that the service is
    /// absent.
    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> StoreResult<bool>;
}

/// The network control-plane's load balancer table.
#[async_trait]
pub trait LoadBalancerStore: Send + Sync {
    /// All load balancers whose external IDs contain every entry of
    /// `external_ids`.
    async fn find_load_balancers(
        &self,
        external_ids: &HashMap<String, String>,
    ) -> StoreResult<Vec<LoadBalancer>>;

    /// All load balancers still in the deprecated legacy representation.
    async fn find_legacy_load_balancers(&self)
    -> StoreResult<Vec<LoadBalancer>>;

    /// Batch delete by UUID. An empty batch is a no-op.
    async fn delete_load_balancers(&self, uuids: &[String])
    -> StoreResult<()>;

    /// Ask the control plane to emit controller events, required for
    /// on-demand wake-up of idled load balancers.
    async fn enable_controller_events(&self) -> StoreResult<()>;
}

/// The ACL/policy layer of the network control plane.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Remove the deprecated reject-rule set from the given port group.
    /// Reject rules are superseded by idling load balancers.
    async fn purge_reject_rules(
        &self,
        port_group_uuid: &str,
    ) -> StoreResult<()>;
}
