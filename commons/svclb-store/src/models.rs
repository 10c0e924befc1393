use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// External-ID key identifying what kind of resource a load balancer
/// realizes.
pub const KIND_EXTERNAL_ID: &str = "svclb.io/kind";

/// External-ID key carrying the owner identity (`namespace/name` of the
/// owning service).
pub const OWNER_EXTERNAL_ID: &str = "svclb.io/owner";

/// Kind value tagged on load balancers derived from services.
pub const SERVICE_KIND: &str = "Service";

/// Key of one service definition in the source-of-truth collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceKey {
    pub namespace: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// One load balancer record in the external network store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub uuid: String,
    pub external_ids: HashMap<String, String>,
}

impl LoadBalancer {
    /// A load balancer tagged as derived from a service, with its owner
    /// identity set.
    pub fn service_owned(
        uuid: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            external_ids: HashMap::from([
                (KIND_EXTERNAL_ID.to_string(), SERVICE_KIND.to_string()),
                (OWNER_EXTERNAL_ID.to_string(), owner.into()),
            ]),
        }
    }

    /// An untagged load balancer in the deprecated legacy representation.
    pub fn legacy(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            external_ids: HashMap::new(),
        }
    }

    /// The owner identity stored on this load balancer, if any.
    pub fn owner(&self) -> Option<&str> {
        self.external_ids.get(OWNER_EXTERNAL_ID).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_key_display() {
        let key = ServiceKey::new("ns", "web");
        assert_eq!(key.to_string(), "ns/web");
    }

    #[test]
    fn service_owned_lb_carries_tags() {
        let lb = LoadBalancer::service_owned("uuid-1", "ns/web");
        assert_eq!(
            lb.external_ids.get(KIND_EXTERNAL_ID).map(String::as_str),
            Some(SERVICE_KIND)
        );
        assert_eq!(lb.owner(), Some("ns/web"));
    }

    #[test]
    fn legacy_lb_has_no_owner() {
        assert_eq!(LoadBalancer::legacy("uuid-2").owner(), None);
    }
}
