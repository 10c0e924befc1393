use svclb_store::StoreError;
use thiserror::Error;

/// Failures of the pre-sync repair pass. Every variant is fatal: the
/// caller must not start sync workers after an error.
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Failed to enable controller events: {0}")]
    Configuration(#[source] StoreError),

    #[error("Failed to list service load balancers: {0}")]
    List(#[source] StoreError),

    #[error("Failed to delete stale load balancers: {0}")]
    Delete(#[source] StoreError),

    #[error("Failed to purge reject rules: {0}")]
    PurgeRules(#[source] StoreError),
}
