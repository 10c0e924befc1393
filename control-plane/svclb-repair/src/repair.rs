use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use svclb_store::{
    KIND_EXTERNAL_ID, LoadBalancerStore, PolicyStore, SERVICE_KIND,
    ServiceLister, StoreResult,
};

use crate::backoff::Backoff;
use crate::config::RepairConfig;
use crate::errors::RepairError;
use crate::owners::decode_owner;

/// Pre-sync and post-sync cleanup for service load balancers.
///
/// [`RepairController::run_before_sync`] runs once before any sync worker
/// starts: it deletes load balancers whose owning service no longer
/// exists and purges the deprecated reject rules. Workers then report
/// per-service completion through [`RepairController::report_synced`];
/// the call that drains the unsynced set spawns a detached task that
/// deletes the load balancers left over from the legacy representation,
/// retrying with bounded backoff.
pub struct RepairController {
    services: Arc<dyn ServiceLister>,
    lbs: Arc<dyn LoadBalancerStore>,
    policy: Arc<dyn PolicyStore>,
    config: RepairConfig,

    // Every service that must sync at least once before the post-sync
    // cleanup may run. Drained by report_synced, never refilled.
    unsynced: Mutex<HashSet<String>>,

    // Write-once: flipped by the post-sync task when the legacy load
    // balancers are gone.
    legacy_lbs_deleted: AtomicBool,
}

impl RepairController {
    pub fn new(
        services: Arc<dyn ServiceLister>,
        lbs: Arc<dyn LoadBalancerStore>,
        policy: Arc<dyn PolicyStore>,
        config: RepairConfig,
    ) -> Self {
        Self {
            services,
            lbs,
            policy,
            config,
            unsynced: Mutex::new(HashSet::new()),
            legacy_lbs_deleted: AtomicBool::new(false),
        }
    }

    /// One-shot repair pass. Must complete before any worker calls
    /// [`RepairController::report_synced`]; an error aborts controller
    /// startup.
    pub async fn run_before_sync(
        &self,
        cluster_port_group: &str,
    ) -> Result<(), RepairError> {
        let start = Instant::now();
        debug!("starting repair loop for services");

        // Unidling depends on controller events, so a failure here is
        // fatal rather than best-effort.
        if self.config.empty_lb_events {
            if let Err(e) = self.lbs.enable_controller_events().await {
                warn!(error = %e, "unable to enable controller events, unidling not possible");
                return Err(RepairError::Configuration(e));
            }
        }

        // Snapshot every service that exists right now; the post-sync
        // cleanup runs once each of them has synced at least once.
        let keys = self.services.list_service_keys().await;
        {
            let mut unsynced = self.lock_unsynced();
            for key in &keys {
                unsynced.insert(key.to_string());
            }
        }

        let filter = HashMap::from([(
            KIND_EXTERNAL_ID.to_string(),
            SERVICE_KIND.to_string(),
        )]);
        let existing = self
            .lbs
            .find_load_balancers(&filter)
            .await
            .map_err(RepairError::List)?;

        let mut stale: Vec<String> = Vec::new();
        for lb in &existing {
            let key = match decode_owner(lb.owner().unwrap_or_default()) {
                Ok(key) => key,
                Err(e) => {
                    warn!(uuid = %lb.uuid, error = %e, "service load balancer has unreadable owner, deleting");
                    stale.push(lb.uuid.clone());
                    continue;
                }
            };
            match self.services.get_service(&key.namespace, &key.name).await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!(uuid = %lb.uuid, owner = %key, "found stale service load balancer");
                    stale.push(lb.uuid.clone());
                }
                Err(e) => {
                    // The lookup itself failed, so existence is unknown.
                    // Keep the load balancer rather than delete on an
                    // ambiguous answer.
                    debug!(uuid = %lb.uuid, owner = %key, error = %e, "owner lookup failed, keeping load balancer");
                }
            }
        }

        let stale_count = stale.len();
        self.lbs
            .delete_load_balancers(&stale)
            .await
            .map_err(RepairError::Delete)?;
        info!(deleted = stale_count, "deleted stale service load balancers");

        // Reject rules are superseded by idling load balancers.
        self.policy
            .purge_reject_rules(cluster_port_group)
            .await
            .map_err(RepairError::PurgeRules)?;

        debug!(elapsed = ?start.elapsed(), "finished repair loop for services");
        Ok(())
    }

    /// Called by a worker after it successfully applied one service.
    /// Safe to call concurrently, with duplicate or unknown keys, and
    /// after everything has synced; it never blocks on I/O. The one call
    /// that drains the unsynced set spawns the post-sync cleanup, so the
    /// cleanup runs at most once per controller lifetime.
    pub fn report_synced(self: &Arc<Self>, key: &str) {
        let mut unsynced = self.lock_unsynced();
        if unsynced.is_empty() {
            return;
        }
        unsynced.remove(key);
        let all_synced = unsynced.is_empty();
        drop(unsynced);

        if all_synced {
            debug!("every known service synced at least once");
            let repair = Arc::clone(self);
            tokio::spawn(async move { repair.run_after_sync().await });
        }
    }

    /// True once the post-sync cleanup has removed every legacy load
    /// balancer, so callers can stop searching for them.
    pub fn legacy_cleanup_done(&self) -> bool {
        self.legacy_lbs_deleted.load(Ordering::Acquire)
    }

    // Runs detached from the worker that triggered it. Errors are logged
    // and retried on the configured schedule; once the budget is spent
    // the legacy load balancers stay behind until the next restart.
    async fn run_after_sync(&self) {
        let mut backoff = Backoff::from(&self.config.backoff);
        for attempt in 1..=self.config.backoff.steps {
            info!(attempt, "running service post-sync cleanup");
            match self.delete_legacy_lbs().await {
                Ok(()) => {
                    self.legacy_lbs_deleted.store(true, Ordering::Release);
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "failed to delete legacy load balancers");
                }
            }
            if let Some(delay) = backoff.next_delay() {
                tokio::time::sleep(delay).await;
            }
        }
        warn!("giving up on legacy load balancer cleanup");
    }

    async fn delete_legacy_lbs(&self) -> StoreResult<()> {
        let legacy = self.lbs.find_legacy_load_balancers().await?;
        let uuids: Vec<String> =
            legacy.into_iter().map(|lb| lb.uuid).collect();
        debug!(count = uuids.len(), "deleting legacy load balancers");
        self.lbs.delete_load_balancers(&uuids).await
    }

    fn lock_unsynced(&self) -> MutexGuard<'_, HashSet<String>> {
        self.unsynced.lock().unwrap_or_else(|e| e.into_inner())
    }
}
