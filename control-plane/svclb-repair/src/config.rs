use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct RepairConfig {
    /// Enable controller events on the network control plane so idled
    /// load balancers can be woken on demand.
    /// Env: SVCLB_EMPTY_LB_EVENTS
    #[envconfig(from = "SVCLB_EMPTY_LB_EVENTS", default = "false")]
    pub empty_lb_events: bool,

    #[envconfig(nested)]
    pub backoff: BackoffConfig,
}

/// Retry schedule for the post-sync legacy cleanup. The defaults match
/// the schedule the cleanup was tuned for: four attempts starting at 10ms
/// and growing five-fold.
#[derive(Envconfig, Clone, Debug)]
pub struct BackoffConfig {
    #[envconfig(from = "SVCLB_RETRY_INITIAL_MS", default = "10")]
    pub initial_ms: u64,

    #[envconfig(from = "SVCLB_RETRY_FACTOR", default = "5.0")]
    pub factor: f64,

    #[envconfig(from = "SVCLB_RETRY_STEPS", default = "4")]
    pub steps: u32,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            empty_lb_events: false,
            backoff: BackoffConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 10,
            factor: 5.0,
            steps: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_env_defaults() {
        let cfg = RepairConfig::default();
        assert!(!cfg.empty_lb_events);
        assert_eq!(cfg.backoff.initial_ms, 10);
        assert_eq!(cfg.backoff.factor, 5.0);
        assert_eq!(cfg.backoff.steps, 4);
    }
}
