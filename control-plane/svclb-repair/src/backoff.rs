use std::time::Duration;

use crate::config::BackoffConfig;

/// Bounded exponential backoff schedule: `steps` attempts in total, with
/// the delay between attempts starting at `initial` and growing by
/// `factor`. No jitter, so the schedule is deterministic.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    factor: f64,
    remaining: u32,
}

impl Backoff {
    pub fn new(initial: Duration, factor: f64, steps: u32) -> Self {
        Self {
            delay: initial,
            factor,
            remaining: steps,
        }
    }

    /// The delay to sleep before the next attempt, or `None` once the
    /// attempt budget is spent. There is no sleep after the final
    /// attempt.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining <= 1 {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        let delay = self.delay;
        self.delay = self.delay.mul_f64(self.factor);
        Some(delay)
    }
}

impl From<&BackoffConfig> for Backoff {
    fn from(cfg: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.initial_ms),
            cfg.factor,
            cfg.steps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_four_attempts() {
        let mut backoff = Backoff::from(&BackoffConfig::default());
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(50)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn single_step_never_sleeps() {
        let mut backoff = Backoff::new(Duration::from_millis(10), 2.0, 1);
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn zero_steps_is_empty() {
        let mut backoff = Backoff::new(Duration::from_millis(10), 2.0, 0);
        assert_eq!(backoff.next_delay(), None);
    }
}
