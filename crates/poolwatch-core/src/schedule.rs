//! Poll scheduler: decides how long to wait between sync iterations.
//!
//! A clean iteration waits `interval`. Each consecutive failed iteration
//! multiplies the wait by `multiplier`, capped at `max_backoff`. Random
//! jitter of up to `jitter_fraction * delay` is added on top so several
//! pollers do not hit a provider in lockstep.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Delay between clean iterations.
    pub interval: Duration,
    /// Upper bound for the backoff delay after failures.
    pub max_backoff: Duration,
    /// Multiplier applied per consecutive failed iteration.
    pub multiplier: f64,
    /// Extra random delay, as a fraction of the base delay (0.0 = none, at most 1.0).
    pub jitter_fraction: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

/// Stateful scheduler: tracks consecutive failed iterations.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    config: SchedulerConfig,
    consecutive_failures: u32,
}

impl PollScheduler {
    // 2^16 * interval is far past any sane max_backoff.
    const MAX_EXPONENT: u32 = 16;

    /// Out-of-range factors are clamped: `jitter_fraction` into `[0, 1]`
    /// (NaN counts as 0) and `multiplier` to at least 1 (NaN counts as 1).
    pub fn new(mut config: SchedulerConfig) -> Self {
        config.jitter_fraction = if config.jitter_fraction.is_nan() {
            0.0
        } else {
            config.jitter_fraction.clamp(0.0, 1.0)
        };
        config.multiplier = if config.multiplier.is_nan() {
            1.0
        } else {
            config.multiplier.max(1.0)
        };
        Self {
            config,
            consecutive_failures: 0,
        }
    }

    /// Record the outcome of an iteration and return the delay before the next one.
    pub fn next_delay(&mut self, iteration_failed: bool) -> Duration {
        if iteration_failed {
            self.consecutive_failures = (self.consecutive_failures + 1).min(Self::MAX_EXPONENT);
        } else {
            self.consecutive_failures = 0;
        }
        let base = self.base_delay();
        if self.consecutive_failures > 0 {
            debug!(
                failures = self.consecutive_failures,
                delay_ms = base.as_millis() as u64,
                "iteration failed, backing off"
            );
        }
        base.saturating_add(self.jitter(base))
    }

    /// Delay for the current failure count, without jitter.
    pub fn base_delay(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return self.config.interval;
        }
        let interval_ms = self.config.interval.as_millis() as f64;
        let backoff_ms = interval_ms * self.config.multiplier.powi(self.consecutive_failures as i32);
        let cap_ms = self.config.max_backoff.as_millis() as f64;
        Duration::from_millis(backoff_ms.min(cap_ms).max(interval_ms) as u64)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn jitter(&self, base: Duration) -> Duration {
        if self.config.jitter_fraction <= 0.0 || base.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = base.as_millis() as f64 * self.config.jitter_fraction;
        let ms = rand::thread_rng().gen_range(0.0..=max_ms);
        Duration::from_millis(ms as u64)
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
