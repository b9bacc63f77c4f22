use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

use crate::config::SyncConfig;

/// Reconnect delays of `base * 2^n`, capped, restarting after every
/// successful open.
pub struct ReconnectBackoff {
    base_ms: u64,
    max_delay: Duration,
    strategy: ExponentialBackoff,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(base_ms: u64, max_delay: Duration) -> Self {
        Self {
            base_ms,
            max_delay,
            strategy: strategy(base_ms, max_delay),
            attempt: 0,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.reconnect_base_delay_ms, config.reconnect_max_delay())
    }

    pub fn next_delay(&mut self) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        self.strategy.next().unwrap_or(self.max_delay).min(self.max_delay)
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.strategy = strategy(self.base_ms, self.max_delay);
        self.attempt = 0;
    }
}

fn strategy(base_ms: u64, max_delay: Duration) -> ExponentialBackoff {
    // yields factor * 2, factor * 4, ...
    ExponentialBackoff::from_millis(2)
        .factor(base_ms)
        .max_delay(max_delay)
}
