//! Retry policy for completion calls
//!
//! Exponential backoff with multiplicative jitter:
//!
//! ```text
//! delay(n) = min(base * multiplier^n, max) * (1 + uniform(-jitter, +jitter))
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff policy injected into the completion client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first call (total calls = max_retries + 1)
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound on any single delay before jitter (milliseconds)
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays
    pub multiplier: f64,

    /// Jitter as a fraction of the delay, in [0.0, 1.0]
    #[serde(default)]
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy, for deterministic tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Same policy with a different retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `retry` (0-indexed)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.min(32) as i32;
        let base = self.base_delay_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let jitter = if self.jitter_factor > 0.0 {
            let range = capped * self.jitter_factor.min(1.0);
            (rand::random::<f64>() * 2.0 - 1.0) * range
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.multiplier < 1.0 {
            return Err("multiplier must be at least 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err("jitter_factor must be within [0.0, 1.0]".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err("base_delay_ms cannot exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}
