//! Resolution tuning.

use std::time::Duration;

use assetlift_protocol::constants::PROBE_TIMEOUT;

/// Resolution engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Timeout for a single reachability probe.
    pub probe_timeout: Duration,
    /// Re-probes of the original URL after every strategy failed.
    pub backoff_attempts: u32,
    /// Delay before the first re-probe; doubles on each attempt.
    pub backoff_base: Duration,
    /// Distance of the alternate version timestamps from now.
    pub version_offset: Duration,
    /// Extensions substituted for one another in alternate patterns.
    pub alt_extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            probe_timeout: PROBE_TIMEOUT,
            backoff_attempts: 3,
            backoff_base: Duration::from_secs(2),
            version_offset: Duration::from_secs(300),
            alt_extensions: ["jpg", "jpeg", "png", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ResolveConfig {
    /// Delay before backoff attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1u32 << exp)
    }
}
