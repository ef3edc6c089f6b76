//! Delivery URL resolution engine.
//!
//! Runs the recovery strategies in a fixed order and stops at the first
//! reachable candidate:
//!
//! 1. the URL as given;
//! 2. the URL without its version parameter;
//! 3. alternate version values;
//! 4. alternate URL shapes (needs a resource id);
//! 5. a platform lookup of the current delivery URL (needs a resource id);
//! 6. re-probes of the original URL with exponential backoff.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use assetlift_platform::PlatformApi;
use assetlift_protocol::{ProbeOutcome, ResolutionAttempt};

use crate::candidates::{alt_patterns, alt_versions, strip_version};
use crate::clock::{Clock, SystemClock};
use crate::config::ResolveConfig;
use crate::error::ResolveError;
use crate::probe::Prober;

/// Recovery strategy that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Direct,
    Versionless,
    AltVersion,
    AltPattern,
    Requery,
    BackoffRetry,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Versionless => "versionless",
            Self::AltVersion => "alt-version",
            Self::AltPattern => "alt-pattern",
            Self::Requery => "requery",
            Self::BackoffRetry => "backoff-retry",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reachable URL and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: String,
    pub strategy: Strategy,
    pub attempts: Vec<ResolutionAttempt>,
}

/// One entry of a batch resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveTarget {
    pub url: String,
    pub resource_id: Option<String>,
}

impl ResolveTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource_id: None,
        }
    }

    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Probe log of a single resolution.
#[derive(Default)]
struct Run {
    attempts: Vec<ResolutionAttempt>,
    probed: HashSet<String>,
}

/// The cancellation token fired mid-run.
struct Interrupted;

/// Finds a reachable delivery URL for a possibly stale one.
pub struct Resolver {
    prober: Arc<dyn Prober>,
    platform: Option<Arc<dyn PlatformApi>>,
    clock: Arc<dyn Clock>,
    config: ResolveConfig,
    cancel: CancellationToken,
}

impl Resolver {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self {
            prober,
            platform: None,
            clock: Arc::new(SystemClock),
            config: ResolveConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Enables the requery strategy.
    pub fn with_platform(mut self, platform: Arc<dyn PlatformApi>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: ResolveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves `url` to a reachable URL.
    ///
    /// Strategies that need `resource_id` are skipped without one. Each
    /// candidate URL is probed at most once, except during backoff.
    pub async fn resolve(
        &self,
        url: &str,
        resource_id: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let mut run = Run::default();

        let Ok(found) = self.run_strategies(&mut run, url, resource_id).await else {
            debug!(url = %url, probes = run.attempts.len(), "resolution cancelled");
            return Err(ResolveError::Cancelled {
                attempts: run.attempts,
            });
        };
        if let Some((resolved, strategy)) = found {
            info!(
                url = %url,
                resolved = %resolved,
                strategy = %strategy,
                probes = run.attempts.len(),
                "delivery url resolved"
            );
            return Ok(Resolution {
                url: resolved,
                strategy,
                attempts: run.attempts,
            });
        }

        warn!(url = %url, probes = run.attempts.len(), "delivery url unresolved");
        Err(ResolveError::Exhausted {
            url: url.to_string(),
            attempts: run.attempts,
        })
    }

    /// Resolves `url`, returning `fallback` if no candidate is reachable.
    pub async fn resolve_with_fallback(
        &self,
        url: &str,
        fallback: &str,
        resource_id: Option<&str>,
    ) -> String {
        match self.resolve(url, resource_id).await {
            Ok(resolution) => resolution.url,
            Err(e) => {
                debug!(url = %url, fallback = %fallback, error = %e, "using fallback url");
                fallback.to_string()
            }
        }
    }

    /// Resolves each target independently. Unresolved targets map to their
    /// original URL.
    pub async fn resolve_many(&self, targets: &[ResolveTarget]) -> HashMap<String, String> {
        let results = join_all(
            targets
                .iter()
                .map(|t| self.resolve(&t.url, t.resource_id.as_deref())),
        )
        .await;

        targets
            .iter()
            .zip(results)
            .map(|(target, result)| {
                let resolved = result.map_or_else(|_| target.url.clone(), |r| r.url);
                (target.url.clone(), resolved)
            })
            .collect()
    }

    async fn run_strategies(
        &self,
        run: &mut Run,
        url: &str,
        resource_id: Option<&str>,
    ) -> Result<Option<(String, Strategy)>, Interrupted> {
        if self.probe(run, Strategy::Direct, url).await? {
            return Ok(Some((url.to_string(), Strategy::Direct)));
        }

        let versionless = strip_version(url);
        if self.probe(run, Strategy::Versionless, &versionless).await? {
            return Ok(Some((versionless, Strategy::Versionless)));
        }

        let offset = self.config.version_offset.as_secs() as i64;
        let versions = alt_versions(url, self.clock.now_unix(), offset);
        if let Some(found) = self.probe_each(run, Strategy::AltVersion, versions).await? {
            return Ok(Some((found, Strategy::AltVersion)));
        }

        if let Some(id) = resource_id {
            let patterns = alt_patterns(url, id, &self.config.alt_extensions);
            if let Some(found) = self.probe_each(run, Strategy::AltPattern, patterns).await? {
                return Ok(Some((found, Strategy::AltPattern)));
            }

            if let Some(current) = self.requery(id).await?
                && self.probe(run, Strategy::Requery, &current).await?
            {
                return Ok(Some((current, Strategy::Requery)));
            }
        }

        for attempt in 1..=self.config.backoff_attempts {
            let delay = self.config.delay_for_attempt(attempt);
            debug!(url = %url, attempt, delay_secs = delay.as_secs(), "backing off");
            self.sleep(delay).await?;

            let outcome = self.probe_raw(run, Strategy::BackoffRetry, url).await?;
            if outcome.is_reachable() {
                return Ok(Some((url.to_string(), Strategy::BackoffRetry)));
            }
        }

        Ok(None)
    }

    /// Asks the platform for the resource's current delivery URL. Lookup
    /// faults end the strategy without failing the resolution.
    async fn requery(&self, resource_id: &str) -> Result<Option<String>, Interrupted> {
        let Some(platform) = &self.platform else {
            return Ok(None);
        };

        let lookup = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Interrupted),
            lookup = platform.lookup(resource_id) => lookup,
        };
        match lookup {
            Ok(Some(resource)) => Ok(resource.delivery_url),
            Ok(None) => {
                debug!(resource_id = %resource_id, "resource not found on requery");
                Ok(None)
            }
            Err(e) => {
                warn!(resource_id = %resource_id, error = %e, "requery failed");
                Ok(None)
            }
        }
    }

    async fn probe_each(
        &self,
        run: &mut Run,
        strategy: Strategy,
        candidates: Vec<String>,
    ) -> Result<Option<String>, Interrupted> {
        for candidate in candidates {
            if self.probe(run, strategy, &candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Probes `url` unless this run already did. Returns whether it is
    /// reachable.
    async fn probe(
        &self,
        run: &mut Run,
        strategy: Strategy,
        url: &str,
    ) -> Result<bool, Interrupted> {
        if run.probed.contains(url) {
            return Ok(false);
        }
        let outcome = self.probe_raw(run, strategy, url).await?;
        Ok(outcome.is_reachable())
    }

    async fn probe_raw(
        &self,
        run: &mut Run,
        strategy: Strategy,
        url: &str,
    ) -> Result<ProbeOutcome, Interrupted> {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Interrupted),
            outcome = self.prober.probe(url, self.config.probe_timeout) => outcome,
        };

        debug!(url = %url, strategy = %strategy, outcome = ?outcome, "probed");
        run.probed.insert(url.to_string());
        run.attempts.push(ResolutionAttempt {
            candidate_url: url.to_string(),
            strategy_name: strategy.name().to_string(),
            outcome,
        });
        Ok(outcome)
    }

    async fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted),
            _ = self.clock.sleep(delay) => Ok(()),
        }
    }
}
