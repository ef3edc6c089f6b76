//! Resolution errors.

use assetlift_protocol::ResolutionAttempt;

/// Errors produced by the resolution engine.
///
/// An unreachable candidate is an ordinary probe outcome, never an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("no reachable candidate for {url} after {} probes", .attempts.len())]
    Exhausted {
        url: String,
        attempts: Vec<ResolutionAttempt>,
    },

    #[error("resolution cancelled after {} probes", .attempts.len())]
    Cancelled { attempts: Vec<ResolutionAttempt> },
}

impl ResolveError {
    /// Probes made before the engine gave up or was cancelled.
    pub fn attempts(&self) -> &[ResolutionAttempt] {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts } => attempts,
        }
    }
}
