//! Reachability probes.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use assetlift_protocol::ProbeOutcome;
use assetlift_transport::{BoxFuture, Method, Request, Transport};

/// Checks whether a URL is currently servable within `timeout`.
///
/// A probe never fails: transport faults are reported as
/// [`ProbeOutcome::Error`].
pub trait Prober: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> BoxFuture<'a, ProbeOutcome>;
}

/// [`Prober`] issuing a `HEAD` request through a [`Transport`].
pub struct TransportProber {
    transport: Arc<dyn Transport>,
}

impl TransportProber {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn head(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let req = Request::new(Method::Head, url).timeout(timeout);
        match self.transport.send(req).await {
            Ok(resp) if resp.is_success() => ProbeOutcome::Accessible,
            Ok(resp) => {
                debug!(url = %url, status = resp.status, "probe not accessible");
                ProbeOutcome::Unreachable
            }
            Err(e) => {
                debug!(url = %url, error = %e, "probe failed");
                ProbeOutcome::Error
            }
        }
    }
}

impl Prober for TransportProber {
    fn probe<'a>(&'a self, url: &'a str, timeout: Duration) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(self.head(url, timeout))
    }
}
