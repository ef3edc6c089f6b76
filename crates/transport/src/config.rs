use std::time::Duration;

/// Explicit transport configuration.
///
/// Default headers apply to every request sent through the transport built
/// from this config and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub default_headers: Vec<(String, String)>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            default_headers: Vec::new(),
            user_agent: concat!("assetlift/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Adds a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
