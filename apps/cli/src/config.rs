//! CLI configuration management.
//!
//! Configuration is stored as TOML at
//! `$XDG_CONFIG_HOME/assetlift/config.toml`, falling back to
//! `~/.config/assetlift/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use assetlift_platform::PlatformConfig;
use assetlift_resolver::ResolveConfig;
use assetlift_transport::TransportConfig;
use assetlift_uploader::UploaderConfig;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Platform GraphQL endpoint.
    #[serde(default)]
    pub endpoint: String,

    /// Headers sent with every platform request, typically an access token.
    /// Never sent to storage endpoints or probed URLs.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Platform request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Multipart transfer timeout in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout: u64,

    /// Reachability probe timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Backoff re-probes before a URL is reported unresolved.
    #[serde(default = "default_backoff_attempts")]
    pub backoff_attempts: u32,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_transfer_timeout() -> u64 {
    120
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_backoff_attempts() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            headers: BTreeMap::new(),
            request_timeout: default_request_timeout(),
            transfer_timeout: default_transfer_timeout(),
            probe_timeout: default_probe_timeout(),
            backoff_attempts: default_backoff_attempts(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; a missing default file yields the
    /// default configuration.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Transport for platform requests, carrying the configured headers.
    pub fn platform_transport(&self) -> TransportConfig {
        self.headers.iter().fold(
            TransportConfig::default().with_timeout(Duration::from_secs(self.request_timeout)),
            |config, (name, value)| config.with_header(name, value),
        )
    }

    /// Transport for storage transfers and probes, without credentials.
    pub fn public_transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(Duration::from_secs(self.transfer_timeout))
    }

    pub fn platform(&self) -> anyhow::Result<PlatformConfig> {
        if self.endpoint.is_empty() {
            anyhow::bail!("no platform endpoint configured (set `endpoint` in the config file)");
        }
        let mut config = PlatformConfig::new(&self.endpoint);
        config.request_timeout = Duration::from_secs(self.request_timeout);
        Ok(config)
    }

    pub fn uploader(&self) -> UploaderConfig {
        UploaderConfig {
            transfer_timeout: Duration::from_secs(self.transfer_timeout),
        }
    }

    pub fn resolver(&self) -> ResolveConfig {
        ResolveConfig {
            probe_timeout: Duration::from_secs(self.probe_timeout),
            backoff_attempts: self.backoff_attempts,
            ..ResolveConfig::default()
        }
    }
}

/// Returns the default configuration file path.
fn config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var_os("HOME").unwrap_or_else(|| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("assetlift").join("config.toml")
}
