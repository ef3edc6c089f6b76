//! Command runners.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use assetlift_platform::{GraphqlPlatform, PlatformApi};
use assetlift_resolver::{ResolveError, Resolver, TransportProber};
use assetlift_transfer::detect_content_type;
use assetlift_transport::{HttpTransport, Transport};
use assetlift_uploader::{BatchEntry, StagedUploader, UploadRequest};

use crate::config::Config;

fn platform(config: &Config) -> anyhow::Result<Arc<dyn PlatformApi>> {
    let transport = HttpTransport::new(config.platform_transport())
        .context("building platform transport")?;
    Ok(Arc::new(GraphqlPlatform::new(
        Arc::new(transport),
        config.platform()?,
    )))
}

fn public_transport(config: &Config) -> anyhow::Result<Arc<dyn Transport>> {
    let transport =
        HttpTransport::new(config.public_transport()).context("building storage transport")?;
    Ok(Arc::new(transport))
}

/// Uploads `files`. Returns whether every file was registered.
pub async fn upload(
    config: &Config,
    files: Vec<PathBuf>,
    alt: Option<String>,
    cancel: CancellationToken,
) -> anyhow::Result<bool> {
    let uploader = StagedUploader::new(platform(config)?, public_transport(config)?)
        .with_config(config.uploader())
        .with_cancel(cancel);

    if let [path] = files.as_slice() {
        let name = path.display().to_string();
        return match uploader.upload_path(path, alt).await {
            Ok(resource) => {
                println!("{name}: {} ({})", resource.id, resource.status);
                Ok(true)
            }
            Err(e) => {
                println!("{name}: failed during {}: {e}", e.phase());
                Ok(false)
            }
        };
    }

    let mut requests = Vec::with_capacity(files.len());
    let mut all_read = true;
    for path in &files {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mime_type = detect_content_type(&filename);
                let mut request = UploadRequest::new(bytes, filename, mime_type);
                request.alt = alt.clone();
                requests.push(request);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                println!("{}: failed during validate: {e}", path.display());
                all_read = false;
            }
        }
    }

    let entries = uploader.upload_batch(&requests).await;
    for entry in &entries {
        println!("{}", describe(entry));
    }
    Ok(all_read && entries.iter().all(BatchEntry::is_success))
}

fn describe(entry: &BatchEntry) -> String {
    match &entry.result {
        Ok(resource) => format!("{}: {} ({})", entry.filename, resource.id, resource.status),
        Err(e) => format!("{}: failed during {}: {e}", entry.filename, e.phase()),
    }
}

/// Resolves `url`. Returns the URL to print, or `None` when nothing was
/// reachable and no fallback was given.
pub async fn resolve(
    config: &Config,
    url: &str,
    resource_id: Option<&str>,
    fallback: Option<&str>,
    cancel: CancellationToken,
) -> anyhow::Result<Option<String>> {
    let prober = TransportProber::new(public_transport(config)?);

    let mut resolver = Resolver::new(Arc::new(prober))
        .with_config(config.resolver())
        .with_cancel(cancel);
    if resource_id.is_some() && !config.endpoint.is_empty() {
        resolver = resolver.with_platform(platform(config)?);
    }

    if let Some(fallback) = fallback {
        return Ok(Some(
            resolver
                .resolve_with_fallback(url, fallback, resource_id)
                .await,
        ));
    }

    match resolver.resolve(url, resource_id).await {
        Ok(resolution) => Ok(Some(resolution.url)),
        Err(e @ ResolveError::Cancelled { .. }) => anyhow::bail!("{e}"),
        Err(e @ ResolveError::Exhausted { .. }) => {
            eprintln!("{e}");
            Ok(None)
        }
    }
}
