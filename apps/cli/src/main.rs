//! assetlift command-line client.

mod app;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assetlift", version, about = "Staged asset uploads and delivery URL resolution")]
struct Cli {
    /// Configuration file (defaults to ~/.config/assetlift/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files and register them as platform resources
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Alt text applied to every file
        #[arg(long)]
        alt: Option<String>,
    },
    /// Find a reachable delivery URL for a possibly stale one
    Resolve {
        /// Delivery URL to resolve
        url: String,
        /// Platform resource id, enables pattern and requery strategies
        #[arg(long)]
        id: Option<String>,
        /// URL to print when nothing is reachable
        #[arg(long)]
        fallback: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, cancelling");
                on_signal.cancel();
            }
        });

        let ok = match cli.command {
            Commands::Upload { files, alt } => app::upload(&config, files, alt, cancel).await?,
            Commands::Resolve { url, id, fallback } => {
                match app::resolve(&config, &url, id.as_deref(), fallback.as_deref(), cancel)
                    .await?
                {
                    Some(resolved) => {
                        println!("{resolved}");
                        true
                    }
                    None => false,
                }
            }
        };

        Ok::<_, anyhow::Error>(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    })
}
