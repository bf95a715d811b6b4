//! Continuity plugin runner
//!
//! Subscribes to the host event bus and hands every event to the plugin set.
//! Events are processed one at a time; plugins for one event run together.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use continuity_lib::host::HostApi;
use continuity_lib::process::CommandRunner;
use continuity_lib::{default_plugins, Config, HttpHostClient, TokioCommandRunner};

#[derive(Parser)]
#[command(name = "continuity")]
#[command(about = "Session continuity plugins for an agent host", long_about = None)]
struct Args {
    /// Config file (defaults to $CONFIG_DIR/continuity/config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host server URL
    #[arg(long)]
    host_url: Option<String>,
    /// Project root the host is running in
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,continuity_lib=debug".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = args.host_url {
        config.host_url = url;
    }
    if let Some(dir) = args.project_dir {
        config.project_dir = Some(dir);
    }

    let project_dir = config.project_dir();
    let client = HttpHostClient::new(&config.host_url).with_directory(project_dir.to_string_lossy());
    let host: Arc<dyn HostApi> = Arc::new(client.clone());
    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner);
    let plugins = default_plugins(&config, host, runner);

    tracing::info!(
        host = %config.host_url,
        project = %project_dir.display(),
        plugins = ?plugins.names(),
        "Starting continuity"
    );

    let mut events = client
        .subscribe()
        .await
        .with_context(|| format!("Failed to subscribe to {}", config.host_url))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            next = events.next_event() => {
                match next.context("Event stream failed")? {
                    Some(event) => {
                        plugins.dispatch(&event).await;
                    }
                    None => {
                        tracing::info!("Host closed the event stream");
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}
