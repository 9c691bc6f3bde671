//! component-preview: local development server for widget and theme packages

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use component_preview::tasks::TaskRunner;
use component_preview::{AppState, PreviewConfig, PreviewServer};

/// Preview a widget or theme package in the browser
#[derive(Parser)]
#[command(name = "component-preview")]
#[command(about = "Local development server for widget and theme packages", long_about = None)]
#[command(version)]
struct Cli {
    /// Component folder containing widget.json or theme.json
    #[arg(long, env = "PREVIEW_ROOT")]
    root: Option<PathBuf>,

    /// Port to run the server on (overrides preview.toml)
    #[arg(long, env = "PREVIEW_PORT")]
    port: Option<u16>,

    /// Do not open the browser
    #[arg(long)]
    no_open: bool,

    /// Do not launch the build/watch task
    #[arg(long)]
    no_tasks: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Extra arguments; any present keeps the browser closed
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    extra: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to resolve the current directory")?,
    };

    let mut config = PreviewConfig::load(&root)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.no_open || !cli.extra.is_empty() {
        config.open_browser = false;
    }
    if cli.no_tasks {
        config.run_tasks = false;
    }

    let state = load_state(config)?;

    tracing::info!(
        "Starting up package development server for {} ({})",
        state.manifest.name,
        state.manifest.package
    );

    let listener = PreviewServer::bind(&state.config).await?;
    PreviewServer::print_banner(&state);

    if state.config.run_tasks {
        let runner = TaskRunner::new(state.config.task_command.clone(), &state.config.root);
        if let Err(e) = runner.spawn() {
            tracing::warn!("Failed to start build task: {}", e);
        }
    }

    if state.config.open_browser {
        let url = state.config.host_url();
        let delay = Duration::from_millis(state.config.open_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        });
    }

    PreviewServer::serve(listener, state).await
}

/// Load the component, failing with a hint when the folder is not one.
fn load_state(config: PreviewConfig) -> Result<Arc<AppState>> {
    AppState::load(config)
        .map(Arc::new)
        .context("Are you sure you are running this command from a component folder?")
}
