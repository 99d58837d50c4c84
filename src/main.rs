use anyhow::{Context, Result};
use clap::Parser;
use nimbus::integration::{AppConfig, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/nimbus/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to preselect in the picker
    #[arg(short, long)]
    model: Option<String>,

    /// Show answers as text only
    #[arg(long)]
    mute: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nimbus=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_default()?,
    };
    if let Some(model) = cli.model {
        config.llm.model_id = model;
    }
    if cli.mute {
        config = config.without_audio_output();
    }

    info!("Starting Nimbus weather assistant");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("nimbus-runtime")
        .build()
        .context("Failed to start the async runtime")?;

    let orchestrator = {
        let _guard = runtime.enter();
        Arc::new(Orchestrator::new(config)?)
    };

    nimbus::ui::run(orchestrator, runtime)
        .map_err(|e| anyhow::anyhow!("UI error: {}", e))?;

    Ok(())
}
