use std::path::PathBuf;

use anyhow::Context;
use backend_lib::{admin::bootstrap_admin, config::Settings, create_router, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Message board server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML config file; `BOARD_*` environment variables override it
    #[arg(short, long, default_value = backend_lib::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    init_tracing(&settings);
    info!(version = env!("CARGO_PKG_VERSION"), config = %cli.config.display(), "board server starting");

    let state = AppState::from_settings(settings.clone())?;
    info!(data_root = %settings.data_root().display(), "storage ready");

    bootstrap_admin(state.users.as_ref(), &state.auth, &settings.admin).await?;

    let app = create_router(state);
    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
