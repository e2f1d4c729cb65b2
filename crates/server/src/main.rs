//! imgapi server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use imgapi_core::config::AppConfig;
use imgapi_server::{build_state, create_router};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// imgapi - a hypermedia image repository
#[derive(Parser, Debug)]
#[command(name = "imgapid")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "IMG_API_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Log filter from `IMG_API_LOGLEVEL`, then `RUST_LOG`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("IMG_API_LOGLEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "info,tower_http=info".into())
}

/// Load configuration from the optional file and the environment.
///
/// Precedence, lowest first: file, legacy `IMG_API_LANG` / `IMG_API_TMP` /
/// `IMG_API_PORT`, `IMG_API_<SECTION>__<KEY>`.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}, using defaults", path);
    }

    figment
        .merge(
            Env::raw()
                .only(&["IMG_API_LANG"])
                .map(|_| "server.language".into()),
        )
        .merge(
            Env::raw()
                .only(&["IMG_API_TMP"])
                .map(|_| "storage.root".into()),
        )
        .merge(
            Env::raw()
                .only(&["IMG_API_PORT"])
                .map(|_| "server.port".into()),
        )
        .merge(Env::prefixed("IMG_API_").split("__"))
        .extract()
        .context("failed to load configuration")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, draining connections"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("imgapi v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    tracing::debug!(?config, "Instance configuration loaded");

    // Parse bind address before doing any storage work
    let addr: SocketAddr = config
        .server
        .bind_addr()
        .map_err(anyhow::Error::msg)
        .context("invalid bind address")?;

    // Rebuilds the index; nothing is served until this completes
    let state = build_state(config).await?;
    tracing::info!(
        language = state.config.server.language.as_str(),
        collection = %state.paths.collection(),
        "Routes configured"
    );

    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
