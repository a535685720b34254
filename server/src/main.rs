mod config;
mod service;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use engine::{EngineAdapter, EngineRegistry, Lc0Adapter, Lc0Config, StockfishAdapter, StockfishConfig};

use crate::config::Settings;
use crate::service::AppState;

#[derive(Parser, Debug)]
#[command(name = "engine-service", about = "Multi-engine chess analysis service")]
struct Args {
    /// Listen address, overriding HOST/PORT from the environment.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let settings = Arc::new(Settings::from_env());
    let addr = args
        .listen
        .unwrap_or_else(|| format!("{}:{}", settings.host, settings.port));

    tracing::info!("starting chess engine service");

    let registry = Arc::new(EngineRegistry::new());
    start_engines(&settings, &registry).await?;
    tracing::info!(engines = ?registry.ids().await, "chess engine service ready");

    let app = service::router(AppState {
        registry: registry.clone(),
        settings: settings.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, stopping engines");
    registry.stop_all().await;

    Ok(())
}

/// Boot every configured engine. LC0 is the primary backend and must come
/// up; Maia and Stockfish degrade to warnings when they cannot start.
async fn start_engines(settings: &Settings, registry: &EngineRegistry) -> anyhow::Result<()> {
    let lc0_config = Lc0Config {
        backend: settings.lc0_backend.clone(),
        gpu_ids: settings.lc0_gpu_ids.clone(),
        threads: settings.lc0_threads,
        nncache_size: settings.lc0_nncache,
        multipv: settings.default_num_moves,
        ..Lc0Config::new(&settings.lc0_path, &settings.lc0_network)
    };
    tracing::info!(
        path = %settings.lc0_path.display(),
        network = %settings.lc0_network.display(),
        backend = %settings.lc0_backend,
        gpu_ids = ?settings.lc0_gpu_ids,
        "initializing lc0"
    );
    let lc0 = Arc::new(Lc0Adapter::new("lc0", lc0_config));
    lc0.start().await.context("failed to start lc0")?;
    registry.register("lc0", lc0).await;

    // Maia is the same binary with human-like weights
    if settings.maia_enabled && settings.maia_network.exists() {
        let maia_config = Lc0Config {
            backend: settings.lc0_backend.clone(),
            gpu_ids: settings.lc0_gpu_ids.clone(),
            threads: settings.lc0_threads,
            // less cache for the secondary network
            nncache_size: settings.lc0_nncache / 2,
            multipv: settings.default_num_moves,
            ..Lc0Config::new(&settings.lc0_path, &settings.maia_network)
        };
        tracing::info!(network = %settings.maia_network.display(), "initializing maia");
        let maia = Arc::new(Lc0Adapter::new("maia", maia_config));
        match maia.start().await {
            Ok(()) => registry.register("maia", maia).await,
            Err(e) => tracing::warn!(error = %e, "failed to start maia engine"),
        }
    } else {
        tracing::info!("maia disabled or network not found");
    }

    if settings.stockfish_enabled && settings.stockfish_path.exists() {
        let stockfish_config = StockfishConfig {
            hash_mb: settings.stockfish_hash_mb,
            threads: settings.stockfish_threads,
            multipv: settings.default_num_moves,
            ..StockfishConfig::new(&settings.stockfish_path)
        };
        tracing::info!(path = %settings.stockfish_path.display(), "initializing stockfish");
        let stockfish = Arc::new(StockfishAdapter::new(stockfish_config));
        match stockfish.start().await {
            Ok(()) => registry.register("stockfish", stockfish).await,
            Err(e) => tracing::warn!(error = %e, "failed to start stockfish engine"),
        }
    } else {
        tracing::info!("stockfish disabled or binary not found");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
