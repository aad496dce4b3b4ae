//! Live Checker — which LCU channels are live on YouTube right now.
//!
//! A single background poller sweeps the channel registry, asking yt-dlp
//! about each channel in turn, and writes the outcome to an in-memory
//! cache. A small HTTP API serves that cache. When YouTube starts
//! answering with bot-detection walls the poller backs off.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod adapters;
mod cache;
mod config;
mod discovery;
mod registry;
mod server;

use adapters::ytdlp::YtDlpExtractor;
use cache::StatusCache;
use config::{Args, Config};
use discovery::poller::Poller;
use discovery::prober::StatusProber;
use registry::ChannelRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from(Args::parse());
    init_tracing(config.log_json);

    info!("📺 Live Checker v{}", env!("CARGO_PKG_VERSION"));

    let registry = ChannelRegistry::lcu();
    let cache = StatusCache::new();
    let shutdown = CancellationToken::new();

    // ── Poller ──────────────────────────────────────────────────────
    let extractor = Arc::new(YtDlpExtractor::new(config.yt_dlp.clone()));
    let prober = StatusProber::new(extractor, config.extract.clone());
    let poller = Poller::new(registry, prober, cache.clone(), config.poll);
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    // ── Shutdown signal ─────────────────────────────────────────────
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Shutdown requested");
            shutdown.cancel();
        });
    }

    // ── HTTP API ────────────────────────────────────────────────────
    let srv = server::Server::new(config.listen_addr, server::AppState::new(cache, registry));
    let served = srv.run(shutdown.clone()).await;

    // Bind failures land here too; stop the poller either way.
    shutdown.cancel();
    if let Err(e) = poller_task.await {
        error!("Poller task failed: {}", e);
    }

    served
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "live_checker=info,tower_http=info".into());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
