//! HTTP API — read-only views over the status cache.
//!
//! Every handler answers from the cache; nothing here waits on the
//! poller. The one exception is `/debug/test-youtube`, which makes a raw
//! request to YouTube to check connectivity from this host.
//!
//! Routes:
//! - `GET /`                    health summary
//! - `GET /live-status/live`    channels live right now, plus blocked ones
//! - `GET /live-status/all`     every channel with its cached status
//! - `GET /debug/test-youtube`  connectivity probe

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::{ChannelStatus, StatusCache};
use crate::registry::ChannelRegistry;

const SERVICE_NAME: &str = "Live Checker";
const YOUTUBE_HOME: &str = "https://www.youtube.com";
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);
const BLOCKED_WARNING: &str = "YouTube is blocking requests from this server (bot detection)";

// ── State ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub cache: StatusCache,
    pub registry: ChannelRegistry,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(cache: StatusCache, registry: ChannelRegistry) -> Self {
        Self { cache, registry, http: reqwest::Client::new() }
    }
}

// ── Response Types ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub channels_monitored: usize,
    pub bot_blocked_channels: usize,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LiveChannel {
    pub channel_name: String,
    pub channel_id: String,
    pub watch_url: String,
}

#[derive(Debug, Serialize)]
pub struct LiveChannelsResponse {
    pub live_channels: Vec<LiveChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_channels: Option<Vec<String>>,
}

/// One row of `/live-status/all`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChannelRow {
    Known(ChannelStatus),
    Unknown {
        channel_id: &'static str,
        channel_name: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct AllChannelsResponse {
    pub channels: Vec<ChannelRow>,
}

#[derive(Debug, Serialize)]
pub struct ConnectivityResponse {
    pub youtube_accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/live-status/live", get(live_channels))
        .route("/live-status/all", get(all_channels))
        .route("/debug/test-youtube", get(test_youtube))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        info!(addr = %self.addr, "🌐 HTTP API listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context("HTTP server failed")?;

        info!("HTTP API stopped");
        Ok(())
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let total = state.registry.len();
    let blocked = state.cache.blocked_count().await;

    Json(HealthResponse {
        status: if blocked < total { "healthy" } else { "degraded" },
        service: SERVICE_NAME,
        channels_monitored: total,
        bot_blocked_channels: blocked,
        message: if blocked > 0 {
            "YouTube is blocking Heroku servers"
        } else {
            "All systems operational"
        },
    })
}

async fn live_channels(State(state): State<AppState>) -> Json<LiveChannelsResponse> {
    let snapshot = state.cache.snapshot().await;

    let mut live = Vec::new();
    let mut blocked = Vec::new();
    for channel in state.registry.iter() {
        let Some(status) = snapshot.get(channel.id) else { continue };
        if let Some(watch_url) = status.watch_url() {
            live.push(LiveChannel {
                channel_name: status.channel_name().to_string(),
                channel_id: status.channel_id().to_string(),
                watch_url: watch_url.to_string(),
            });
        } else if status.is_blocked() {
            blocked.push(status.channel_name().to_string());
        }
    }

    let any_blocked = !blocked.is_empty();
    Json(LiveChannelsResponse {
        live_channels: live,
        warning: any_blocked.then_some(BLOCKED_WARNING),
        blocked_channels: any_blocked.then_some(blocked),
    })
}

async fn all_channels(State(state): State<AppState>) -> Json<AllChannelsResponse> {
    let mut snapshot = state.cache.snapshot().await;

    let channels = state
        .registry
        .iter()
        .map(|channel| match snapshot.remove(channel.id) {
            Some(status) => ChannelRow::Known(status),
            None => ChannelRow::Unknown {
                channel_id: channel.id,
                channel_name: channel.name,
                state: "unknown",
            },
        })
        .collect();

    Json(AllChannelsResponse { channels })
}

async fn test_youtube(State(state): State<AppState>) -> Json<ConnectivityResponse> {
    Json(check_connectivity(&state.http, YOUTUBE_HOME).await)
}

/// HEAD `url` and report whether it answered with a success or redirect.
async fn check_connectivity(client: &reqwest::Client, url: &str) -> ConnectivityResponse {
    match client.head(url).timeout(CONNECTIVITY_TIMEOUT).send().await {
        Ok(resp) => {
            let status = resp.status();
            ConnectivityResponse {
                youtube_accessible: status.is_success() || status.is_redirection(),
                status_code: Some(status.as_u16()),
                error: None,
            }
        }
        Err(e) => {
            warn!(url, "Connectivity probe failed: {}", e);
            ConnectivityResponse {
                youtube_accessible: false,
                status_code: None,
                error: Some(e.to_string()),
            }
        }
    }
}
