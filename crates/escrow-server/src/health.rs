//! Liveness sidecar: a tiny HTTP server for uptime checks and a monitor task
//! that polls it. Nothing here can stop the bot.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{Json, Router, routing::get};
use chrono::Utc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use escrow_types::api::{AliveResponse, HealthResponse};

/// Ports tried, counting up from the configured one.
pub const PORT_ATTEMPTS: u16 = 100;

const POLL_INTERVAL: Duration = Duration::from_secs(30);
const ERROR_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn alive() -> Json<AliveResponse> {
    Json(AliveResponse::healthy())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok_at(Utc::now()))
}

/// Bind the first free port in `start..start + attempts`.
pub async fn bind_first_free(host: &str, start: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    for offset in 0..attempts {
        let Some(port) = start.checked_add(offset) else {
            break;
        };
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!("Port {} unavailable: {}", port, e),
        }
    }
    anyhow::bail!(
        "No available ports found between {} and {}",
        start,
        start.saturating_add(attempts.saturating_sub(1))
    )
}

/// Start the sidecar and its monitor in the background. Returns the bound
/// address.
pub async fn spawn(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let listener = bind_first_free(host, port, PORT_ATTEMPTS).await?;
    let addr = listener.local_addr()?;
    info!("Health server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            error!("Health server stopped: {}", e);
        }
    });
    tokio::spawn(run_monitor(format!("http://127.0.0.1:{}/health", addr.port())));

    Ok(addr)
}

/// Poll `url` forever; failures are logged and shorten the next wait.
pub async fn run_monitor(url: String) {
    let client = reqwest::Client::new();
    loop {
        let wait = match check(&client, &url).await {
            Ok(()) => POLL_INTERVAL,
            Err(e) => {
                warn!("Health check failed: {:#}", e);
                ERROR_POLL_INTERVAL
            }
        };
        tokio::time::sleep(wait).await;
    }
}

pub async fn check(client: &reqwest::Client, url: &str) -> anyhow::Result<()> {
    let response = client
        .get(url)
        .timeout(Duration::from_secs(10))
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("{} returned {}", url, response.status());
    }
    Ok(())
}
