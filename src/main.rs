//! camwatch - view server for a CCTV monitoring dashboard.
//!
//! # API Endpoints
//!
//! - `GET /status` - Collection phases, stats and the last error
//! - `GET /stats` - Dashboard overview
//! - `GET|POST /cameras`, `PUT|DELETE /cameras/:id` - Camera management
//! - `GET /recordings` - Filtered recordings
//! - `GET /alerts`, `POST /alerts/:id/read`, `POST /alerts/read-all` - Alerts
//! - `GET|PUT /settings` - System settings
//! - `POST /refresh` - Re-fetch everything from the backend
//! - `GET /onvif/discover`, `POST /onvif/test` - ONVIF device setup
//! - `GET /streams` - Active streams
//! - `GET /health` - Health check

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use camwatch::api::{self, AppState};
use camwatch::client::CctvClient;
use camwatch::config::Config;
use camwatch::dashboard::Dashboard;
use camwatch::storage::SnapshotStore;
use camwatch::streaming::{StreamClient, StreamPoller};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let level = if config.api.debug { "camwatch=debug" } else { "camwatch=info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    info!(
        port = config.port,
        api_url = %config.api.base_url,
        stream_api_url = %config.stream_api_url,
        timeout_ms = config.api.timeout.as_millis() as u64,
        debug = config.api.debug,
        "Starting camwatch"
    );

    let store = SnapshotStore::new(&config.database_url).await?;
    info!(db_url = %config.database_url, "Snapshot cache initialized");

    let client = CctvClient::new(config.api.clone());
    let mut dashboard = Dashboard::new(client)
        .with_store(store)
        .with_storage_total(config.storage_total_gb);
    dashboard.load().await;

    let streams = StreamClient::from_client_config(&config.stream_api_url, &config.api);
    let (streams_rx, _poller) = StreamPoller::new(streams, config.stream_poll_interval).spawn();

    let state = AppState::new(dashboard).with_streams(streams_rx);

    if let Some(every) = config.refresh_interval {
        spawn_refresh(state.dashboard.clone(), every);
        info!(interval_secs = every.as_secs(), "Periodic refresh enabled");
    }

    let app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "camwatch is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_refresh(dashboard: Arc<Mutex<Dashboard>>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick fires immediately; the initial load already ran.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = dashboard.lock().await.refresh().await {
                warn!(error = %e, "Periodic refresh failed");
            }
        }
    });
}
