//! Hazardwatch - near-real-time natural hazard feeds.
//!
//! Serves seismic, wildfire, tropical cyclone and tsunami events from four
//! public upstream feeds, normalized into one record model and cached for ten
//! minutes per feed.
//!
//! # API Endpoints
//!
//! - `GET /events` - All hazard types
//! - `GET /events/:hazard` - Current events for one hazard type
//! - `GET /events/:hazard/:id` - One event from the most recent fetch
//! - `GET /health` - Health check

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hazardwatch::aggregator::Aggregator;
use hazardwatch::api::{AppState, router};
use hazardwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("hazardwatch=info".parse()?))
        .init();

    let config = Config::from_env();

    info!(
        port = config.port,
        timeout_secs = config.request_timeout.as_secs(),
        failure_policy = ?config.failure_policy,
        "Starting Hazardwatch server"
    );

    let aggregator = Aggregator::from_config(&config)?;
    let state = AppState { aggregator };

    let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Hazardwatch is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
