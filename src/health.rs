//! Liveness HTTP endpoint for uptime probing, plus the Prometheus metrics
//! route.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use eyre::Result;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::TtlCache;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub cache_entries: usize,
}

struct HealthState {
    start_time: Instant,
    cache: Arc<TtlCache>,
}

/// Run the liveness/metrics server. Blocks until the listener fails.
pub async fn run_health_server(bind_addr: SocketAddr, cache: Arc<TtlCache>) -> Result<()> {
    let prometheus_handle = crate::metrics::install_prometheus_recorder();
    let state = Arc::new(HealthState {
        start_time: Instant::now(),
        cache,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET]);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/metrics",
            get(move || {
                let handle = prometheus_handle.clone();
                async move { handle.render() }
            }),
        )
        .with_state(state)
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "health server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(
    axum::extract::State(state): axum::extract::State<Arc<HealthState>>,
) -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        cache_entries: state.cache.len(),
    })
}
