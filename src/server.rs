//! # HTTP Server
//!
//! HTTP server for metrics, health checks, Kubernetes probes and the
//! provider capability table.
//!
//! Provides endpoints:
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (returns 200 once providers are registered)
//! - `/providers` - Registered providers and their capabilities as JSON
//! - `POST /validate` - Admission verdict for a store spec
//!
//! The server runs on port 5000 by default (configurable via `METRICS_PORT` environment variable).

use crate::crd::StoreSpec;
use crate::observability::metrics;
use crate::registry::{ProviderSummary, Registry};
use crate::validation::{self, AdmissionVerdict};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state of the HTTP handlers
#[derive(Debug)]
pub struct ServerState {
    pub is_ready: Arc<AtomicBool>,
    pub registry: Arc<Registry>,
}

impl ServerState {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            is_ready: Arc::new(AtomicBool::new(false)),
            registry,
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::Relaxed)
    }
}

/// Routes without a listener, for embedding and tests
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/providers", get(providers_handler))
        .route("/validate", post(validate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `port` and serve until the process exits
///
/// Marks the state ready once the listener is bound.
pub async fn start_server(port: u16, state: Arc<ServerState>) -> anyhow::Result<()> {
    let app = router(Arc::clone(&state));

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    state.set_ready(true);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather_text() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {e}").into_bytes(),
            )
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn providers_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<ProviderSummary>> {
    Json(state.registry.summaries())
}

async fn validate_handler(
    State(state): State<Arc<ServerState>>,
    Json(store): Json<StoreSpec>,
) -> Json<AdmissionVerdict> {
    Json(validation::validate_store(&state.registry, &store))
}
