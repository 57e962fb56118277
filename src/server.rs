// HTTP server exposing the collection endpoint
//
// Routes:
//   POST /questions - collect N newly-unique records, reply with the last payload
//   GET  /health    - liveness probe
//   GET  /metrics   - Prometheus metrics (when enabled)
//
// The boundary rejects invalid quota values (negative, non-integer,
// malformed JSON) with 400 before the core runs; core faults map to 5xx.

use crate::error::HarvestError;
use crate::harvest::Harvester;
use crate::metrics;
use anyhow::{Context, Result};
use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    harvester: Arc<Harvester>,
    metrics_enabled: bool,
}

impl AppState {
    /// Bundle the harvester and feature flags for the router.
    pub fn new(harvester: Arc<Harvester>, metrics_enabled: bool) -> Self {
        Self {
            harvester,
            metrics_enabled,
        }
    }
}

/// Collection request body
#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    /// Number of newly-unique records to collect. Deserialization rejects
    /// negative and non-integer values before the core is reached.
    pub count: u64,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/questions", post(collect_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
///
/// # Arguments
/// * `state` - Shared application state
/// * `port` - Port to listen on
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    if state.metrics_enabled {
        metrics::init().context("Failed to initialize metrics")?;
    }

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Collection endpoint handler
async fn collect_handler(
    State(state): State<AppState>,
    body: Result<Json<CollectRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = HarvestError::InvalidRequest(rejection.body_text());
            return fault_response(&err);
        }
    };

    match state.harvester.collect(request.count as usize).await {
        Ok(Some(question)) => (StatusCode::OK, Json(json!({ "question": question }))).into_response(),
        Ok(None) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => {
            error!("Collection failed: {}", err);
            fault_response(&err)
        }
    }
}

/// Translate a fault into an HTTP response
fn fault_response(err: &HarvestError) -> Response {
    (fault_status(err), Json(json!({ "error": err.to_string() }))).into_response()
}

/// Status code for each fault kind
fn fault_status(err: &HarvestError) -> StatusCode {
    match err {
        HarvestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        HarvestError::QuotaUnattainable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        HarvestError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        HarvestError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Health check endpoint
async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Metrics endpoint handler
async fn metrics_handler(State(state): State<AppState>) -> Response {
    if !state.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::gather_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text).into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error gathering metrics: {}", e),
            )
                .into_response()
        }
    }
}
