//! Web API Server
//!
//! HTTP surface over the prediction facade.
//!
//! ## Endpoints
//!
//! - `POST /predict` — run a prediction (JSON body)
//! - `GET  /health` — service and model status
//! - `GET  /ready` — readiness probe
//! - `GET  /metrics` — Prometheus metrics
//!
//! Validation failures return 422 with the complete violation list;
//! everything else answers 200, including fallback responses.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::metrics::gather_metrics;
use crate::service::{PredictOutcome, StressService};
use crate::validate::FieldViolation;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address or hostname to bind to (e.g. `"0.0.0.0"` for all
    /// interfaces).
    pub host: String,
    /// TCP port the server listens on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The prediction facade.
    pub service: Arc<StressService>,
}

/// Body of a 422 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorBody {
    /// Always `"ValidationError"`.
    pub error: String,
    /// Human-readable summary.
    pub message: String,
    /// Every violation found in the request.
    pub details: Vec<FieldViolation>,
}

/// Start the HTTP server; runs until the listener fails.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn start_server(
    config: ServerConfig,
    service: Arc<StressService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", config.host, config.port);

    info!("Starting web API server on http://{}", addr);

    let state = AppState { service };

    let app = Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `POST /predict` — the pipeline is CPU-bound, so it runs on the
/// blocking pool rather than stalling the async executor.
async fn predict_handler(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || service.predict(&body)).await;

    match outcome {
        Ok(PredictOutcome::Success(response)) | Ok(PredictOutcome::Fallback(response)) => {
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(PredictOutcome::Invalid(details)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorBody {
                error: "ValidationError".to_string(),
                message: "Invalid input data provided".to_string(),
                details,
            }),
        )
            .into_response(),
        Err(join_err) => {
            error!(error = %join_err, "predict task failed to run");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "InternalError",
                    "message": "Prediction task failed to run"
                })),
            )
                .into_response()
        }
    }
}

/// `GET /health` — model and cache status.
async fn health_handler(State(state): State<AppState>) -> Response {
    let info = state.service.describe();
    let body = json!({
        "status": if info.loaded { "healthy" } else { "degraded" },
        "loaded": info.loaded,
        "model_name": info.model_name,
        "model_score": info.model_score,
        "feature_count": info.feature_count,
        "cache_entries": state.service.cache_entries(),
    });
    (StatusCode::OK, Json(body)).into_response()
}

/// `GET /ready` — plain readiness probe; 503 while degraded.
async fn ready_handler(State(state): State<AppState>) -> Response {
    if state.service.is_ready() {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded").into_response()
    }
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics_handler() -> Response {
    (StatusCode::OK, gather_metrics()).into_response()
}
