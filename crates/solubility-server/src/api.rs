//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use solubility_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::StructuredLogger,
    FeatureError, PredictError, SolubilityPipeline,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub pipeline: SolubilityPipeline,
    pub health_registry: HealthRegistry,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        pipeline: SolubilityPipeline,
        health_registry: HealthRegistry,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            pipeline,
            health_registry,
            logger,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub smiles: Vec<String>,
    /// Reject the whole batch if any row fails
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub smiles: Vec<String>,
}

/// Request failures mapped onto HTTP status codes
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Predict(PredictError),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
            ApiError::Predict(err) => {
                let status = match &err {
                    PredictError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
                    PredictError::Feature(FeatureError::BatchTooLarge { .. }) => {
                        StatusCode::PAYLOAD_TOO_LARGE
                    }
                    PredictError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    PredictError::DimensionMismatch { .. }
                    | PredictError::NonFinitePrediction { .. }
                    | PredictError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = match &err {
                    PredictError::Rejected(rejected) => json!({
                        "error": err.to_string(),
                        "total": rejected.total,
                        "failures": rejected.failures,
                    }),
                    _ => json!({ "error": err.to_string() }),
                };
                (status, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Run CPU-bound pipeline work off the async workers
async fn blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> Result<T, PredictError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| {
            error!(error = %e, "Pipeline task failed");
            ApiError::Internal("prediction task failed".to_string())
        })?
        .map_err(ApiError::from)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let strict = request.strict;

    let result = blocking(&state, move |state| {
        if strict {
            state.pipeline.run_strict(&request.smiles)
        } else {
            state.pipeline.run(&request.smiles)
        }
    })
    .await;

    let report = result.map_err(|e| {
        if let ApiError::Predict(PredictError::Rejected(rejected)) = &e {
            log_failures(&state.logger, &rejected.failures);
        }
        e
    })?;

    log_failures(&state.logger, &report.failures);
    state.logger.log_batch(
        report.total,
        report.predictions.len(),
        report.failures.len(),
        &report.model_version,
    );
    Ok(Json(report))
}

async fn descriptors(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DescribeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let report = blocking(&state, move |state| state.pipeline.describe(&request.smiles)).await?;
    Ok(Json(report))
}

/// Metadata of the loaded model, 503 when none is loaded
async fn model(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let handle = state
        .pipeline
        .model()
        .ok_or(ApiError::Predict(PredictError::ModelNotLoaded))?;
    Ok(Json(json!({
        "model": handle.info(),
        "stats": state.pipeline.predictor().stats(),
    })))
}

fn log_failures(logger: &StructuredLogger, failures: &[solubility_lib::RowFailure]) {
    for failure in failures {
        logger.log_row_failure(
            failure.index,
            &failure.smiles,
            failure.error.kind(),
            &failure.error.to_string(),
        );
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once a model is loaded
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/predict", post(predict))
        .route("/v1/descriptors", post(descriptors))
        .route("/v1/model", get(model))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, draining in-flight requests once `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
