//! HTTP decision service
//!
//! ## Endpoints
//!
//! - `POST /v1/evaluate` - Policy decision for a context
//! - `GET /v1/flags/:key` - Current flag value and override state
//! - `PUT /v1/flags/:key` - Set a runtime override
//! - `DELETE /v1/flags/:key` - Clear a runtime override
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics

use crate::engine::PolicyEngine;
use crate::flags::FlagState;
use crate::types::{Decision, PolicyContext};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    engine: Arc<PolicyEngine>,
    start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<PolicyEngine>) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Override request body
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub enabled: bool,
}

/// Flag state response
#[derive(Debug, Serialize)]
pub struct FlagResponse {
    key: String,
    enabled: bool,
    state: FlagState,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<bool>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    version: String,
    roles: usize,
}

/// Metrics response (Prometheus format)
struct MetricsResponse {
    metrics: String,
}

impl IntoResponse for MetricsResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            self.metrics,
        )
            .into_response()
    }
}

/// POST /v1/evaluate - Decide a policy context
async fn evaluate(
    State(state): State<AppState>,
    body: Result<Json<PolicyContext>, JsonRejection>,
) -> Result<Json<Decision>, AppError> {
    let Json(ctx) = body?;
    if ctx.roles.is_empty() {
        return Err(AppError::BadRequest("roles must not be empty".to_string()));
    }

    let decision = state.engine.evaluate(&ctx);

    info!(
        "Policy decision: {} (roles={:?}, resource={:?}, permission={})",
        decision, ctx.roles, ctx.resource, ctx.permission
    );

    Ok(Json(decision))
}

fn flag_response(engine: &PolicyEngine, key: String) -> FlagResponse {
    let flags = engine.flags();
    let (enabled, state) = flags.describe(&key);
    FlagResponse {
        enabled,
        state,
        default: flags.default_value(&key),
        key,
    }
}

/// GET /v1/flags/:key - Current flag value
async fn get_flag(State(state): State<AppState>, Path(key): Path<String>) -> Json<FlagResponse> {
    Json(flag_response(&state.engine, key))
}

/// PUT /v1/flags/:key - Set an override
async fn set_flag_override(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<OverrideRequest>, JsonRejection>,
) -> Result<Json<FlagResponse>, AppError> {
    let Json(req) = body?;
    state.engine.flags().set_override(key.clone(), req.enabled);
    Ok(Json(flag_response(&state.engine, key)))
}

/// DELETE /v1/flags/:key - Clear an override
async fn clear_flag_override(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<FlagResponse> {
    state.engine.flags().clear_override(&key);
    Json(flag_response(&state.engine, key))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
        roles: state.engine.catalog().len(),
    })
}

/// GET /metrics - Prometheus metrics endpoint
async fn metrics(State(state): State<AppState>) -> Result<MetricsResponse, AppError> {
    let decisions = state
        .engine
        .export_prometheus()
        .ok_or_else(|| AppError::NotFound("metrics are disabled".to_string()))?;

    let metrics = format!(
        "# HELP rolegate_uptime_seconds Server uptime in seconds\n\
         # TYPE rolegate_uptime_seconds gauge\n\
         rolegate_uptime_seconds {}\n\
         \n\
         {}",
        state.start_time.elapsed().as_secs(),
        decisions
    );

    Ok(MetricsResponse { metrics })
}

/// Create the HTTP router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/v1/evaluate", post(evaluate))
        .route(
            "/v1/flags/:key",
            get(get_flag).put(set_flag_override).delete(clear_flag_override),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(ServiceBuilder::new().layer(trace).layer(cors))
        .with_state(state)
}
