//! essay-gateway-rs/src/lib.rs
//! HTTP surface for essay analysis: routing, request decoding and
//! error-to-status mapping over a shared `EssayAnalyzer`.

pub mod error;
pub mod logging;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use essay_analysis::{util::generate_request_id, EssayAnalyzer, GeminiInvoker};

use crate::error::GatewayError;
use crate::validation::{
    body_encoding, check_content_length, decode_json, decode_multipart, payload_limit_config,
    BodyEncoding, MAX_PAYLOAD_SIZE,
};

pub const SERVICE_NAME: &str = "essay-gateway";

/// Correlation header accepted from callers and echoed on responses
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Candidate model that produced a successful analysis
pub static MODEL_HEADER: HeaderName = HeaderName::from_static("x-analysis-model");

/// Shared handler state
#[derive(Debug)]
pub struct AppState {
    pub analyzer: Arc<EssayAnalyzer>,

    /// Client used for the model catalog diagnostic
    pub catalog: Arc<GeminiInvoker>,

    pub started: Instant,
}

impl AppState {
    pub fn new(analyzer: Arc<EssayAnalyzer>, catalog: Arc<GeminiInvoker>) -> Self {
        Self {
            analyzer,
            catalog,
            started: Instant::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    healthy: bool,
    service_name: String,
    uptime_seconds: u64,
    candidate_models: Vec<String>,
}

/// Build the gateway router with its middleware stack
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/debug_models", get(debug_models_handler))
        .layer(payload_limit_config())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// GET / - Service descriptor
async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "POST /api/analyze",
            "debug_models": "GET /api/debug_models",
            "health": "GET /health"
        }
    }))
}

/// GET /health - Liveness with the configured fallback chain
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let candidate_models = state
        .analyzer
        .orchestrator()
        .registry()
        .iter()
        .map(|c| c.id().to_string())
        .collect();

    Json(HealthResponse {
        healthy: true,
        service_name: SERVICE_NAME.to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        candidate_models,
    })
}

/// POST /api/analyze - Analyze a text or image essay
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, GatewayError> {
    let request_id = incoming_request_id(request.headers());
    check_content_length(request.headers())?;

    let submission = match body_encoding(request.headers())? {
        BodyEncoding::Json => {
            let body = to_bytes(request.into_body(), MAX_PAYLOAD_SIZE)
                .await
                .map_err(|e| {
                    GatewayError::PayloadTooLarge(format!(
                        "request body exceeds maximum allowed size {}: {}",
                        MAX_PAYLOAD_SIZE, e
                    ))
                })?;
            decode_json(&body)?
        }
        BodyEncoding::Multipart => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|e| GatewayError::InvalidFormat(e.body_text()))?;
            decode_multipart(multipart).await?
        }
    };

    info!(request_id = %request_id, kind = submission.kind(), "Analyze request received");

    let outcome = state.analyzer.analyze_with_id(&submission, &request_id).await?;

    let mut response = Json(outcome.result).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&outcome.model) {
        headers.insert(MODEL_HEADER.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(&outcome.request_id) {
        headers.insert(REQUEST_ID_HEADER.clone(), value);
    }

    Ok(response)
}

/// GET /api/debug_models - Provider model catalog for diagnosing a bad chain
async fn debug_models_handler(State(state): State<Arc<AppState>>) -> Result<Json<Value>, GatewayError> {
    let models = state.catalog.list_models().await.map_err(|err| {
        warn!("Model catalog lookup failed: {}", err);
        GatewayError::from(err)
    })?;

    Ok(Json(json!({
        "status": "ok",
        "key_configured": "yes",
        "models": models,
    })))
}

/// Caller-supplied request id, or a fresh one
fn incoming_request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(generate_request_id)
}
