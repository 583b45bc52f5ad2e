//! `POST /analyze` and `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use newsfact_core::{AnalysisRequest, AnalysisResult, HealthReport};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::{ModelSlot, ModelState};

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelSlot>,
}

impl AppState {
    pub fn new(model: ModelSlot) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

/// Build the service router. Cross-origin requests are allowed from anywhere
/// and request bodies are not size-limited.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "newsfact listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}

async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AnalysisResult>, ApiError> {
    let request = parse_request(&headers, &body)?;
    let model = state.model.get_or_load().await?;

    // Forward passes are CPU/GPU bound; keep them off the async workers.
    let (prediction, request) = tokio::task::spawn_blocking(move || {
        let prediction = model.classify(&request.text);
        (prediction, request)
    })
    .await
    .map_err(|e| ApiError::Inference(format!("inference task failed: {e}")))?;
    let prediction = prediction.map_err(|e| ApiError::Inference(e.to_string()))?;

    let result = AnalysisResult::new(prediction, &request.text, request.source_url());
    info!(
        verdict = %result.prediction_label,
        confidence = result.confidence,
        characters = result.characters_analyzed,
        source_url = %result.source_url,
        "analyzed text"
    );
    Ok(Json(result))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    // The outcome is recorded in the slot.
    let _ = state.model.get_or_load().await;
    match state.model.state() {
        ModelState::Ready => (StatusCode::OK, Json(HealthReport::healthy())),
        ModelState::Failed(reason) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthReport::unhealthy(reason)),
        ),
        ModelState::Uninitialized => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthReport::unhealthy("model not loaded")),
        ),
    }
}

fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<AnalysisRequest, ApiError> {
    if !is_json(headers) {
        return Err(ApiError::MalformedRequest("Request must be JSON".into()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::MalformedRequest(format!("Invalid JSON body: {e}")))?;
    if value.get("text").is_none() {
        return Err(ApiError::MalformedRequest("No text provided".into()));
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::MalformedRequest(format!("Invalid request: {e}")))
}

/// `application/json` or any `application/*+json` media type.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
