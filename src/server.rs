use crate::analyzer::{AnalyzeError, Analyzer};
use crate::models::AnalyzeRequest;
use anyhow::Context;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
}

/// Errors reported to API callers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Analyze(AnalyzeError),
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        ApiError::Analyze(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Analyze(err) => {
                let status = match &err {
                    AnalyzeError::InvalidUrl { .. } | AnalyzeError::UnsupportedScheme(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    AnalyzeError::Unreachable(_) => StatusCode::BAD_GATEWAY,
                    AnalyzeError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(analyzer: Arc<Analyzer>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/event", post(analyze_handler))
        .route("/analyze", post(analyze_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { analyzer })
}

async fn analyze_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: AnalyzeRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please enter a url field".to_string()))?;

    let result = state.analyzer.analyze(&url).await.map_err(|err| {
        tracing::warn!(url = %url, error = %err, "Analysis failed");
        ApiError::from(err)
    })?;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn serve(analyzer: Arc<Analyzer>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {}", bind))?;
    tracing::info!(addr = %bind, "listening");

    axum::serve(listener, router(analyzer))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
