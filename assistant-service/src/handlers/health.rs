use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "assistant-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: the text provider must accept requests.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.provider.health_check().await.map_err(|e| {
        tracing::warn!(provider = state.provider.name(), error = %e, "Provider not ready");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}
