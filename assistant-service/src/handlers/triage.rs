use super::chat::CreatedResponse;
use crate::models::SymptomAnalysis;
use crate::services::SymptomTriageAdvisor;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRequest {
    pub original_description: String,
    pub follow_up: String,
}

pub async fn create_advisor(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let advisor =
        SymptomTriageAdvisor::start(state.provider.clone(), state.triage_options.clone()).await;
    let id = state.advisors.insert(advisor)?;

    tracing::info!(advisor_id = %id, "Triage advisor created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<SymptomAnalysis>, AppError> {
    let entry = state.advisors.get(id)?;
    let mut advisor = entry.lock().await;
    Ok(Json(advisor.analyze_symptoms(&req.description).await))
}

pub async fn follow_up(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FollowUpRequest>,
) -> Result<Json<SymptomAnalysis>, AppError> {
    let entry = state.advisors.get(id)?;
    let mut advisor = entry.lock().await;
    Ok(Json(
        advisor
            .follow_up(&req.original_description, &req.follow_up)
            .await,
    ))
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entry = state.advisors.get(id)?;
    entry.lock().await.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_advisor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.advisors.remove(id)?;
    tracing::info!(advisor_id = %id, "Triage advisor deleted");
    Ok(StatusCode::NO_CONTENT)
}
