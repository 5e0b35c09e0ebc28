use crate::models::ConversationTurn;
use crate::services::ConversationalAssistant;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct QuickPromptsResponse {
    pub prompts: &'static [&'static str],
}

pub async fn quick_prompts() -> impl IntoResponse {
    Json(QuickPromptsResponse {
        prompts: ConversationalAssistant::quick_prompts(),
    })
}

/// Open a new conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let assistant =
        ConversationalAssistant::start(state.provider.clone(), state.assistant_options.clone())
            .await;
    let id = state.assistants.insert(assistant)?;

    tracing::info!(conversation_id = %id, "Conversation created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let entry = state.assistants.get(id)?;
    let mut assistant = entry.lock().await;

    let reply = match assistant.send_message(&req.message).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(conversation_id = %id, error = %e, "Conversation has no session");
            e.user_message().to_string()
        }
    };

    Ok(Json(SendMessageResponse { reply }))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConversationTurn>>, AppError> {
    let entry = state.assistants.get(id)?;
    let assistant = entry.lock().await;
    Ok(Json(assistant.history().to_vec()))
}

pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let entry = state.assistants.get(id)?;
    let mut assistant = entry.lock().await;
    if let Err(e) = assistant.reset().await {
        // History is cleared either way; the session reopens on the next message
        tracing::warn!(conversation_id = %id, error = %e, "Reset without a fresh session");
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.assistants.remove(id)?;
    tracing::info!(conversation_id = %id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}
