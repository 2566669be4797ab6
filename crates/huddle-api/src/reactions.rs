use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use huddle_types::api::ReactRequest;
use huddle_types::models::MessageId;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, SessionToken};

pub async fn react_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
    ApiJson(req): ApiJson<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.react_message(&token, message_id, req.react_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn unreact_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
    ApiJson(req): ApiJson<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.unreact_message(&token, message_id, req.react_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}
