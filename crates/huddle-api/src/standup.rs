use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use huddle_types::api::{StandupActiveQuery, StandupSendRequest, StandupStartRequest, StandupStartResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiQuery, SessionToken};

pub async fn standup_start(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<StandupStartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let time_finish = state
        .run(move |engine| engine.standup_start(&token, req.channel_id, req.length))
        .await?;

    Ok(Json(StandupStartResponse { time_finish }))
}

pub async fn standup_send(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<StandupSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.standup_send(&token, req.channel_id, &req.message))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn standup_active(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiQuery(query): ApiQuery<StandupActiveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state
        .run(move |engine| engine.standup_active(&token, query.channel_id))
        .await?;

    Ok(Json(status))
}
