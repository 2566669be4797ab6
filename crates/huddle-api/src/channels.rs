use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use huddle_types::api::{
    ChannelCreateRequest, ChannelCreateResponse, ChannelInviteRequest, DmCreateRequest,
    DmCreateResponse,
};
use huddle_types::models::{ChannelId, DmId};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, SessionToken};

pub async fn create_channel(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<ChannelCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let channel_id = state
        .run(move |engine| engine.channels_create(&token, &req.name, req.is_public))
        .await?;

    Ok(Json(ChannelCreateResponse { channel_id }))
}

pub async fn join_channel(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(channel_id): ApiPath<ChannelId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.channel_join(&token, channel_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn invite_channel(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(channel_id): ApiPath<ChannelId>,
    ApiJson(req): ApiJson<ChannelInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.channel_invite(&token, channel_id, req.u_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn leave_channel(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(channel_id): ApiPath<ChannelId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.channel_leave(&token, channel_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn create_dm(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<DmCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let dm_id = state
        .run(move |engine| engine.dm_create(&token, &req.u_ids))
        .await?;

    Ok(Json(DmCreateResponse { dm_id }))
}

pub async fn leave_dm(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(dm_id): ApiPath<DmId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.dm_leave(&token, dm_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}
