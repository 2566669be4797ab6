use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use huddle_engine::{IdentityResolver, MessagingError};
use huddle_types::api::{
    EditMessageRequest, MessagesQuery, SendLaterRequest, SendMessageRequest, SendMessageResponse,
    ShareMessageRequest, ShareMessageResponse,
};
use huddle_types::models::{ChannelId, ContainerRef, DmId, MessageId};

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, SessionToken};

/// Turns a `(channel_id, dm_id)` pair into a target. A bad token still
/// wins over a bad pair.
fn target(
    state: &AppStateInner,
    token: &str,
    channel_id: ChannelId,
    dm_id: DmId,
) -> Result<ContainerRef, ApiError> {
    ContainerRef::from_pair(channel_id, dm_id).ok_or_else(|| {
        let err = match state.identity.resolve(token) {
            Err(e) => e,
            Ok(_) => MessagingError::invalid("exactly one of channel_id and dm_id must be -1"),
        };
        ApiError::from(err)
    })
}

pub async fn send_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = target(&state, &token, req.channel_id, req.dm_id)?;
    let message_id = state
        .run(move |engine| engine.send_message(&token, target, &req.message))
        .await?;

    Ok(Json(SendMessageResponse { message_id }))
}

pub async fn send_message_later(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<SendLaterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = target(&state, &token, req.channel_id, req.dm_id)?;
    let message_id = state
        .run(move |engine| engine.send_message_later(&token, target, &req.message, req.time_sent))
        .await?;

    Ok(Json(SendMessageResponse { message_id }))
}

pub async fn edit_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
    ApiJson(req): ApiJson<EditMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.edit_message(&token, message_id, &req.message))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn remove_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.remove_message(&token, message_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn pin_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.pin_message(&token, message_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn unpin_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(message_id): ApiPath<MessageId>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .run(move |engine| engine.unpin_message(&token, message_id))
        .await?;

    Ok(Json(serde_json::json!({})))
}

pub async fn share_message(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiJson(req): ApiJson<ShareMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let shared_message_id = state
        .run(move |engine| {
            engine.share_message(&token, req.og_message_id, &req.message, req.channel_id, req.dm_id)
        })
        .await?;

    Ok(Json(ShareMessageResponse { shared_message_id }))
}

pub async fn channel_messages(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(channel_id): ApiPath<ChannelId>,
    ApiQuery(query): ApiQuery<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .run(move |engine| engine.channel_messages(&token, channel_id, query.start))
        .await?;

    Ok(Json(page))
}

pub async fn dm_messages(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    ApiPath(dm_id): ApiPath<DmId>,
    ApiQuery(query): ApiQuery<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .run(move |engine| engine.dm_messages(&token, dm_id, query.start))
        .await?;

    Ok(Json(page))
}
