use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, DmId, MessageId, ReactKind, SENTINEL_ID, UserId};

fn sentinel() -> i64 {
    SENTINEL_ID
}

// -- JWT Claims --

/// Session token claims. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub handle: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name_first: String,
    pub name_last: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub auth_user_id: UserId,
    pub token: String,
}

// -- Channels & DMs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelCreateRequest {
    pub name: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct ChannelCreateResponse {
    pub channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelInviteRequest {
    pub u_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DmCreateRequest {
    pub u_ids: Vec<UserId>,
}

#[derive(Debug, Serialize)]
pub struct DmCreateResponse {
    pub dm_id: DmId,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub start: usize,
}

#[derive(Debug, Serialize)]
pub struct MessagesPage {
    pub messages: Vec<MessageView>,
    pub start: usize,
    /// `-1` once the page reaches the oldest message.
    pub end: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub message_id: MessageId,
    pub u_id: UserId,
    pub message: String,
    pub time_sent: i64,
    pub reacts: Vec<ReactionView>,
    pub is_pinned: bool,
}

/// Reaction row as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionView {
    pub react_id: ReactKind,
    pub u_ids: Vec<UserId>,
    pub is_this_user_reacted: bool,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(default = "sentinel")]
    pub channel_id: ChannelId,
    #[serde(default = "sentinel")]
    pub dm_id: DmId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendLaterRequest {
    #[serde(default = "sentinel")]
    pub channel_id: ChannelId,
    #[serde(default = "sentinel")]
    pub dm_id: DmId,
    pub message: String,
    pub time_sent: i64,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: MessageId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    pub react_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareMessageRequest {
    pub og_message_id: MessageId,
    #[serde(default)]
    pub message: String,
    #[serde(default = "sentinel")]
    pub channel_id: ChannelId,
    #[serde(default = "sentinel")]
    pub dm_id: DmId,
}

#[derive(Debug, Serialize)]
pub struct ShareMessageResponse {
    pub shared_message_id: MessageId,
}

// -- Standups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandupStartRequest {
    pub channel_id: ChannelId,
    pub length: i64,
}

#[derive(Debug, Serialize)]
pub struct StandupStartResponse {
    pub time_finish: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandupSendRequest {
    pub channel_id: ChannelId,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StandupActiveQuery {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandupStatus {
    pub is_active: bool,
    pub time_finish: Option<i64>,
}

// -- Notifications --

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub channel_id: ChannelId,
    pub dm_id: DmId,
    pub notification_message: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationView>,
}
