//! HTTP surface for the huddle messaging engine.

pub mod auth;
pub mod channels;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod reactions;
pub mod standup;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::auth::AppState;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let container_routes = Router::new()
        .route("/channels", post(channels::create_channel))
        .route("/channels/{channel_id}/join", post(channels::join_channel))
        .route("/channels/{channel_id}/invite", post(channels::invite_channel))
        .route("/channels/{channel_id}/leave", post(channels::leave_channel))
        .route("/channels/{channel_id}/messages", get(messages::channel_messages))
        .route("/dms", post(channels::create_dm))
        .route("/dms/{dm_id}/leave", post(channels::leave_dm))
        .route("/dms/{dm_id}/messages", get(messages::dm_messages));

    let message_routes = Router::new()
        .route("/messages", post(messages::send_message))
        .route("/messages/later", post(messages::send_message_later))
        .route("/messages/share", post(messages::share_message))
        .route(
            "/messages/{message_id}",
            put(messages::edit_message).delete(messages::remove_message),
        )
        .route("/messages/{message_id}/pin", post(messages::pin_message))
        .route("/messages/{message_id}/unpin", post(messages::unpin_message))
        .route("/messages/{message_id}/react", post(reactions::react_message))
        .route("/messages/{message_id}/unreact", post(reactions::unreact_message));

    let misc_routes = Router::new()
        .route("/standup/start", post(standup::standup_start))
        .route("/standup/send", post(standup::standup_send))
        .route("/standup/active", get(standup::standup_active))
        .route("/notifications", get(notifications::get_notifications));

    Router::new()
        .merge(auth_routes)
        .merge(container_routes)
        .merge(message_routes)
        .merge(misc_routes)
        .with_state(state)
}
