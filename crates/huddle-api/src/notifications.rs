use axum::{Json, extract::State, response::IntoResponse};

use huddle_types::api::NotificationsResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::SessionToken;

pub async fn get_notifications(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .run(move |engine| engine.notifications_get(&token))
        .await?;

    Ok(Json(NotificationsResponse { notifications }))
}
