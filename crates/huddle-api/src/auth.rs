use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use huddle_engine::{Engine, JwtIdentity, MessagingError};
use huddle_types::api::{AuthResponse, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::middleware::ApiJson;

const MIN_PASSWORD_LEN: usize = 6;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub engine: Engine,
    pub identity: Arc<JwtIdentity>,
}

impl AppStateInner {
    /// Runs a blocking engine call off the async runtime.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Engine) -> huddle_engine::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || f(&engine))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::internal("worker task failed")
            })?
            .map_err(ApiError::from)
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(MessagingError::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))?
        .to_string();

    let registered = state
        .run(move |engine| {
            engine.register_user(&req.email, &password_hash, &req.name_first, &req.name_last)
        })
        .await?;

    let token = state.identity.issue(registered.user_id, &registered.handle)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            auth_user_id: registered.user_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.clone();
    let credentials = state
        .run(move |engine| engine.credentials(&email))
        .await?
        .ok_or_else(|| MessagingError::invalid(format!("email '{}' is not registered", req.email)))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&credentials.password_hash)
        .map_err(|e| ApiError::internal(format!("stored password hash is corrupt: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| MessagingError::invalid("incorrect password"))?;

    let token = state.identity.issue(credentials.user_id, &credentials.handle)?;

    Ok(Json(AuthResponse {
        auth_user_id: credentials.user_id,
        token,
    }))
}
