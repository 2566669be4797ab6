use std::sync::OnceLock;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use regex::Regex;

use huddle_types::api::Claims;
use huddle_types::models::{DataStore, UserId};

use crate::error::{MessagingError, Result};

const MAX_HANDLE_LEN: usize = 20;
const FALLBACK_HANDLE: &str = "user";

/// Maps a session token to the user it was issued for.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<UserId>;
}

/// HS256 session tokens.
pub struct JwtIdentity {
    secret: String,
    ttl: chrono::Duration,
}

impl JwtIdentity {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: chrono::Duration::days(30),
        }
    }

    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self, user_id: UserId, handle: &str) -> Result<String> {
        let claims = Claims {
            sub: user_id,
            handle: handle.to_string(),
            exp: (chrono::Utc::now() + self.ttl).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| MessagingError::Internal(format!("token encoding failed: {}", e)))
    }
}

impl IdentityResolver for JwtIdentity {
    fn resolve(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| MessagingError::Unauthenticated(format!("invalid token: {}", e)))?;

        Ok(data.claims.sub)
    }
}

/// Lower-cased `first + last` with non-alphanumerics dropped, cut to 20
/// characters, or `user` if nothing is left. Collisions get the smallest
/// free numeric suffix.
pub fn derive_handle(data: &DataStore, name_first: &str, name_last: &str) -> String {
    let mut base: String = name_first
        .chars()
        .chain(name_last.chars())
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_HANDLE_LEN)
        .collect();
    if base.is_empty() {
        base = FALLBACK_HANDLE.to_string();
    }

    if data.user_by_handle(&base).is_none() {
        return base;
    }

    let mut suffix: u32 = 0;
    loop {
        let candidate = format!("{}{}", base, suffix);
        if data.user_by_handle(&candidate).is_none() {
            return candidate;
        }
        suffix += 1;
    }
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
                .expect("email pattern compiles")
        })
        .is_match(email)
}
