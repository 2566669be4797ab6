#![allow(dead_code)]

use std::sync::Arc;

use huddle_db::MemoryStore;
use huddle_engine::{Engine, JwtIdentity, MessagingError};
use huddle_types::models::UserId;

pub struct Harness {
    pub engine: Engine,
    identity: Arc<JwtIdentity>,
}

pub struct Account {
    pub id: UserId,
    pub handle: String,
    pub token: String,
}

impl Harness {
    pub fn new() -> Self {
        let identity = Arc::new(JwtIdentity::new("test-secret"));
        let engine = Engine::new(Arc::new(MemoryStore::new()), identity.clone());
        Self { engine, identity }
    }

    pub fn register(&self, first: &str, last: &str) -> Account {
        let email = format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase());
        let registered = self
            .engine
            .register_user(&email, "not-a-real-hash", first, last)
            .unwrap();
        let token = self.identity.issue(registered.user_id, &registered.handle).unwrap();
        Account {
            id: registered.user_id,
            handle: registered.handle,
            token,
        }
    }
}

pub fn is_not_found<T: std::fmt::Debug>(result: Result<T, MessagingError>) -> bool {
    matches!(result, Err(MessagingError::NotFound(_)))
}

pub fn is_invalid<T: std::fmt::Debug>(result: Result<T, MessagingError>) -> bool {
    matches!(result, Err(MessagingError::InvalidInput(_)))
}

pub fn is_forbidden<T: std::fmt::Debug>(result: Result<T, MessagingError>) -> bool {
    matches!(result, Err(MessagingError::Forbidden(_)))
}
