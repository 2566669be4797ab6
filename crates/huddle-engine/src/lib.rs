//! Message lifecycle and delivery engine.
//!
//! Every operation runs as one serialized load → mutate → save cycle over
//! the injected [`Store`]. Deferred work (scheduled sends, standup flushes)
//! re-enters through the same path when its timer fires.

pub mod allocator;
pub mod containers;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod messages;
pub mod notifications;
pub mod scheduled;
pub mod standup;
pub mod tags;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use huddle_db::Store;
use huddle_types::events::MessagingEvent;
use huddle_types::models::{ChannelId, Container, ContainerRef, DataStore, Message, UserId};

use crate::allocator::MessageIdAllocator;
use crate::dispatcher::Dispatcher;
use crate::standup::Standup;

pub use error::{MessagingError, Result};
pub use identity::{IdentityResolver, JwtIdentity};

#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn Store>,
    identity: Arc<dyn IdentityResolver>,
    state: Mutex<EngineState>,
    dispatcher: Dispatcher,
}

/// Process-local state. Lost on restart, along with any pending timers.
#[derive(Default)]
pub(crate) struct EngineState {
    pub allocator: MessageIdAllocator,
    pub standups: HashMap<ChannelId, Standup>,
}

/// One in-flight mutation: the lock-protected engine state plus a freshly
/// loaded copy of the store.
pub(crate) struct Txn<'a> {
    pub state: &'a mut EngineState,
    pub data: DataStore,
    events: Vec<MessagingEvent>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                identity,
                state: Mutex::new(EngineState::default()),
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    /// Live events, emitted after each mutation is saved.
    pub fn subscribe(&self) -> broadcast::Receiver<MessagingEvent> {
        self.inner.dispatcher.subscribe()
    }

    /// Scheduled sends whose ids are reserved but which have not landed yet.
    pub fn pending_scheduled(&self) -> Result<u64> {
        Ok(self.lock_state()?.allocator.reserved())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.inner
            .state
            .lock()
            .map_err(|e| MessagingError::Internal(format!("engine lock poisoned: {}", e)))
    }

    /// Runs `f` with exclusive access to the store. Nothing is saved if `f`
    /// fails.
    pub(crate) fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T>,
    {
        let mut state = self.lock_state()?;
        let data = self.inner.store.load()?;

        let (out, events) = {
            let mut txn = Txn {
                state: &mut *state,
                data,
                events: Vec::new(),
            };
            let out = f(&mut txn)?;
            self.inner.store.save(&txn.data)?;
            (out, txn.events)
        };
        drop(state);

        for event in events {
            self.inner.dispatcher.broadcast(event);
        }
        Ok(out)
    }

    /// Read-only counterpart of [`Engine::mutate`].
    pub(crate) fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&EngineState, &DataStore) -> Result<T>,
    {
        let state = self.lock_state()?;
        let data = self.inner.store.load()?;
        f(&*state, &data)
    }

    /// Resolves `token` and checks the user still exists.
    pub(crate) fn authenticate(&self, data: &DataStore, token: &str) -> Result<UserId> {
        let user_id = self.inner.identity.resolve(token)?;
        match data.user(user_id) {
            Some(user) if !user.removed => Ok(user_id),
            _ => Err(MessagingError::Unauthenticated(format!(
                "user {} no longer exists",
                user_id
            ))),
        }
    }
}

impl Txn<'_> {
    pub(crate) fn emit(&mut self, event: MessagingEvent) {
        self.events.push(event);
    }

    /// Prepends `message` to `target`, notifies members tagged in
    /// `tag_text` and announces the new message.
    pub(crate) fn deliver(
        &mut self,
        target: ContainerRef,
        message: Message,
        tag_text: &str,
    ) -> Result<()> {
        let (message_id, author_id, time_sent) = (message.id, message.author_id, message.time_sent);

        self.data
            .container_mut(target)
            .ok_or_else(|| MessagingError::not_found(format!("{} does not exist", target)))?
            .prepend(message);

        self.notify_tagged(author_id, target, tag_text);
        self.emit(MessagingEvent::MessageCreate {
            message_id,
            target,
            author_id,
            time_sent,
        });
        Ok(())
    }

    /// Sends a tag notification to every current member mentioned in `text`.
    pub(crate) fn notify_tagged(&mut self, author_id: UserId, target: ContainerRef, text: &str) {
        let Some(container) = self.data.container(target) else {
            return;
        };

        let tagged = tags::resolve_tagged(&self.data, container.member_ids(), text);
        if tagged.is_empty() {
            return;
        }

        let author = self
            .data
            .user(author_id)
            .map(|u| u.handle.clone())
            .unwrap_or_default();
        let message = notifications::tagged(&author, container.name(), text);

        for user_id in tagged {
            notifications::push(&mut self.data, user_id, target, message.clone());
        }
    }
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Looks up a container or fails with `NotFound`.
pub(crate) fn container(data: &DataStore, target: ContainerRef) -> Result<&dyn Container> {
    data.container(target)
        .ok_or_else(|| MessagingError::not_found(format!("{} does not exist", target)))
}
