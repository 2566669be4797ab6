use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, info, warn};

use huddle_types::models::{ContainerRef, Message, MessageId, UserId};

use crate::error::{MessagingError, Result};
use crate::messages::check_body;
use crate::{Engine, container, now};

/// A send whose id is reserved but which has not reached its container yet.
#[derive(Debug)]
struct PendingSend {
    message_id: MessageId,
    target: ContainerRef,
    author_id: UserId,
    body: String,
}

/// Whole seconds from now until `deadline`, never negative.
pub(crate) fn delay_until(deadline: i64) -> Duration {
    Duration::from_secs((deadline - now()).max(0) as u64)
}

pub(crate) fn runtime() -> Result<Handle> {
    Handle::try_current()
        .map_err(|e| MessagingError::Internal(format!("no async runtime for deferred work: {}", e)))
}

impl Engine {
    /// Validates and reserves an id now; the message itself lands at
    /// `time_sent`. There is no way to cancel it, and it is lost if the
    /// process stops first.
    pub fn send_message_later(
        &self,
        token: &str,
        target: ContainerRef,
        body: &str,
        time_sent: i64,
    ) -> Result<MessageId> {
        let runtime = runtime()?;

        let pending = self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let dest = container(&txn.data, target)?;
            check_body(body)?;
            if time_sent < now() {
                return Err(MessagingError::invalid("time_sent is in the past"));
            }
            if !dest.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let message_id = txn.state.allocator.reserve(&mut txn.data);
            Ok(PendingSend {
                message_id,
                target,
                author_id: user_id,
                body: body.to_string(),
            })
        })?;

        let message_id = pending.message_id;
        info!(
            "message {} scheduled for {} at {} by user {}",
            message_id, target, time_sent, pending.author_id
        );

        self.defer(&runtime, "scheduled send", delay_until(time_sent), move |engine| {
            engine.deliver_scheduled(pending)
        });
        Ok(message_id)
    }

    /// Membership is not re-checked: a send scheduled before the author left
    /// is still delivered.
    fn deliver_scheduled(&self, pending: PendingSend) -> Result<()> {
        self.mutate(|txn| {
            txn.state.allocator.release();

            if txn.data.container(pending.target).is_none() {
                warn!(
                    "dropping scheduled message {}: {} no longer exists",
                    pending.message_id, pending.target
                );
                return Ok(());
            }

            // Stamped with the actual delivery time, not the requested one.
            let message = Message::new(
                pending.message_id,
                pending.author_id,
                pending.body.clone(),
                now(),
            );
            txn.deliver(pending.target, message, &pending.body)?;

            info!("scheduled message {} delivered to {}", pending.message_id, pending.target);
            Ok(())
        })
    }

    /// Runs `job` once `delay` has elapsed, through the same serialized path
    /// as ordinary requests.
    pub(crate) fn defer<F>(&self, runtime: &Handle, what: &'static str, delay: Duration, job: F)
    where
        F: FnOnce(&Engine) -> Result<()> + Send + 'static,
    {
        let engine = self.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            match tokio::task::spawn_blocking(move || job(&engine)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("{} failed: {}", what, e),
                Err(e) => error!("spawn_blocking join error in {}: {}", what, e),
            }
        });
    }
}
