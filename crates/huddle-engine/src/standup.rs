use std::time::Duration;

use tracing::{debug, info, warn};

use huddle_types::api::StandupStatus;
use huddle_types::events::MessagingEvent;
use huddle_types::models::{ChannelId, ContainerRef, Message, UserId};

use crate::error::{MessagingError, Result};
use crate::messages::check_max_len;
use crate::scheduled::runtime;
use crate::{Engine, container, now};

/// An active standup. Contributions are kept in arrival order.
#[derive(Debug)]
pub(crate) struct Standup {
    starter_id: UserId,
    time_finish: i64,
    buffer: Vec<(String, String)>,
}

impl Standup {
    pub(crate) fn starter_id(&self) -> UserId {
        self.starter_id
    }

    /// One `handle: text` line per contribution.
    fn summary(&self) -> String {
        self.buffer
            .iter()
            .map(|(handle, text)| format!("{}: {}", handle, text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Engine {
    /// Opens a standup lasting `length` seconds. Returns when it finishes.
    pub fn standup_start(&self, token: &str, channel_id: ChannelId, length: i64) -> Result<i64> {
        let runtime = runtime()?;
        let target = ContainerRef::Channel(channel_id);

        let time_finish = self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let channel = container(&txn.data, target)?;
            if length < 0 {
                return Err(MessagingError::invalid("standup length must not be negative"));
            }
            let time_finish = now()
                .checked_add(length)
                .ok_or_else(|| MessagingError::invalid("standup length is too large"))?;
            if txn.state.standups.contains_key(&channel_id) {
                return Err(MessagingError::invalid(format!(
                    "a standup is already active in channel {}",
                    channel_id
                )));
            }
            if !channel.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            txn.state.standups.insert(
                channel_id,
                Standup {
                    starter_id: user_id,
                    time_finish,
                    buffer: Vec::new(),
                },
            );
            info!("standup started in channel {} by user {}, finishing at {}", channel_id, user_id, time_finish);
            Ok(time_finish)
        })?;

        self.defer(
            &runtime,
            "standup flush",
            Duration::from_secs(length as u64),
            move |engine| engine.flush_standup(channel_id),
        );
        Ok(time_finish)
    }

    /// Adds a contribution to the channel's active standup.
    pub fn standup_send(&self, token: &str, channel_id: ChannelId, message: &str) -> Result<()> {
        let target = ContainerRef::Channel(channel_id);

        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let channel = container(&txn.data, target)?;
            check_max_len(message)?;
            if !txn.state.standups.contains_key(&channel_id) {
                return Err(MessagingError::invalid(format!(
                    "no standup is active in channel {}",
                    channel_id
                )));
            }
            if !channel.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let handle = txn
                .data
                .user(user_id)
                .map(|u| u.handle.clone())
                .unwrap_or_default();
            if let Some(standup) = txn.state.standups.get_mut(&channel_id) {
                standup.buffer.push((handle, message.to_string()));
            }

            debug!("user {} contributed to standup in channel {}", user_id, channel_id);
            Ok(())
        })
    }

    pub fn standup_active(&self, token: &str, channel_id: ChannelId) -> Result<StandupStatus> {
        let target = ContainerRef::Channel(channel_id);

        self.read(|state, data| {
            let user_id = self.authenticate(data, token)?;
            if !container(data, target)?.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            Ok(match state.standups.get(&channel_id) {
                Some(standup) => StandupStatus {
                    is_active: true,
                    time_finish: Some(standup.time_finish),
                },
                None => StandupStatus {
                    is_active: false,
                    time_finish: None,
                },
            })
        })
    }

    /// Closes the standup. A non-empty buffer becomes one message from the
    /// starter, stamped with the finish time.
    fn flush_standup(&self, channel_id: ChannelId) -> Result<()> {
        let target = ContainerRef::Channel(channel_id);

        self.mutate(|txn| {
            let Some(standup) = txn.state.standups.remove(&channel_id) else {
                return Ok(());
            };

            let message_id = if standup.buffer.is_empty() {
                None
            } else if txn.data.channel(channel_id).is_none() {
                warn!("dropping standup summary: channel {} no longer exists", channel_id);
                None
            } else {
                let body = standup.summary();
                let message_id = txn.state.allocator.allocate(&mut txn.data);
                let message = Message::new(message_id, standup.starter_id, body.clone(), standup.time_finish);
                txn.deliver(target, message, &body)?;
                Some(message_id)
            };

            txn.emit(MessagingEvent::StandupFinish {
                channel_id,
                message_id,
            });
            info!(
                "standup in channel {} finished with {} contribution(s)",
                channel_id,
                standup.buffer.len()
            );
            Ok(())
        })
    }
}
