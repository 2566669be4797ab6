use tracing::debug;

use huddle_types::api::{MessageView, MessagesPage, ReactionView};
use huddle_types::events::MessagingEvent;
use huddle_types::models::{
    ChannelId, Container, ContainerRef, DataStore, DmId, MAX_MESSAGE_LEN, Message, MessageId,
    ReactKind, UserId,
};

use crate::error::{MessagingError, Result};
use crate::{Engine, container, notifications, now};

const PAGE_SIZE: usize = 50;

pub(crate) fn check_body(body: &str) -> Result<()> {
    if body.is_empty() {
        return Err(MessagingError::invalid("message must not be empty"));
    }
    check_max_len(body)
}

pub(crate) fn check_max_len(body: &str) -> Result<()> {
    if body.chars().count() > MAX_MESSAGE_LEN {
        return Err(MessagingError::invalid(format!(
            "message is longer than {} characters",
            MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}

/// Finds the container holding `message_id`, provided `user_id` belongs to it.
/// Messages in foreign containers are reported as missing.
fn visible_message(data: &DataStore, user_id: UserId, message_id: MessageId) -> Result<ContainerRef> {
    let target = data
        .locate_message(message_id)
        .filter(|target| {
            data.container(*target)
                .is_some_and(|c| c.is_member(user_id))
        })
        .ok_or_else(|| {
            MessagingError::not_found(format!(
                "message {} is not in a channel or dm you belong to",
                message_id
            ))
        })?;
    Ok(target)
}

fn find_message(data: &DataStore, target: ContainerRef, message_id: MessageId) -> Result<&Message> {
    container(data, target)?
        .message(message_id)
        .ok_or_else(|| MessagingError::not_found(format!("message {} does not exist", message_id)))
}

/// Authors may always moderate their own messages; otherwise the caller
/// needs owner permission on the container.
fn require_moderator(
    data: &DataStore,
    user_id: UserId,
    target: ContainerRef,
    message_id: MessageId,
) -> Result<()> {
    let message = find_message(data, target, message_id)?;
    let global_owner = data.user(user_id).is_some_and(|u| u.is_global_owner());

    if message.author_id == user_id || container(data, target)?.has_owner_permission(user_id, global_owner) {
        Ok(())
    } else {
        Err(MessagingError::forbidden(format!(
            "you are neither the author of message {} nor an owner of {}",
            message_id, target
        )))
    }
}

fn parse_react(react_id: u32) -> Result<ReactKind> {
    ReactKind::try_from(react_id).map_err(MessagingError::InvalidInput)
}

pub(crate) fn view(message: &Message, viewer: UserId) -> MessageView {
    MessageView {
        message_id: message.id,
        u_id: message.author_id,
        message: message.body.clone(),
        time_sent: message.time_sent,
        reacts: message
            .reactions
            .iter()
            .map(|r| ReactionView {
                react_id: r.kind,
                u_ids: r.user_ids.clone(),
                is_this_user_reacted: r.user_ids.contains(&viewer),
            })
            .collect(),
        is_pinned: message.is_pinned,
    }
}

impl Engine {
    pub fn send_message(&self, token: &str, target: ContainerRef, body: &str) -> Result<MessageId> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let dest = container(&txn.data, target)?;
            check_body(body)?;
            if !dest.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let message_id = txn.state.allocator.allocate(&mut txn.data);
            let message = Message::new(message_id, user_id, body.to_string(), now());
            txn.deliver(target, message, body)?;

            debug!("user {} sent message {} to {}", user_id, message_id, target);
            Ok(message_id)
        })
    }

    pub fn remove_message(&self, token: &str, message_id: MessageId) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let target = visible_message(&txn.data, user_id, message_id)?;
            require_moderator(&txn.data, user_id, target, message_id)?;

            remove_from(txn.data.container_mut(target), message_id);
            txn.emit(MessagingEvent::MessageRemove { message_id, target });

            debug!("user {} removed message {} from {}", user_id, message_id, target);
            Ok(())
        })
    }

    /// Replaces the body of a message. An empty body removes the message.
    pub fn edit_message(&self, token: &str, message_id: MessageId, body: &str) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let target = visible_message(&txn.data, user_id, message_id)?;
            check_max_len(body)?;
            require_moderator(&txn.data, user_id, target, message_id)?;

            if body.is_empty() {
                remove_from(txn.data.container_mut(target), message_id);
                txn.emit(MessagingEvent::MessageRemove { message_id, target });
                debug!("user {} removed message {} by empty edit", user_id, message_id);
                return Ok(());
            }

            if let Some(message) = txn
                .data
                .container_mut(target)
                .and_then(|c| c.message_mut(message_id))
            {
                message.body = body.to_string();
            }
            // Only the new body is scanned; earlier tags are not re-notified.
            txn.notify_tagged(user_id, target, body);
            txn.emit(MessagingEvent::MessageEdit { message_id, target });

            debug!("user {} edited message {}", user_id, message_id);
            Ok(())
        })
    }

    pub fn pin_message(&self, token: &str, message_id: MessageId) -> Result<()> {
        self.set_pinned(token, message_id, true)
    }

    pub fn unpin_message(&self, token: &str, message_id: MessageId) -> Result<()> {
        self.set_pinned(token, message_id, false)
    }

    fn set_pinned(&self, token: &str, message_id: MessageId, pinned: bool) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let target = visible_message(&txn.data, user_id, message_id)?;
            if find_message(&txn.data, target, message_id)?.is_pinned == pinned {
                let state = if pinned { "already pinned" } else { "not pinned" };
                return Err(MessagingError::invalid(format!("message {} is {}", message_id, state)));
            }
            require_moderator(&txn.data, user_id, target, message_id)?;

            if let Some(message) = txn
                .data
                .container_mut(target)
                .and_then(|c| c.message_mut(message_id))
            {
                message.is_pinned = pinned;
            }
            txn.emit(MessagingEvent::MessagePin {
                message_id,
                target,
                pinned,
            });
            Ok(())
        })
    }

    pub fn react_message(&self, token: &str, message_id: MessageId, react_id: u32) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let target = visible_message(&txn.data, user_id, message_id)?;
            let kind = parse_react(react_id)?;

            let message = find_message(&txn.data, target, message_id)?;
            if message.reaction(kind).is_some_and(|r| r.user_ids.contains(&user_id)) {
                return Err(MessagingError::invalid(format!(
                    "you already reacted to message {} with react id {}",
                    message_id, react_id
                )));
            }
            let author_id = message.author_id;

            if let Some(message) = txn
                .data
                .container_mut(target)
                .and_then(|c| c.message_mut(message_id))
            {
                message.reaction_mut(kind).user_ids.push(user_id);
            }

            // The author hears about it unless they reacted themselves or
            // have since left.
            let dest = container(&txn.data, target)?;
            if author_id != user_id && dest.is_member(author_id) {
                let reactor = txn
                    .data
                    .user(user_id)
                    .map(|u| u.handle.clone())
                    .unwrap_or_default();
                let text = notifications::reacted(&reactor, dest.name());
                notifications::push(&mut txn.data, author_id, target, text);
            }

            txn.emit(MessagingEvent::ReactionAdd {
                message_id,
                target,
                user_id,
                react_id: kind,
            });
            Ok(())
        })
    }

    pub fn unreact_message(&self, token: &str, message_id: MessageId, react_id: u32) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let target = visible_message(&txn.data, user_id, message_id)?;
            let kind = parse_react(react_id)?;

            let message = find_message(&txn.data, target, message_id)?;
            if !message.reaction(kind).is_some_and(|r| r.user_ids.contains(&user_id)) {
                return Err(MessagingError::invalid(format!(
                    "you have not reacted to message {} with react id {}",
                    message_id, react_id
                )));
            }

            if let Some(message) = txn
                .data
                .container_mut(target)
                .and_then(|c| c.message_mut(message_id))
            {
                message.reaction_mut(kind).user_ids.retain(|id| *id != user_id);
            }
            txn.emit(MessagingEvent::ReactionRemove {
                message_id,
                target,
                user_id,
                react_id: kind,
            });
            Ok(())
        })
    }

    /// Copies the text of a message the caller can see into another
    /// container as a new message, with `annotation` appended on its own
    /// line. Exactly one of `channel_id` / `dm_id` must be `-1`.
    pub fn share_message(
        &self,
        token: &str,
        og_message_id: MessageId,
        annotation: &str,
        channel_id: ChannelId,
        dm_id: DmId,
    ) -> Result<MessageId> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let source = visible_message(&txn.data, user_id, og_message_id)?;
            let target = ContainerRef::from_pair(channel_id, dm_id).ok_or_else(|| {
                MessagingError::invalid("exactly one of channel_id and dm_id must be -1")
            })?;
            let dest = container(&txn.data, target)?;
            check_max_len(annotation)?;
            let original = &find_message(&txn.data, source, og_message_id)?.body;
            let body = if annotation.is_empty() {
                original.clone()
            } else {
                format!("{}\n{}", original, annotation)
            };
            check_max_len(&body)?;
            if !dest.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let message_id = txn.state.allocator.allocate(&mut txn.data);
            let message = Message::new(message_id, user_id, body, now());
            txn.deliver(target, message, annotation)?;

            debug!(
                "user {} shared message {} into {} as {}",
                user_id, og_message_id, target, message_id
            );
            Ok(message_id)
        })
    }

    pub fn channel_messages(&self, token: &str, channel_id: ChannelId, start: usize) -> Result<MessagesPage> {
        self.messages_page(token, ContainerRef::Channel(channel_id), start)
    }

    pub fn dm_messages(&self, token: &str, dm_id: DmId, start: usize) -> Result<MessagesPage> {
        self.messages_page(token, ContainerRef::Dm(dm_id), start)
    }

    /// Up to 50 messages, most recent first, beginning at index `start`.
    fn messages_page(&self, token: &str, target: ContainerRef, start: usize) -> Result<MessagesPage> {
        self.read(|_, data| {
            let user_id = self.authenticate(data, token)?;
            let source = container(data, target)?;
            let messages = source.messages();
            if start > messages.len() {
                return Err(MessagingError::invalid(format!(
                    "start {} is beyond the {} messages in {}",
                    start,
                    messages.len(),
                    target
                )));
            }
            if !source.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let stop = (start + PAGE_SIZE).min(messages.len());
            let end = if start + PAGE_SIZE >= messages.len() {
                -1
            } else {
                (start + PAGE_SIZE) as i64
            };

            Ok(MessagesPage {
                messages: messages[start..stop].iter().map(|m| view(m, user_id)).collect(),
                start,
                end,
            })
        })
    }
}

fn remove_from(holder: Option<&mut dyn Container>, message_id: MessageId) {
    if let Some(holder) = holder {
        holder.remove_message(message_id);
    }
}
