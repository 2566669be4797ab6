use serde::{Deserialize, Serialize};

use crate::models::{ChannelId, ContainerRef, MessageId, ReactKind, UserId};

/// Events broadcast to live subscribers after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MessagingEvent {
    /// A message landed at the head of a container log (send, share,
    /// scheduled delivery or standup flush)
    MessageCreate {
        message_id: MessageId,
        target: ContainerRef,
        author_id: UserId,
        time_sent: i64,
    },

    MessageEdit {
        message_id: MessageId,
        target: ContainerRef,
    },

    MessageRemove {
        message_id: MessageId,
        target: ContainerRef,
    },

    /// Pin state changed
    MessagePin {
        message_id: MessageId,
        target: ContainerRef,
        pinned: bool,
    },

    ReactionAdd {
        message_id: MessageId,
        target: ContainerRef,
        user_id: UserId,
        react_id: ReactKind,
    },

    ReactionRemove {
        message_id: MessageId,
        target: ContainerRef,
        user_id: UserId,
        react_id: ReactKind,
    },

    /// A standup window closed. `message_id` is `None` when nobody contributed.
    StandupFinish {
        channel_id: ChannelId,
        message_id: Option<MessageId>,
    },
}

impl MessagingEvent {
    /// The container this event is scoped to.
    pub fn target(&self) -> ContainerRef {
        match self {
            Self::MessageCreate { target, .. }
            | Self::MessageEdit { target, .. }
            | Self::MessageRemove { target, .. }
            | Self::MessagePin { target, .. }
            | Self::ReactionAdd { target, .. }
            | Self::ReactionRemove { target, .. } => *target,
            Self::StandupFinish { channel_id, .. } => ContainerRef::Channel(*channel_id),
        }
    }
}
