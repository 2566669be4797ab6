use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type ChannelId = i64;
pub type DmId = i64;
pub type MessageId = i64;

/// Value used on the wire for the unused side of a channel/DM pair.
pub const SENTINEL_ID: i64 = -1;

/// Upper bound on a message body, in characters.
pub const MAX_MESSAGE_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Owner,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub name_first: String,
    pub name_last: String,
    pub handle: String,
    pub permission: Permission,
    /// Newest first.
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub removed: bool,
}

impl User {
    pub fn is_global_owner(&self) -> bool {
        self.permission == Permission::Owner
    }
}

/// Which container a message or notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ContainerRef {
    Channel(ChannelId),
    Dm(DmId),
}

impl ContainerRef {
    /// Build a reference from a `(channel_id, dm_id)` pair where exactly one
    /// side must be a real id and the other [`SENTINEL_ID`].
    pub fn from_pair(channel_id: ChannelId, dm_id: DmId) -> Option<Self> {
        match (channel_id != SENTINEL_ID, dm_id != SENTINEL_ID) {
            (true, false) => Some(Self::Channel(channel_id)),
            (false, true) => Some(Self::Dm(dm_id)),
            _ => None,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        match self {
            Self::Channel(id) => *id,
            Self::Dm(_) => SENTINEL_ID,
        }
    }

    pub fn dm_id(&self) -> DmId {
        match self {
            Self::Channel(_) => SENTINEL_ID,
            Self::Dm(id) => *id,
        }
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel {}", id),
            Self::Dm(id) => write!(f, "dm {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub target: ContainerRef,
    pub message: String,
}

/// Closed set of reaction kinds. Serialized as the numeric react id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ReactKind {
    Like,
}

impl ReactKind {
    pub const ALL: [ReactKind; 1] = [ReactKind::Like];
}

impl TryFrom<u32> for ReactKind {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Like),
            other => Err(format!("unknown react id {}", other)),
        }
    }
}

impl From<ReactKind> for u32 {
    fn from(kind: ReactKind) -> Self {
        match kind {
            ReactKind::Like => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub kind: ReactKind,
    pub user_ids: Vec<UserId>,
}

impl Reaction {
    pub fn empty(kind: ReactKind) -> Self {
        Self {
            kind,
            user_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author_id: UserId,
    pub body: String,
    /// Seconds since the Unix epoch.
    pub time_sent: i64,
    pub is_pinned: bool,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// A fresh message carries one empty reaction row per known kind.
    pub fn new(id: MessageId, author_id: UserId, body: String, time_sent: i64) -> Self {
        Self {
            id,
            author_id,
            body,
            time_sent,
            is_pinned: false,
            reactions: ReactKind::ALL.into_iter().map(Reaction::empty).collect(),
        }
    }

    pub fn reaction(&self, kind: ReactKind) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.kind == kind)
    }

    /// Returns the reaction row for `kind`, creating it if an older record
    /// predates the kind.
    pub fn reaction_mut(&mut self, kind: ReactKind) -> &mut Reaction {
        let idx = match self.reactions.iter().position(|r| r.kind == kind) {
            Some(idx) => idx,
            None => {
                self.reactions.push(Reaction::empty(kind));
                self.reactions.len() - 1
            }
        };
        &mut self.reactions[idx]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub is_public: bool,
    pub owner_ids: Vec<UserId>,
    /// Join order.
    pub member_ids: Vec<UserId>,
    /// Most recent first.
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dm {
    pub id: DmId,
    pub name: String,
    /// `None` once the creator has left.
    pub creator_id: Option<UserId>,
    pub member_ids: Vec<UserId>,
    pub messages: Vec<Message>,
}

/// Behaviour shared by channels and DMs: both own a membership list and a
/// most-recent-first message log.
pub trait Container {
    fn container_ref(&self) -> ContainerRef;
    fn name(&self) -> &str;
    fn member_ids(&self) -> &[UserId];
    fn messages(&self) -> &[Message];
    fn messages_mut(&mut self) -> &mut Vec<Message>;

    /// Whether `user_id` may moderate messages here. `global_owner` is the
    /// caller's platform-wide permission.
    fn has_owner_permission(&self, user_id: UserId, global_owner: bool) -> bool;

    fn is_member(&self, user_id: UserId) -> bool {
        self.member_ids().contains(&user_id)
    }

    fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages().iter().find(|m| m.id == id)
    }

    fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages_mut().iter_mut().find(|m| m.id == id)
    }

    /// New messages only ever land at the head of the log.
    fn prepend(&mut self, message: Message) {
        self.messages_mut().insert(0, message);
    }

    fn remove_message(&mut self, id: MessageId) -> Option<Message> {
        let messages = self.messages_mut();
        let idx = messages.iter().position(|m| m.id == id)?;
        Some(messages.remove(idx))
    }
}

impl Container for Channel {
    fn container_ref(&self) -> ContainerRef {
        ContainerRef::Channel(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn member_ids(&self) -> &[UserId] {
        &self.member_ids
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    fn has_owner_permission(&self, user_id: UserId, global_owner: bool) -> bool {
        self.owner_ids.contains(&user_id) || (global_owner && self.is_member(user_id))
    }
}

impl Container for Dm {
    fn container_ref(&self) -> ContainerRef {
        ContainerRef::Dm(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn member_ids(&self) -> &[UserId] {
        &self.member_ids
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn messages_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    fn has_owner_permission(&self, user_id: UserId, _global_owner: bool) -> bool {
        self.creator_id == Some(user_id)
    }
}

/// The whole persisted state. Messages live inline in their container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataStore {
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    pub dms: Vec<Dm>,
    /// Highest message id ever handed out, including reservations.
    #[serde(default)]
    pub last_message_id: MessageId,
}

impl DataStore {
    // -- Users --

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// Active users only.
    pub fn user_by_handle(&self, handle: &str) -> Option<&User> {
        self.users.iter().find(|u| !u.removed && u.handle == handle)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| !u.removed && u.email == email)
    }

    pub fn next_user_id(&self) -> UserId {
        self.users.iter().map(|u| u.id).max().unwrap_or(0) + 1
    }

    // -- Containers --

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    pub fn dm(&self, id: DmId) -> Option<&Dm> {
        self.dms.iter().find(|d| d.id == id)
    }

    pub fn dm_mut(&mut self, id: DmId) -> Option<&mut Dm> {
        self.dms.iter_mut().find(|d| d.id == id)
    }

    pub fn next_channel_id(&self) -> ChannelId {
        self.channels.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    pub fn next_dm_id(&self) -> DmId {
        self.dms.iter().map(|d| d.id).max().unwrap_or(0) + 1
    }

    pub fn container(&self, target: ContainerRef) -> Option<&dyn Container> {
        match target {
            ContainerRef::Channel(id) => self.channel(id).map(|c| c as &dyn Container),
            ContainerRef::Dm(id) => self.dm(id).map(|d| d as &dyn Container),
        }
    }

    pub fn container_mut(&mut self, target: ContainerRef) -> Option<&mut dyn Container> {
        match target {
            ContainerRef::Channel(id) => self.channel_mut(id).map(|c| c as &mut dyn Container),
            ContainerRef::Dm(id) => self.dm_mut(id).map(|d| d as &mut dyn Container),
        }
    }

    fn containers(&self) -> impl Iterator<Item = &dyn Container> {
        self.channels
            .iter()
            .map(|c| c as &dyn Container)
            .chain(self.dms.iter().map(|d| d as &dyn Container))
    }

    // -- Messages --

    /// Finds whichever container currently holds message `id`.
    pub fn locate_message(&self, id: MessageId) -> Option<ContainerRef> {
        self.containers()
            .find(|c| c.message(id).is_some())
            .map(|c| c.container_ref())
    }

    pub fn total_messages(&self) -> usize {
        self.containers().map(|c| c.messages().len()).sum()
    }

    pub fn max_message_id(&self) -> MessageId {
        self.containers()
            .flat_map(|c| c.messages().iter().map(|m| m.id))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: ChannelId, members: &[UserId]) -> Channel {
        Channel {
            id,
            name: format!("chan{}", id),
            is_public: true,
            owner_ids: members.first().copied().into_iter().collect(),
            member_ids: members.to_vec(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn container_ref_pair_requires_exactly_one_side() {
        assert_eq!(ContainerRef::from_pair(3, -1), Some(ContainerRef::Channel(3)));
        assert_eq!(ContainerRef::from_pair(-1, 7), Some(ContainerRef::Dm(7)));
        assert_eq!(ContainerRef::from_pair(-1, -1), None);
        assert_eq!(ContainerRef::from_pair(1, 1), None);

        let dm = ContainerRef::Dm(7);
        assert_eq!((dm.channel_id(), dm.dm_id()), (-1, 7));
    }

    #[test]
    fn react_kind_serializes_as_id() {
        let json = serde_json::to_string(&ReactKind::Like).unwrap();
        assert_eq!(json, "1");
        assert!(serde_json::from_str::<ReactKind>("2").is_err());
    }

    #[test]
    fn prepend_and_remove_keep_order() {
        let mut chan = channel(1, &[1]);
        chan.prepend(Message::new(1, 1, "a".into(), 0));
        chan.prepend(Message::new(2, 1, "b".into(), 0));
        chan.prepend(Message::new(3, 1, "c".into(), 0));

        assert_eq!(chan.remove_message(2).map(|m| m.body), Some("b".to_string()));
        assert!(chan.remove_message(2).is_none());

        let ids: Vec<_> = chan.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn owner_permission_differs_by_container() {
        let chan = channel(1, &[1, 2, 3]);
        assert!(chan.has_owner_permission(1, false));
        assert!(!chan.has_owner_permission(2, false));
        assert!(chan.has_owner_permission(2, true));
        // Global owners only moderate channels they belong to.
        assert!(!chan.has_owner_permission(9, true));

        let dm = Dm {
            id: 1,
            name: "a, b".into(),
            creator_id: Some(1),
            member_ids: vec![1, 2],
            messages: Vec::new(),
        };
        assert!(dm.has_owner_permission(1, false));
        assert!(!dm.has_owner_permission(2, true));
    }

    #[test]
    fn locate_message_searches_both_container_kinds() {
        let mut data = DataStore::default();
        let mut chan = channel(1, &[1]);
        chan.prepend(Message::new(10, 1, "hi".into(), 0));
        data.channels.push(chan);
        data.dms.push(Dm {
            id: 4,
            name: "x".into(),
            creator_id: None,
            member_ids: vec![1],
            messages: vec![Message::new(11, 1, "yo".into(), 0)],
        });

        assert_eq!(data.locate_message(10), Some(ContainerRef::Channel(1)));
        assert_eq!(data.locate_message(11), Some(ContainerRef::Dm(4)));
        assert_eq!(data.locate_message(12), None);
        assert_eq!(data.total_messages(), 2);
        assert_eq!(data.max_message_id(), 11);
    }
}
