use std::collections::HashSet;

use tracing::{debug, info};

use huddle_types::api::NotificationView;
use huddle_types::models::{
    Channel, ChannelId, Container, ContainerRef, DataStore, Dm, DmId, Permission, User, UserId,
};

use crate::error::{MessagingError, Result};
use crate::identity::{derive_handle, is_valid_email};
use crate::{Engine, container, notifications};

const MAX_NAME_LEN: usize = 50;
const MAX_CHANNEL_NAME_LEN: usize = 20;

/// A freshly registered account.
#[derive(Debug, Clone)]
pub struct Registered {
    pub user_id: UserId,
    pub handle: String,
}

/// What the login flow needs to verify a password and issue a token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: UserId,
    pub handle: String,
    pub password_hash: String,
}

fn check_name(field: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(MessagingError::invalid(format!(
            "{} must be between 1 and {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn handle_of(data: &DataStore, user_id: UserId) -> String {
    data.user(user_id).map(|u| u.handle.clone()).unwrap_or_default()
}

impl Engine {
    // -- Accounts --

    /// Creates a user. The first account on a fresh store becomes the
    /// global owner.
    pub fn register_user(
        &self,
        email: &str,
        password_hash: &str,
        name_first: &str,
        name_last: &str,
    ) -> Result<Registered> {
        self.mutate(|txn| {
            if !is_valid_email(email) {
                return Err(MessagingError::invalid(format!("'{}' is not a valid email", email)));
            }
            if txn.data.user_by_email(email).is_some() {
                return Err(MessagingError::invalid(format!("email '{}' is already registered", email)));
            }
            check_name("name_first", name_first)?;
            check_name("name_last", name_last)?;

            let user_id = txn.data.next_user_id();
            let handle = derive_handle(&txn.data, name_first, name_last);
            let permission = if txn.data.users.is_empty() {
                Permission::Owner
            } else {
                Permission::Member
            };

            txn.data.users.push(User {
                id: user_id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                name_first: name_first.to_string(),
                name_last: name_last.to_string(),
                handle: handle.clone(),
                permission,
                notifications: Vec::new(),
                removed: false,
            });

            info!("registered user {} as '{}'", user_id, handle);
            Ok(Registered { user_id, handle })
        })
    }

    pub fn credentials(&self, email: &str) -> Result<Option<Credentials>> {
        self.read(|_, data| {
            Ok(data.user_by_email(email).map(|u| Credentials {
                user_id: u.id,
                handle: u.handle.clone(),
                password_hash: u.password_hash.clone(),
            }))
        })
    }

    // -- Channels --

    pub fn channels_create(&self, token: &str, name: &str, is_public: bool) -> Result<ChannelId> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let len = name.chars().count();
            if len == 0 || len > MAX_CHANNEL_NAME_LEN {
                return Err(MessagingError::invalid(format!(
                    "channel name must be between 1 and {} characters",
                    MAX_CHANNEL_NAME_LEN
                )));
            }

            let channel_id = txn.data.next_channel_id();
            txn.data.channels.push(Channel {
                id: channel_id,
                name: name.to_string(),
                is_public,
                owner_ids: vec![user_id],
                member_ids: vec![user_id],
                messages: Vec::new(),
            });

            debug!("user {} created channel {} '{}'", user_id, channel_id, name);
            Ok(channel_id)
        })
    }

    pub fn channel_join(&self, token: &str, channel_id: ChannelId) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let global_owner = txn.data.user(user_id).is_some_and(|u| u.is_global_owner());
            let channel = txn
                .data
                .channel_mut(channel_id)
                .ok_or_else(|| MessagingError::not_found(format!("channel {} does not exist", channel_id)))?;

            if channel.is_member(user_id) {
                return Err(MessagingError::invalid(format!(
                    "you are already a member of channel {}",
                    channel_id
                )));
            }
            if !channel.is_public && !global_owner {
                return Err(MessagingError::forbidden(format!("channel {} is private", channel_id)));
            }

            channel.member_ids.push(user_id);
            debug!("user {} joined channel {}", user_id, channel_id);
            Ok(())
        })
    }

    pub fn channel_invite(&self, token: &str, channel_id: ChannelId, invitee: UserId) -> Result<()> {
        let target = ContainerRef::Channel(channel_id);

        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let channel = container(&txn.data, target)?;
            if txn.data.user(invitee).is_none_or(|u| u.removed) {
                return Err(MessagingError::not_found(format!("user {} does not exist", invitee)));
            }
            if channel.is_member(invitee) {
                return Err(MessagingError::invalid(format!(
                    "user {} is already a member of channel {}",
                    invitee, channel_id
                )));
            }
            if !channel.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of {}", target)));
            }

            let text = notifications::added(&handle_of(&txn.data, user_id), channel.name());
            if let Some(channel) = txn.data.channel_mut(channel_id) {
                channel.member_ids.push(invitee);
            }
            notifications::push(&mut txn.data, invitee, target, text);

            debug!("user {} invited user {} to channel {}", user_id, invitee, channel_id);
            Ok(())
        })
    }

    /// Leaving does not cancel scheduled sends the caller has pending here.
    pub fn channel_leave(&self, token: &str, channel_id: ChannelId) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let channel = txn
                .data
                .channel_mut(channel_id)
                .ok_or_else(|| MessagingError::not_found(format!("channel {} does not exist", channel_id)))?;
            if txn
                .state
                .standups
                .get(&channel_id)
                .is_some_and(|s| s.starter_id() == user_id)
            {
                return Err(MessagingError::invalid(
                    "you cannot leave while your standup is active",
                ));
            }
            if !channel.is_member(user_id) {
                return Err(MessagingError::forbidden(format!(
                    "you are not a member of channel {}",
                    channel_id
                )));
            }

            channel.member_ids.retain(|id| *id != user_id);
            channel.owner_ids.retain(|id| *id != user_id);
            debug!("user {} left channel {}", user_id, channel_id);
            Ok(())
        })
    }

    // -- DMs --

    /// Opens a DM between the caller and `u_ids`. The caller owns it.
    pub fn dm_create(&self, token: &str, u_ids: &[UserId]) -> Result<DmId> {
        self.mutate(|txn| {
            let creator_id = self.authenticate(&txn.data, token)?;
            if let Some(missing) = u_ids
                .iter()
                .find(|id| txn.data.user(**id).is_none_or(|u| u.removed))
            {
                return Err(MessagingError::not_found(format!("user {} does not exist", missing)));
            }

            let mut seen = HashSet::from([creator_id]);
            if !u_ids.iter().all(|id| seen.insert(*id)) {
                return Err(MessagingError::invalid("dm members must be distinct and exclude yourself"));
            }

            let mut member_ids = vec![creator_id];
            member_ids.extend_from_slice(u_ids);

            let mut handles: Vec<String> = member_ids.iter().map(|id| handle_of(&txn.data, *id)).collect();
            handles.sort();
            let name = handles.join(", ");

            let dm_id = txn.data.next_dm_id();
            let text = notifications::added(&handle_of(&txn.data, creator_id), &name);
            for invitee in u_ids {
                notifications::push(&mut txn.data, *invitee, ContainerRef::Dm(dm_id), text.clone());
            }

            txn.data.dms.push(Dm {
                id: dm_id,
                name,
                creator_id: Some(creator_id),
                member_ids,
                messages: Vec::new(),
            });

            debug!("user {} created dm {}", creator_id, dm_id);
            Ok(dm_id)
        })
    }

    pub fn dm_leave(&self, token: &str, dm_id: DmId) -> Result<()> {
        self.mutate(|txn| {
            let user_id = self.authenticate(&txn.data, token)?;
            let dm = txn
                .data
                .dm_mut(dm_id)
                .ok_or_else(|| MessagingError::not_found(format!("dm {} does not exist", dm_id)))?;
            if !dm.is_member(user_id) {
                return Err(MessagingError::forbidden(format!("you are not a member of dm {}", dm_id)));
            }

            dm.member_ids.retain(|id| *id != user_id);
            if dm.creator_id == Some(user_id) {
                dm.creator_id = None;
            }
            debug!("user {} left dm {}", user_id, dm_id);
            Ok(())
        })
    }

    // -- Notifications --

    /// The caller's most recent notifications, newest first.
    pub fn notifications_get(&self, token: &str) -> Result<Vec<NotificationView>> {
        self.read(|_, data| {
            let user_id = self.authenticate(data, token)?;
            let user = data
                .user(user_id)
                .ok_or_else(|| MessagingError::not_found(format!("user {} does not exist", user_id)))?;
            Ok(notifications::recent(user))
        })
    }
}
