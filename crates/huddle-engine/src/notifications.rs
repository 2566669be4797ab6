use huddle_types::api::NotificationView;
use huddle_types::models::{ContainerRef, DataStore, Notification, User, UserId};

/// Notifications returned on read; older ones stay stored but are not shown.
pub const VISIBLE_NOTIFICATIONS: usize = 20;

const PREVIEW_LEN: usize = 20;

/// Prepends a notification to `user_id`'s list. Unknown users are ignored.
pub fn push(data: &mut DataStore, user_id: UserId, target: ContainerRef, message: String) {
    if let Some(user) = data.user_mut(user_id) {
        user.notifications.insert(0, Notification { target, message });
    }
}

pub fn tagged(author_handle: &str, container_name: &str, text: &str) -> String {
    let preview: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{} tagged you in {}: {}", author_handle, container_name, preview)
}

pub fn reacted(reactor_handle: &str, container_name: &str) -> String {
    format!("{} reacted to your message in {}", reactor_handle, container_name)
}

pub fn added(inviter_handle: &str, container_name: &str) -> String {
    format!("{} added you to {}", inviter_handle, container_name)
}

pub fn recent(user: &User) -> Vec<NotificationView> {
    user.notifications
        .iter()
        .take(VISIBLE_NOTIFICATIONS)
        .map(|n| NotificationView {
            channel_id: n.target.channel_id(),
            dm_id: n.target.dm_id(),
            notification_message: n.message.clone(),
        })
        .collect()
}
