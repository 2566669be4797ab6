use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use huddle_types::models::{DataStore, UserId};

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"@([A-Za-z0-9]+)").expect("tag pattern compiles"))
}

/// Every `@handle` mention in `text`, de-duplicated. Matching is greedy, so
/// `@annabel` never counts as a mention of `anna`.
pub fn scan(text: &str) -> BTreeSet<String> {
    tag_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Users tagged in `text` that exist and are members of `members`.
pub fn resolve_tagged(data: &DataStore, members: &[UserId], text: &str) -> Vec<UserId> {
    scan(text)
        .iter()
        .filter_map(|handle| data.user_by_handle(handle))
        .map(|user| user.id)
        .filter(|id| members.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_types::models::{Permission, User};

    fn with_users(handles: &[&str]) -> DataStore {
        let mut data = DataStore::default();
        for (i, handle) in handles.iter().enumerate() {
            data.users.push(User {
                id: i as UserId + 1,
                email: format!("{}@example.com", handle),
                password_hash: String::new(),
                name_first: String::new(),
                name_last: String::new(),
                handle: handle.to_string(),
                permission: Permission::Member,
                notifications: Vec::new(),
                removed: false,
            });
        }
        data
    }

    #[test]
    fn scan_dedupes_and_is_greedy() {
        let tags = scan("hi @anna and @annabel, also @anna again! @ nobody");
        let tags: Vec<_> = tags.into_iter().collect();
        assert_eq!(tags, vec!["anna".to_string(), "annabel".to_string()]);
    }

    #[test]
    fn scan_stops_at_punctuation() {
        let tags = scan("ping @bob.");
        assert!(tags.contains("bob"));
        assert!(scan("email me at nobody@").is_empty());
    }

    #[test]
    fn resolve_filters_unknown_and_non_members() {
        let data = with_users(&["anna", "bob", "carl"]);
        // carl exists but is not a member; dave does not exist
        let tagged = resolve_tagged(&data, &[1, 2], "@anna @carl @dave @bob");
        assert_eq!(tagged, vec![1, 2]);
    }

    #[test]
    fn longer_handle_does_not_match_prefix_user() {
        let data = with_users(&["anna"]);
        assert!(resolve_tagged(&data, &[1], "@annabel").is_empty());
    }
}
