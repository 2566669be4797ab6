use std::sync::Arc;

use huddle_db::Database;
use huddle_engine::{Engine, JwtIdentity};
use huddle_types::models::ContainerRef;

#[test]
fn state_survives_an_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huddle.db");
    let identity = Arc::new(JwtIdentity::new("test-secret"));

    let (token, channel_id, removed) = {
        let engine = Engine::new(Arc::new(Database::open(&path).unwrap()), identity.clone());
        let ada = engine
            .register_user("ada@example.com", "hash", "Ada", "Lovelace")
            .unwrap();
        let token = identity.issue(ada.user_id, &ada.handle).unwrap();
        let channel_id = engine.channels_create(&token, "general", true).unwrap();
        let chan = ContainerRef::Channel(channel_id);

        engine.send_message(&token, chan, "kept").unwrap();
        let removed = engine.send_message(&token, chan, "dropped").unwrap();
        engine.remove_message(&token, removed).unwrap();
        (token, channel_id, removed)
    };

    let engine = Engine::new(Arc::new(Database::open(&path).unwrap()), identity);
    let page = engine.channel_messages(&token, channel_id, 0).unwrap();
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].message, "kept");

    // Ids freed by removal are not reissued after a restart either.
    let next = engine
        .send_message(&token, ContainerRef::Channel(channel_id), "fresh")
        .unwrap();
    assert!(next > removed);
}
