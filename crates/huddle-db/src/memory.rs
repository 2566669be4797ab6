use std::sync::Mutex;

use anyhow::{Result, anyhow};

use huddle_types::models::DataStore;

use crate::Store;

/// Volatile store for tests and throwaway instances.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<DataStore>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: DataStore) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<DataStore> {
        let data = self.data.lock().map_err(|e| anyhow!("store lock poisoned: {}", e))?;
        Ok(data.clone())
    }

    fn save(&self, data: &DataStore) -> Result<()> {
        let mut slot = self.data.lock().map_err(|e| anyhow!("store lock poisoned: {}", e))?;
        *slot = data.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_types::models::{Channel, Container, Message};

    #[test]
    fn seeded_state_is_loaded_and_replaced_on_save() {
        let mut channel = Channel {
            id: 1,
            name: "general".into(),
            is_public: true,
            owner_ids: vec![1],
            member_ids: vec![1],
            messages: Vec::new(),
        };
        channel.prepend(Message::new(3, 1, "seeded".into(), 1_700_000_000));

        let store = MemoryStore::with_data(DataStore {
            channels: vec![channel],
            last_message_id: 3,
            ..Default::default()
        });

        let mut data = store.load().unwrap();
        assert_eq!(data.channels[0].messages[0].body, "seeded");
        assert_eq!(data.last_message_id, 3);

        data.channels[0].remove_message(3);
        data.last_message_id = 4;
        store.save(&data).unwrap();

        let reloaded = store.load().unwrap();
        assert!(reloaded.channels[0].messages.is_empty());
        assert_eq!(reloaded.last_message_id, 4);
    }
}
