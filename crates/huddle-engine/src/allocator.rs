use huddle_types::models::{DataStore, MessageId};

/// Hands out message ids. Only ever touched while the engine lock is held.
///
/// The candidate is `messages held + outstanding reservations + 1`, raised
/// to one past the persisted high-water mark so ids freed by removal are
/// never reissued.
#[derive(Debug, Default)]
pub struct MessageIdAllocator {
    reserved: u64,
}

impl MessageIdAllocator {
    pub fn allocate(&self, data: &mut DataStore) -> MessageId {
        let counted = data.total_messages() as MessageId + self.reserved as MessageId + 1;
        let id = counted
            .max(data.last_message_id + 1)
            .max(data.max_message_id() + 1);
        data.last_message_id = id;
        id
    }

    /// Allocates an id for a message that will only materialize later.
    pub fn reserve(&mut self, data: &mut DataStore) -> MessageId {
        let id = self.allocate(data);
        self.reserved += 1;
        id
    }

    /// Called when a reserved message materializes (or is dropped).
    pub fn release(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
    }

    pub fn reserved(&self) -> u64 {
        self.reserved
    }
}
