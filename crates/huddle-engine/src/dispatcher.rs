use std::sync::Arc;

use tokio::sync::broadcast;

use huddle_types::events::MessagingEvent;

/// Fans out messaging events to every live subscriber.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for messaging events; every subscriber receives every event
    broadcast_tx: broadcast::Sender<MessagingEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to messaging events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<MessagingEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event. Having no subscribers is not an error.
    pub fn broadcast(&self, event: MessagingEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_types::models::ContainerRef;

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher.broadcast(MessagingEvent::MessageRemove {
            message_id: 1,
            target: ContainerRef::Channel(1),
        });
    }

    #[test]
    fn every_subscriber_sees_the_event() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.clone().subscribe();

        let event = MessagingEvent::MessagePin {
            message_id: 3,
            target: ContainerRef::Dm(2),
            pinned: true,
        };
        dispatcher.broadcast(event.clone());

        assert_eq!(a.try_recv().unwrap(), event);
        assert_eq!(b.try_recv().unwrap(), event);
    }
}
