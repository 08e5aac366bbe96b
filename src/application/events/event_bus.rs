//! Event bus for broadcasting booking events to subscribers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{Event, EventMessage};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let booking_id = message.event.booking_id().to_string();

        match self.sender.send(message) {
            Ok(count) => {
                debug!(event_type, booking_id, subscribers = count, "Event published");
            }
            Err(_) => {
                debug!(event_type, booking_id, "Event published (no subscribers)");
            }
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New event subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Next event; `None` once the bus is dropped. Lagged messages are skipped.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant, mostly for tests.
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        debug!(remaining = prev.saturating_sub(1), "Event subscriber disconnected");
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingStatus, BookingTransition, ResourceKind, TransitionRecord};
    use crate::domain::ActorRole;
    use chrono::Utc;

    fn cancelled(id: &str) -> Event {
        Event::from_transition(
            id,
            "e1",
            ResourceKind::Event,
            &TransitionRecord {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Cancelled,
                transition: BookingTransition::Cancel,
                actor_role: ActorRole::Staff,
                at: Utc::now(),
            },
        )
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(cancelled("b1"));
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.booking_id(), "b1");
        assert_eq!(msg.event.event_type(), "booking_cancelled");
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(cancelled("b1"));
    }

    #[test]
    fn dropping_subscriber_decrements_count() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
