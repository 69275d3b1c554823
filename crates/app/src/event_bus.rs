//! In-process event bus backed by a tokio broadcast channel.
//!
//! Used when no external broker is configured, and by tests to observe
//! what the read loops publish.

use std::future::Future;

use tokio::sync::broadcast;

use viamon_domain::error::ViamonError;
use viamon_domain::event::DomainEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        event: DomainEvent,
    ) -> impl Future<Output = Result<(), ViamonError>> + Send {
        // Fails only when nobody is subscribed.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
