//! Event bus port: hand domain events to whatever delivers them.

use std::future::Future;

use viamon_domain::error::ViamonError;
use viamon_domain::event::DomainEvent;

/// Publishes domain events to the event bus.
///
/// One instance is shared by every device's read loop, so implementations
/// must be safe for concurrent use and must not make one caller wait on
/// another. Delivery is best-effort; no acknowledgment is expected.
pub trait EventPublisher {
    /// Publish a single event.
    fn publish(&self, event: DomainEvent)
    -> impl Future<Output = Result<(), ViamonError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: DomainEvent,
    ) -> impl Future<Output = Result<(), ViamonError>> + Send {
        (**self).publish(event)
    }
}
