//! Event publisher selected at startup.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use viamon_adapter_mqtt::{MqttConfig, MqttPublisher};
use viamon_app::event_bus::InProcessEventBus;
use viamon_app::ports::EventPublisher;
use viamon_domain::error::ViamonError;
use viamon_domain::event::DomainEvent;

/// Capacity of the in-process bus used when no broker is configured.
const BUS_CAPACITY: usize = 256;

/// The one publisher of the process, shared by every supervisor.
#[derive(Clone)]
pub enum Publisher {
    Mqtt(MqttPublisher),
    InProcess(Arc<InProcessEventBus>),
}

impl Publisher {
    /// Connect to the broker when one is configured; otherwise publish on
    /// the in-process bus and log every event.
    ///
    /// Background tasks stop when `cancel` is triggered.
    pub fn start(mqtt: Option<&MqttConfig>, cancel: CancellationToken) -> Self {
        if let Some(config) = mqtt {
            return Self::Mqtt(MqttPublisher::spawn(config, cancel));
        }

        tracing::warn!("no MQTT broker configured, events are only logged");
        let bus = Arc::new(InProcessEventBus::new(BUS_CAPACITY));
        tokio::spawn(log_events(Arc::clone(&bus), cancel));
        Self::InProcess(bus)
    }
}

impl EventPublisher for Publisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), ViamonError> {
        match self {
            Self::Mqtt(publisher) => publisher.publish(event).await,
            Self::InProcess(bus) => bus.publish(event).await,
        }
    }
}

async fn log_events(bus: Arc<InProcessEventBus>, cancel: CancellationToken) {
    let mut events = bus.subscribe();
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            received = events.recv() => received,
        };
        match received {
            Ok(event) => tracing::info!(
                device_id = %event.device_id,
                room_id = %event.room_id,
                kind = %event.kind,
                action = %event.action,
                state = %event.state,
                user = event.user.as_deref(),
                "event"
            ),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event logger fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
