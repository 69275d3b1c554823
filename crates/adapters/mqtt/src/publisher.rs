//! Event publisher backed by a rumqttc client.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;

use viamon_app::ports::EventPublisher;
use viamon_domain::error::ViamonError;
use viamon_domain::event::DomainEvent;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Pause after a broker connection error before polling again.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Publishes events to `{base_topic}/{room_id}/{device_id}/{kind}`.
///
/// Cheap to clone; every clone shares one broker connection.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    base_topic: String,
}

impl MqttPublisher {
    /// Create the client and spawn the task driving its connection.
    ///
    /// The connection is opened by the background task, so this never
    /// waits on the broker. The task stops when `cancel` is triggered.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(config: &MqttConfig, cancel: CancellationToken) -> Self {
        let (publisher, eventloop) = Self::new(config);
        tokio::spawn(drive(eventloop, cancel));
        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "MQTT publisher started"
        );
        publisher
    }

    fn new(config: &MqttConfig) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());
        let (client, eventloop) = AsyncClient::new(options, config.channel_capacity.max(1));
        let publisher = Self {
            client,
            base_topic: config.base_topic.trim_end_matches('/').to_string(),
        };
        (publisher, eventloop)
    }

    fn topic(&self, event: &DomainEvent) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_topic, event.room_id, event.device_id, event.kind
        )
    }

    fn enqueue(&self, event: &DomainEvent) -> Result<(), MqttError> {
        let payload = serde_json::to_vec(event).map_err(MqttError::Serialize)?;
        self.client
            .try_publish(self.topic(event), QoS::AtMostOnce, false, payload)
            .map_err(MqttError::Client)
    }
}

impl EventPublisher for MqttPublisher {
    async fn publish(&self, event: DomainEvent) -> Result<(), ViamonError> {
        self.enqueue(&event).map_err(MqttError::into_domain)
    }
}

async fn drive(mut eventloop: EventLoop, cancel: CancellationToken) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("connected to MQTT broker");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    %err,
                    retry_in_secs = RECONNECT_PAUSE.as_secs(),
                    "MQTT connection error"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RECONNECT_PAUSE) => {}
                }
            }
        }
    }
    tracing::debug!("MQTT event loop stopped");
}
