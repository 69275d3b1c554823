//! MQTT adapter error types.

use viamon_domain::error::ViamonError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The request queue is full or the event loop has stopped.
    #[error("MQTT client error: {0}")]
    Client(#[source] rumqttc::ClientError),

    /// The event could not be encoded as JSON.
    #[error("failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`ViamonError::Publish`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> ViamonError {
        ViamonError::Publish(Box::new(self))
    }
}

impl From<MqttError> for ViamonError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
