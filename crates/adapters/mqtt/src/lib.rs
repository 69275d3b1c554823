//! # viamon-adapter-mqtt
//!
//! MQTT adapter: forwards every monitor event to an MQTT broker.
//!
//! ## Responsibilities
//! - Hold the single broker connection of the process
//! - Drive the rumqttc event loop, reconnecting on failure
//! - Implement [`EventPublisher`](viamon_app::ports::EventPublisher) with a
//!   non-blocking enqueue so a slow broker never stalls a device
//!
//! ## Dependency rule
//! Same as other adapters: depends on `viamon-app` and `viamon-domain`.

pub mod config;
pub mod error;
pub mod publisher;

pub use config::MqttConfig;
pub use error::MqttError;
pub use publisher::MqttPublisher;
