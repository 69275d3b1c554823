//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `viamon.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use viamon_adapter_mqtt::MqttConfig;
use viamon_adapter_via::ViaConfig;
use viamon_app::monitor::MonitorPolicy;
use viamon_domain::device::{DeviceIdentity, SystemIdentity};
use viamon_domain::error::ViamonError;
use viamon_domain::id::RoomId;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Identity of the controller this process runs on.
    pub system: SystemConfig,
    /// VIA connection settings shared by every device.
    pub via: ViaConfig,
    /// Broker settings; events stay in-process when absent.
    pub mqtt: Option<MqttConfig>,
    /// Reconnect and liveness timings.
    pub monitor: MonitorConfig,
    /// Devices to monitor.
    pub devices: Vec<DeviceConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Controller name, `BLDG-ROOM-CPn`.
    pub system_id: Option<String>,
    /// Whether this controller is deployed in a room. Set by a non-empty
    /// `ROOM_SYSTEM`; without it nothing is monitored, whatever the
    /// system id says.
    pub room_system: bool,
}

/// Monitoring timings, in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub reconnect_interval_secs: u64,
    pub read_timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub probe_timeout_secs: u64,
    /// Consecutive failed connects before giving up on a device.
    /// Unset retries forever.
    pub max_attempts: Option<u32>,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    pub address: String,
    /// Defaults to the room of the controller.
    pub room_id: Option<String>,
}

impl Config {
    /// Load configuration from `viamon.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("viamon.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("VIAMON_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("VIAMON_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("VIAMON_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("VIAMON_USERNAME") {
            self.via.username = val;
        }
        if let Some(val) = var("VIAMON_PASSWORD") {
            self.via.password = val;
        }
        if let Some(val) = var("SYSTEM_ID") {
            self.system.system_id = Some(val);
        }
        if let Some(val) = var("ROOM_SYSTEM") {
            self.system.room_system = !val.trim().is_empty();
        }
        if let Some(val) = var("HUB_ADDRESS") {
            let mqtt = self.mqtt.get_or_insert_with(MqttConfig::default);
            let host_port = val
                .rsplit_once(':')
                .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)));
            match host_port {
                Some((host, port)) => {
                    mqtt.broker_host = host.to_string();
                    mqtt.broker_port = port;
                }
                None => mqtt.broker_host = val,
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.via.port == 0 {
            return Err(ConfigError::Validation(
                "via.port must be non-zero".to_string(),
            ));
        }
        if let Some(mqtt) = &self.mqtt
            && mqtt.broker_host.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "mqtt.broker_host must not be empty".to_string(),
            ));
        }
        let timings = [
            ("reconnect_interval_secs", self.monitor.reconnect_interval_secs),
            ("read_timeout_secs", self.monitor.read_timeout_secs),
            ("heartbeat_interval_secs", self.monitor.heartbeat_interval_secs),
            ("probe_timeout_secs", self.monitor.probe_timeout_secs),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Validation(format!(
                "monitor.{name} must be non-zero"
            )));
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "device {} is listed twice",
                    device.id
                )));
            }
        }
        self.system()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Parsed controller identity, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the system id is not `BLDG-ROOM-CPn`.
    pub fn system(&self) -> Result<Option<SystemIdentity>, ConfigError> {
        self.system
            .system_id
            .as_deref()
            .map(SystemIdentity::parse)
            .transpose()
            .map_err(|err| ConfigError::Inventory(err.into()))
    }

    /// Devices this process should monitor. Empty unless it runs in a
    /// room system on the primary controller of that room.
    ///
    /// # Errors
    ///
    /// Returns an error when the system id or a device entry is invalid.
    pub fn monitored_devices(&self) -> Result<Vec<DeviceIdentity>, ConfigError> {
        if !self.system.room_system {
            tracing::warn!("system is not tied to a room; monitoring disabled");
            return Ok(Vec::new());
        }
        let Some(system) = self.system()? else {
            tracing::warn!("no system id configured; monitoring disabled");
            return Ok(Vec::new());
        };
        if !system.is_primary_controller() {
            tracing::info!(
                system_id = %system.system_id,
                "not the primary controller of the room; monitoring disabled"
            );
            return Ok(Vec::new());
        }
        self.devices(Some(&system.room_id))
    }

    /// Build the device inventory, placing devices without a room in
    /// `default_room`.
    ///
    /// # Errors
    ///
    /// Returns an error when an entry is blank or has no room at all.
    pub fn devices(&self, default_room: Option<&RoomId>) -> Result<Vec<DeviceIdentity>, ConfigError> {
        self.devices
            .iter()
            .map(|device| {
                let room_id = match (&device.room_id, default_room) {
                    (Some(room), _) => room.clone(),
                    (None, Some(room)) => room.to_string(),
                    (None, None) => {
                        return Err(ConfigError::Validation(format!(
                            "device {} has no room_id",
                            device.id
                        )));
                    }
                };
                DeviceIdentity::builder()
                    .id(&device.id)
                    .address(&device.address)
                    .room_id(room_id)
                    .build()
                    .map_err(ConfigError::Inventory)
            })
            .collect()
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn policy(&self) -> MonitorPolicy {
        MonitorPolicy {
            reconnect_interval: Duration::from_secs(self.reconnect_interval_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8014,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "viamond=info,viamon=info,tower_http=debug".to_string(),
            json: false,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let policy = MonitorPolicy::default();
        Self {
            reconnect_interval_secs: policy.reconnect_interval.as_secs(),
            read_timeout_secs: policy.read_timeout.as_secs(),
            heartbeat_interval_secs: policy.heartbeat_interval.as_secs(),
            probe_timeout_secs: policy.probe_timeout.as_secs(),
            max_attempts: policy.max_attempts,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A device or system identity was rejected by the domain.
    #[error("invalid inventory: {0}")]
    Inventory(#[source] ViamonError),
}
