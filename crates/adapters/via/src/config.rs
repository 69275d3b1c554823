//! VIA device connection configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Settings shared by every VIA session of the process.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ViaConfig {
    /// TCP port of the VIA control interface.
    pub port: u16,
    /// Username sent with every command.
    pub username: String,
    /// Password sent with every command.
    pub password: String,
    /// Upper bound on the TCP connect and on the login handshake, in seconds.
    pub connect_timeout_secs: u64,
    /// Upper bound on a single command write, in seconds.
    pub write_timeout_secs: u64,
    /// Command sent as a liveness probe. Its reply is ignored.
    pub keepalive_command: String,
    /// Longest status line accepted before it is discarded.
    pub max_line_length: usize,
}

impl ViaConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for ViaConfig {
    fn default() -> Self {
        Self {
            port: 9982,
            username: String::new(),
            password: String::new(),
            connect_timeout_secs: 5,
            write_timeout_secs: 5,
            keepalive_command: "IpInfo".to_string(),
            max_line_length: 4096,
        }
    }
}

impl fmt::Debug for ViaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViaConfig")
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("write_timeout_secs", &self.write_timeout_secs)
            .field("keepalive_command", &self.keepalive_command)
            .field("max_line_length", &self.max_line_length)
            .finish()
    }
}
