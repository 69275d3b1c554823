//! Session status: where a device's monitoring session is in its lifecycle.
//!
//! ```text
//! Connecting ──► Active ──► Closing ──► Connecting …
//!     │
//!     ├──► GaveUp   (retry budget exhausted)
//!     └──► Stopped  (monitoring cancelled)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::DeviceIdentity;
use crate::event::{Timestamp, now};
use crate::id::DeviceId;

/// Lifecycle state of one device's monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Trying to obtain a transport handle.
    Connecting,
    /// Read and heartbeat loops are running on a live handle.
    Active,
    /// A loop ended; the handle is being torn down.
    Closing,
    /// Monitoring was cancelled. Terminal.
    Stopped,
    /// The configured retry budget ran out. Terminal.
    GaveUp,
}

impl SessionState {
    /// Whether the supervisor has exited for good.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::GaveUp)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
            Self::GaveUp => "gave_up",
        };
        f.write_str(s)
    }
}

/// Snapshot of a monitoring session, as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub device_id: DeviceId,
    pub address: String,
    pub state: SessionState,
    /// Number of sessions that reached [`SessionState::Active`].
    pub sessions: u64,
    /// Connect attempts that failed since the last successful one.
    pub failed_attempts: u32,
    pub since: Timestamp,
}

impl SessionStatus {
    /// Initial status for a device that has not been attempted yet.
    #[must_use]
    pub fn new(device: &DeviceIdentity) -> Self {
        Self {
            device_id: device.id.clone(),
            address: device.address.clone(),
            state: SessionState::Connecting,
            sessions: 0,
            failed_attempts: 0,
            since: now(),
        }
    }

    /// Move to `state`, recording the transition time.
    pub fn transition(&mut self, state: SessionState) {
        if state == SessionState::Active {
            self.sessions += 1;
            self.failed_attempts = 0;
        }
        self.state = state;
        self.since = now();
    }
}
