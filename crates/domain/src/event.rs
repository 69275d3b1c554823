//! Domain event: the record forwarded to the event bus for every
//! recognised status line.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceIdentity;
use crate::id::{DeviceId, RoomId};

/// UTC timestamp stamped on events and status transitions.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// What an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Number of users currently logged in to the panel.
    CurrentUserCount,
    /// A single user logged in or out.
    UserLoginLogout,
    /// Media playback started or stopped. Keyed by the device's own
    /// `MediaStatus` tag, unlike the other kinds.
    #[serde(rename = "MediaStatus")]
    MediaStatus,
    /// A user started or stopped presenting.
    Presenting,
}

impl EventKind {
    /// Wire representation, also used as the event-bus key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CurrentUserCount => "current-user-count",
            Self::UserLoginLogout => "user-login-logout",
            Self::MediaStatus => "MediaStatus",
            Self::Presenting => "presenting",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    LoginCount,
    Login,
    Logout,
    MediaStarted,
    MediaStopped,
    PresentationStarted,
    PresentationStopped,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginCount => "login-count",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::MediaStarted => "media-started",
            Self::MediaStopped => "media-stopped",
            Self::PresentationStarted => "presentation-started",
            Self::PresentationStopped => "presentation-stopped",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The device-independent part of an event, as decoded from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub kind: EventKind,
    pub action: Action,
    pub user: Option<String>,
    pub state: String,
}

/// An event ready to be published. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub action: Action,
    pub timestamp: Timestamp,
    /// Controller that observed the event.
    pub generating_system: String,
    pub device_id: DeviceId,
    pub room_id: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub state: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Tags attached to every event produced by the monitor.
pub const DEFAULT_TAGS: [&str; 3] = ["detail-state", "auto-generated", "via"];

/// Per-device template every [`DomainEvent`] is stamped from.
///
/// Fixed when monitoring of a device starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    generating_system: String,
    device_id: DeviceId,
    room_id: RoomId,
    tags: Vec<String>,
}

impl EventTemplate {
    /// Build the template for `device`, observed by `generating_system`.
    #[must_use]
    pub fn for_device(device: &DeviceIdentity, generating_system: impl Into<String>) -> Self {
        Self {
            generating_system: generating_system.into(),
            device_id: device.id.clone(),
            room_id: device.room_id.clone(),
            tags: DEFAULT_TAGS.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Produce a fresh event from a decoded record.
    #[must_use]
    pub fn stamp(&self, record: EventRecord, timestamp: Timestamp) -> DomainEvent {
        DomainEvent {
            kind: record.kind,
            action: record.action,
            timestamp,
            generating_system: self.generating_system.clone(),
            device_id: self.device_id.clone(),
            room_id: self.room_id.clone(),
            user: record.user,
            state: record.state,
            tags: self.tags.clone(),
        }
    }
}
