//! Typed identifier newtypes backed by inventory strings.
//!
//! Inventory identifiers look like `ITB-1101-VIA1` (device) or `ITB-1101`
//! (room). They are never generated here, only wrapped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident, $empty:expr) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap an inventory identifier.
            ///
            /// # Errors
            ///
            /// Returns a [`ValidationError`] when the identifier is blank.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err($empty);
                }
                Ok(Self(value))
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a monitored [`DeviceIdentity`](crate::device::DeviceIdentity).
    DeviceId,
    ValidationError::EmptyDeviceId
);

define_id!(
    /// Identifier of the room (`BLDG-ROOM`) a device belongs to.
    RoomId,
    ValidationError::EmptyRoomId
);

impl RoomId {
    /// Building part of the room id (`ITB` for `ITB-1101`).
    #[must_use]
    pub fn building(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}
