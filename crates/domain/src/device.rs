//! Device identity: the immutable description of one monitored endpoint,
//! and the identity of the controller running the monitor.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ViamonError};
use crate::id::{DeviceId, RoomId};

/// One monitored touch-panel gateway, as supplied by the inventory.
///
/// Created once when monitoring starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub id: DeviceId,
    /// Hostname or IP address of the device (without port).
    pub address: String,
    pub room_id: RoomId,
}

impl DeviceIdentity {
    /// Create a builder for constructing a [`DeviceIdentity`].
    #[must_use]
    pub fn builder() -> DeviceIdentityBuilder {
        DeviceIdentityBuilder::default()
    }

    /// Building the device sits in.
    #[must_use]
    pub fn building_id(&self) -> &str {
        self.room_id.building()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ViamonError::Validation`] when `address` is blank.
    pub fn validate(&self) -> Result<(), ViamonError> {
        if self.address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`DeviceIdentity`].
#[derive(Debug, Default)]
pub struct DeviceIdentityBuilder {
    id: Option<String>,
    address: Option<String>,
    room_id: Option<String>,
}

impl DeviceIdentityBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    /// Consume the builder, validate, and return a [`DeviceIdentity`].
    ///
    /// # Errors
    ///
    /// Returns [`ViamonError::Validation`] if the id, room or address is
    /// missing or blank.
    pub fn build(self) -> Result<DeviceIdentity, ViamonError> {
        let device = DeviceIdentity {
            id: DeviceId::new(self.id.unwrap_or_default())?,
            address: self.address.unwrap_or_default(),
            room_id: RoomId::new(self.room_id.unwrap_or_default())?,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Identity of the controller this process runs on, parsed from its
/// system id (`BLDG-ROOM-HOST`, e.g. `ITB-1101-CP1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub system_id: String,
    pub room_id: RoomId,
}

/// Host suffix of the controller that owns device monitoring in a room.
const PRIMARY_CONTROLLER_SUFFIX: &str = "-CP1";

impl SystemIdentity {
    /// Parse a system id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSystemId`] when the id does not
    /// have at least three `-`-separated parts.
    pub fn parse(system_id: &str) -> Result<Self, ValidationError> {
        let mut parts = system_id.split('-');
        let (Some(building), Some(room), Some(host)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ValidationError::InvalidSystemId(system_id.to_string()));
        };
        if building.is_empty() || room.is_empty() || host.is_empty() {
            return Err(ValidationError::InvalidSystemId(system_id.to_string()));
        }

        Ok(Self {
            system_id: system_id.to_string(),
            room_id: RoomId::new(format!("{building}-{room}"))?,
        })
    }

    /// Whether this controller is the one that should monitor the room's devices.
    #[must_use]
    pub fn is_primary_controller(&self) -> bool {
        self.system_id.ends_with(PRIMARY_CONTROLLER_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_device_identity() {
        let device = DeviceIdentity::builder()
            .id("ITB-1101-VIA1")
            .address("itb-1101-via1.example.edu")
            .room_id("ITB-1101")
            .build()
            .unwrap();
        assert_eq!(device.id.as_str(), "ITB-1101-VIA1");
        assert_eq!(device.building_id(), "ITB");
    }

    #[test]
    fn should_reject_missing_address() {
        let result = DeviceIdentity::builder()
            .id("ITB-1101-VIA1")
            .room_id("ITB-1101")
            .build();
        assert!(matches!(
            result,
            Err(ViamonError::Validation(ValidationError::EmptyAddress))
        ));
    }

    #[test]
    fn should_reject_missing_id() {
        let result = DeviceIdentity::builder()
            .address("10.0.0.5")
            .room_id("ITB-1101")
            .build();
        assert!(matches!(
            result,
            Err(ViamonError::Validation(ValidationError::EmptyDeviceId))
        ));
    }

    #[test]
    fn should_parse_system_id() {
        let system = SystemIdentity::parse("ITB-1101-CP1").unwrap();
        assert_eq!(system.room_id.as_str(), "ITB-1101");
        assert!(system.is_primary_controller());
    }

    #[test]
    fn should_not_be_primary_for_other_controllers() {
        let system = SystemIdentity::parse("ITB-1101-CP2").unwrap();
        assert!(!system.is_primary_controller());
    }

    #[test]
    fn should_reject_short_system_id() {
        assert_eq!(
            SystemIdentity::parse("ITB-1101"),
            Err(ValidationError::InvalidSystemId("ITB-1101".to_string()))
        );
    }
}
