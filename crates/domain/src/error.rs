//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`ViamonError`]
//! at port boundaries.

use std::error::Error as StdError;

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum ViamonError {
    /// A value failed a domain invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A lookup found nothing.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Connecting to, reading from, or writing to a device failed.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// Handing an event to the event bus failed.
    #[error("publish error: {0}")]
    Publish(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("device address must not be empty")]
    EmptyAddress,

    /// The system id does not follow the `BLDG-ROOM-HOST` convention.
    #[error("system id {0:?} is not of the form BLDG-ROOM-HOST")]
    InvalidSystemId(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
