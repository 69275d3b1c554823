//! VIA adapter error types.

use std::time::Duration;

use tokio_util::codec::AnyDelimiterCodecError;
use viamon_domain::error::ViamonError;

/// Errors raised while talking to a VIA device.
#[derive(Debug, thiserror::Error)]
pub enum ViaError {
    /// The TCP connection could not be opened.
    #[error("failed to connect: {0}")]
    Connect(#[source] std::io::Error),

    /// Opening the connection or logging in took too long.
    #[error("no answer within {}s", .0.as_secs())]
    ConnectTimeout(Duration),

    /// The device answered the login command with an error.
    #[error("login rejected: {reply}")]
    LoginRejected { reply: String },

    /// Writing a command failed.
    #[error("failed to send command: {0}")]
    Write(#[source] std::io::Error),

    /// Writing a command did not complete in time.
    #[error("command not sent within {}s", .0.as_secs())]
    WriteTimeout(Duration),

    /// Reading from the socket failed.
    #[error("failed to read: {0}")]
    Read(#[source] AnyDelimiterCodecError),

    /// The device closed the connection.
    #[error("connection closed by device")]
    Closed,
}

impl ViaError {
    /// Convert into a [`ViamonError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> ViamonError {
        ViamonError::Transport(Box::new(self))
    }
}

impl From<ViaError> for ViamonError {
    fn from(err: ViaError) -> Self {
        err.into_domain()
    }
}
