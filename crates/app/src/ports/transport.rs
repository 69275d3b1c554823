//! Transport port: the persistent line-oriented connection to one device.
//!
//! A [`Transport`] is split into its two directions up front so that the
//! read loop and the heartbeat loop each own exactly one side and never
//! share a lock. Dropping both halves closes the connection; a handle is
//! never reused after that, the [`Connector`] produces a fresh one.

use std::future::Future;

use viamon_domain::error::ViamonError;

/// Read side of a transport handle.
pub trait LineReader: Send {
    /// Read the next delimiter-terminated line.
    ///
    /// End of stream is reported as an error: a monitoring connection is
    /// never expected to close on its own.
    fn read_line(&mut self) -> impl Future<Output = Result<String, ViamonError>> + Send;
}

/// Write side of a transport handle, used only for liveness probes.
pub trait Prober: Send {
    /// Send the vendor keepalive command.
    fn probe(&mut self) -> impl Future<Output = Result<(), ViamonError>> + Send;
}

/// A live connection to one device, split by direction.
#[derive(Debug)]
pub struct Transport<R, P> {
    pub reader: R,
    pub prober: P,
}

/// Produces transport handles. Credentials live in the implementation.
pub trait Connector: Send + Sync {
    type Reader: LineReader + 'static;
    type Prober: Prober + 'static;

    /// Open and authenticate a connection to `address`.
    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Transport<Self::Reader, Self::Prober>, ViamonError>> + Send;
}

impl<T: Connector> Connector for std::sync::Arc<T> {
    type Reader = T::Reader;
    type Prober = T::Prober;

    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Transport<Self::Reader, Self::Prober>, ViamonError>> + Send {
        (**self).connect(address)
    }
}
