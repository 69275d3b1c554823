//! # viamon-adapter-via
//!
//! TCP driver for Kramer VIA devices.
//!
//! ## Responsibilities
//! - Open a TCP session to a VIA device and log in
//! - Split the session into a line reader (read half) and a keepalive
//!   prober (write half)
//! - Frame outgoing commands in the VIA XML-ish envelope
//!
//! ## Dependency rule
//! Depends on `viamon-app` (for the [`Connector`](viamon_app::ports::Connector)
//! port) and `viamon-domain`. Nothing depends on this crate except the binary.

pub mod command;
pub mod config;
pub mod connector;
pub mod error;

pub use config::ViaConfig;
pub use connector::{TcpConnector, ViaProber, ViaReader};
pub use error::ViaError;
