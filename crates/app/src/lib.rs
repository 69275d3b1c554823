//! # viamon-app
//!
//! Application layer: **port definitions** (traits) and the monitoring core.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Connector`: produce a transport handle for a device address
//!   - `LineReader` / `Prober`: the read and write sides of that handle
//!   - `EventPublisher`: deliver domain events to the event bus
//! - Run one **connection supervisor** per device, each owning a read loop
//!   and a heartbeat loop, reconnecting forever (or up to a budget)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `viamon-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod monitor;
pub mod ports;
