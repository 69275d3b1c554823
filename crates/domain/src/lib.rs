//! # viamon-domain
//!
//! Pure domain model for the viamon touch-panel monitor.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Device identities** (the endpoints being monitored and the room they sit in)
//! - Define **Domain events** (what gets forwarded to the event bus) and the
//!   per-device template they are stamped from
//! - Decode the vendor's `|`-delimited status lines into event records
//! - Describe the lifecycle of a monitoring session
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device;
pub mod event;
pub mod protocol;
pub mod session;
