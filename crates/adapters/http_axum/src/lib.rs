//! # viamon-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Answer `GET /health` for container liveness checks
//! - Expose the session status of every monitored device as JSON
//!   (`/api/monitors`, `/api/monitors/{device_id}`)
//!
//! ## Dependency rule
//! Depends on `viamon-app` (for the [`Fleet`](viamon_app::monitor::Fleet))
//! and `viamon-domain`. Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
