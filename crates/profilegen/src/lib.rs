//! HTTP client for the horse profile generation service.
//!
//! Posts interview answers to the service and returns the drafted profile
//! fields. Implements [`paddock_core::profile::ProfileGenerator`] so the
//! draft manager can use it directly.

pub mod api;
pub mod config;

pub use api::{ProfileGenApi, ProfileGenApiError};
pub use config::ProfileGenConfig;
