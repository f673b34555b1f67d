//! devctl Core Library
//!
//! Shared building blocks for the devctl crates: the error taxonomy,
//! run configuration, and tracing setup.

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{EnvironmentSettings, RunConfig, TestMode};
pub use error::{DevError, Result};
pub use telemetry::init_tracing;
