//! Shared configuration, error types, IDs, and observability primitives for Kestrel crates.
//!
//! Architecture role:
//! - defines engine/runtime configuration passed across layers
//! - provides common [`KestrelError`] / [`Result`] contracts
//! - hosts the metrics registry and tracing bootstrap
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`ids`]
//! - [`logging`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod ids;
pub mod logging;
pub mod metrics;

pub use config::EngineConfig;
pub use error::{KestrelError, Result};
pub use ids::*;
pub use metrics::MetricsRegistry;
