//! Configuration and tick scheduling for the Warden region protection core.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration and region index assembly
//! - [`driver`] -- The fixed-rate tick driver and its stop control

pub mod config;
pub mod driver;

pub use config::{ConfigError, WardenConfig};
pub use driver::{DriverControl, DriverEndReason, DriverError, DriverSummary, run_tick_driver};
