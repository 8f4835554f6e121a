//! # Kestrel Node
//!
//! Demo firmware node running on the host backend: simulated drivers are
//! registered from configuration, the sensor hub samples them into topics, a
//! battery monitor consumes the voltage topic and drives the status LED
//! through a service served from another thread.
//!
//! # Module Structure
//!
//! - [`config`] - node configuration file
//! - [`tasks`] - battery monitor and LED server

pub mod config;
pub mod tasks;

pub use crate::config::{MonitorConfig, NodeConfig};
pub use crate::tasks::{BatteryMonitor, LedService};
