//! Hardware abstraction layer configuration.
//!
//! Describes which drivers a node registers at boot and how the sensor hub
//! samples them.

pub mod config;
