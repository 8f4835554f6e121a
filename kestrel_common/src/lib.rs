//! Kestrel Common Library
//!
//! Shared building blocks for every crate in the kestrel workspace: driver
//! identities, numeric limits, the canonical sensor sample schema, the HAL
//! error taxonomy and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Per-domain table sizes and system-wide defaults
//! - [`ids`] - `DriverId`, capability domains and per-domain id enums
//! - [`types`] - Canonical sample payloads (one schema per sensor class)
//! - [`error`] - `HalError` / `DriverError` taxonomy
//! - [`config`] - Configuration loading traits and types
//! - [`hal`] - HAL and sensor hub configuration
//! - [`filter`] - One-in/one-out sample filter interface
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use kestrel_common::prelude::*;
//!
//! let id: DriverId = AdcId::BatteryVoltage.into();
//! assert_eq!(id.index(ADC_COUNT), Some(0));
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod filter;
pub mod hal;
pub mod ids;
pub mod prelude;
pub mod types;
