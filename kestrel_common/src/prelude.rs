//! Prelude module for common re-exports.
//!
//! ```rust
//! use kestrel_common::prelude::*;
//! ```

// ─── Identity ───────────────────────────────────────────────────────
pub use crate::ids::{AccelId, AdcId, BaroId, Domain, DomainId, DriverId, GpioId, MagId};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{DriverError, DriverResult, HalError, HalResult};

// ─── Samples ────────────────────────────────────────────────────────
pub use crate::types::{BaroReading, PinDirection, PinLevel, Vector3};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::hal::config::{HalConfig, HubConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    ACCEL_COUNT, ADC_COUNT, BARO_COUNT, GPIO_COUNT, MAG_COUNT, MAX_SUBSCRIBERS,
};

pub use crate::filter::{Filter, Passthrough};
