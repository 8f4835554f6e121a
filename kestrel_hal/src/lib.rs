//! # Kestrel HAL
//!
//! Driver dispatch for microcontroller peripherals.
//!
//! # Module Structure
//!
//! - [`capability`] - driver traits and capability domain markers
//! - [`registry`] - fixed-capacity driver tables with the registration phase
//! - [`interface`] - per-domain public API (`read`, `write`, `set_enabled`)
//! - [`drivers`] - driver implementations (simulation)
//! - [`global`] - builder and process-wide installation
//! - [`hub`] - periodic sampler publishing readings on topics
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         kestrel_hal                              │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │ SensorHub   │───►│  Capability  │───►│  DriverTable<C, N>  │  │
//! │  │ (sampler)   │    │  Interface   │    │  [DriverRecord; N]  │  │
//! │  └──────┬──────┘    └──────────────┘    └──────────┬──────────┘  │
//! │         │ publish                                  │ dyn         │
//! │         ▼                                          ▼             │
//! │  ┌─────────────┐                        ┌─────────────────────┐  │
//! │  │ kestrel_msg │                        │ AdcDriver, ...      │  │
//! │  │ topics      │                        │ (trait objects)     │  │
//! │  └─────────────┘                        └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use kestrel_common::error::{DriverResult, HalError};
//! use kestrel_common::ids::AdcId;
//! use kestrel_hal::capability::{AdcDriver, Driver};
//! use kestrel_hal::interface::adc::AdcRecord;
//! use kestrel_hal::HalBuilder;
//!
//! struct Reference;
//!
//! impl Driver for Reference {
//!     fn name(&self) -> &str { "vref" }
//!     fn set_enabled(&self, _enabled: bool) -> DriverResult<()> { Ok(()) }
//! }
//!
//! impl AdcDriver for Reference {
//!     fn read_voltage(&self) -> DriverResult<f32> { Ok(3.3) }
//! }
//!
//! static VREF: Reference = Reference;
//!
//! let mut builder = HalBuilder::new();
//! builder.adc().add_driver(AdcRecord::new(AdcId::Aux, &VREF)).unwrap();
//! let hal = builder.build();
//!
//! assert!(matches!(hal.adc().read(AdcId::Aux), Err(HalError::NotEnabled { .. })));
//! hal.adc().set_enabled(AdcId::Aux, true).unwrap();
//! assert_eq!(hal.adc().read(AdcId::Aux), Ok(3.3));
//! ```

pub mod capability;
pub mod drivers;
pub mod global;
pub mod hub;
pub mod interface;
pub mod registry;

// Re-export key types for convenience
pub use crate::global::{Hal, HalBuilder, hal};
pub use crate::hub::{HubStats, HubStatus, SensorHub};
pub use crate::registry::{DriverRecord, DriverTable, Phase};

pub mod prelude {
    pub use crate::capability::{
        AccelerometerDriver, AdcDriver, BarometerDriver, Capabilities, Driver, GpioDriver,
        MagnetometerDriver,
    };
    pub use crate::interface::DriverInfo;
    pub use crate::interface::accel::{AccelInterface, AccelRecord};
    pub use crate::interface::adc::{AdcInterface, AdcRecord};
    pub use crate::interface::baro::{BaroInterface, BaroRecord};
    pub use crate::interface::gpio::{GpioInterface, GpioRecord};
    pub use crate::interface::mag::{MagInterface, MagRecord};
    pub use crate::{Hal, HalBuilder, Phase, SensorHub, hal};
}
