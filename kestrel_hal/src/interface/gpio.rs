//! GPIO interface.
//!
//! The one writable domain. Input lines are registered without `WRITE`, so
//! writes to them fail with `Unsupported` before reaching the driver.

use super::CapabilityInterface;
use crate::capability::{Capabilities, Gpio, GpioDriver};
use crate::registry::DriverRecord;
use kestrel_common::consts::GPIO_COUNT;
use kestrel_common::error::HalResult;
use kestrel_common::ids::DriverId;
use kestrel_common::types::{PinDirection, PinLevel};
use std::sync::Arc;

pub type GpioInterface = CapabilityInterface<Gpio, GPIO_COUNT>;
pub type GpioRecord = DriverRecord<Gpio>;

/// Record for a runtime line with capabilities matching its direction.
pub fn line_record(id: impl Into<DriverId>, driver: Arc<dyn GpioDriver>) -> GpioRecord {
    let capabilities = match driver.direction() {
        PinDirection::Input => Capabilities::ENABLE | Capabilities::READ,
        PinDirection::Output => Capabilities::all(),
    };
    GpioRecord::shared(id, driver).with_capabilities(capabilities)
}

impl GpioInterface {
    /// Invert an output and return the new level.
    pub fn toggle(&self, id: impl Into<DriverId>) -> HalResult<PinLevel> {
        let id = id.into();
        let level = self.read(id)?.toggled();
        self.write(id, level)?;
        Ok(level)
    }
}
