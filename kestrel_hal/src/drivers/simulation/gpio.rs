//! Simulated GPIO line.

use crate::capability::{Driver, GpioDriver};
use kestrel_common::error::{DriverError, DriverResult};
use kestrel_common::hal::config::GpioPinConfig;
use kestrel_common::types::{PinDirection, PinLevel};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Digital line holding its level in memory.
pub struct SimGpio {
    name: String,
    direction: PinDirection,
    level: AtomicBool,
    enabled: AtomicBool,
}

impl SimGpio {
    pub fn new(config: &GpioPinConfig) -> Self {
        Self {
            name: config.name.clone(),
            direction: config.direction,
            level: AtomicBool::new(config.initial.is_high()),
            enabled: AtomicBool::new(false),
        }
    }

    /// Drive an input line from outside, as the wiring would.
    pub fn inject(&self, level: PinLevel) {
        self.level.store(level.is_high(), Ordering::Release);
    }

    fn check_enabled(&self) -> DriverResult<()> {
        if self.enabled.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DriverError::NotEnabled)
        }
    }
}

impl Driver for SimGpio {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.enabled.store(enabled, Ordering::Release);
        Ok(())
    }
}

impl GpioDriver for SimGpio {
    fn direction(&self) -> PinDirection {
        self.direction
    }

    fn read_level(&self) -> DriverResult<PinLevel> {
        self.check_enabled()?;
        Ok(PinLevel::from(self.level.load(Ordering::Acquire)))
    }

    fn write_level(&self, level: PinLevel) -> DriverResult<()> {
        self.check_enabled()?;
        if self.direction == PinDirection::Input {
            return Err(DriverError::Unsupported);
        }
        self.level.store(level.is_high(), Ordering::Release);
        trace!("gpio '{}' -> {:?}", self.name, level);
        Ok(())
    }
}
