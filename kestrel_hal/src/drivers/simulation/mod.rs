//! Simulation drivers.
//!
//! Software drivers for development and testing without physical hardware.
//! Every configured channel becomes one driver instance with deterministic
//! noise and optional periodic fault injection.

mod analog;
mod baro;
mod channel;
mod gpio;
mod inertial;

pub use analog::SimAdc;
pub use baro::SimBarometer;
pub use gpio::SimGpio;
pub use inertial::SimInertial;

use crate::global::HalBuilder;
use crate::interface::accel::AccelRecord;
use crate::interface::adc::AdcRecord;
use crate::interface::baro::BaroRecord;
use crate::interface::gpio::line_record;
use crate::interface::mag::MagRecord;
use kestrel_common::error::HalResult;
use kestrel_common::hal::config::HalConfig;
use kestrel_common::ids::{Domain, DriverId};
use std::sync::Arc;
use tracing::info;

/// Handles to the simulated drivers a builder was populated with.
#[derive(Default)]
pub struct SimulatedBoard {
    adc: Vec<(DriverId, Arc<SimAdc>)>,
    gpio: Vec<(DriverId, Arc<SimGpio>)>,
    registered: usize,
}

impl SimulatedBoard {
    /// Number of drivers registered.
    pub fn registered(&self) -> usize {
        self.registered
    }

    pub fn adc_channel(&self, id: impl Into<DriverId>) -> Option<&Arc<SimAdc>> {
        let id = id.into();
        self.adc.iter().find(|(i, _)| *i == id).map(|(_, d)| d)
    }

    pub fn gpio_line(&self, id: impl Into<DriverId>) -> Option<&Arc<SimGpio>> {
        let id = id.into();
        self.gpio.iter().find(|(i, _)| *i == id).map(|(_, d)| d)
    }
}

/// Register one simulated driver per configured channel and enable the ones
/// marked `enabled`.
///
/// # Errors
///
/// Fails with the first registration or enable error; ids are expected to be
/// validated by [`HalConfig::validate`] beforehand.
pub fn register(builder: &mut HalBuilder, config: &HalConfig) -> HalResult<SimulatedBoard> {
    let mut board = SimulatedBoard::default();

    for c in &config.adc {
        let driver = Arc::new(SimAdc::new(c));
        builder
            .adc()
            .add_driver(AdcRecord::shared(c.id, driver.clone()))?;
        board.adc.push((c.id, driver));
    }
    for c in &config.accelerometer {
        let driver = Arc::new(SimInertial::new(Domain::Accelerometer, c));
        builder.accel().add_driver(AccelRecord::shared(c.id, driver))?;
    }
    for c in &config.magnetometer {
        let driver = Arc::new(SimInertial::new(Domain::Magnetometer, c));
        builder.mag().add_driver(MagRecord::shared(c.id, driver))?;
    }
    for c in &config.barometer {
        let driver = Arc::new(SimBarometer::new(c));
        builder.baro().add_driver(BaroRecord::shared(c.id, driver))?;
    }
    for c in &config.gpio {
        let driver = Arc::new(SimGpio::new(c));
        builder.gpio().add_driver(line_record(c.id, driver.clone()))?;
        board.gpio.push((c.id, driver));
    }
    board.registered = config.driver_count();

    for c in config.adc.iter().filter(|c| c.enabled) {
        builder.adc().set_enabled(c.id, true)?;
    }
    for c in config.accelerometer.iter().filter(|c| c.enabled) {
        builder.accel().set_enabled(c.id, true)?;
    }
    for c in config.magnetometer.iter().filter(|c| c.enabled) {
        builder.mag().set_enabled(c.id, true)?;
    }
    for c in config.barometer.iter().filter(|c| c.enabled) {
        builder.baro().set_enabled(c.id, true)?;
    }
    for c in config.gpio.iter().filter(|c| c.enabled) {
        builder.gpio().set_enabled(c.id, true)?;
    }

    info!("Registered {} simulated drivers", board.registered);
    Ok(board)
}
