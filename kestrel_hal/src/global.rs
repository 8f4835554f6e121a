//! Process-wide HAL.
//!
//! Registration happens on a [`HalBuilder`] owned by the boot code. Building
//! starts every interface, which closes registration; installing publishes the
//! result behind a `OnceLock` so that any thread can reach it with [`hal`].
//! Code that does not need the process-wide instance (tests, benches) keeps
//! the [`Hal`] returned by [`HalBuilder::build`] instead.

use crate::interface::DriverInfo;
use crate::interface::accel::AccelInterface;
use crate::interface::adc::AdcInterface;
use crate::interface::baro::BaroInterface;
use crate::interface::gpio::GpioInterface;
use crate::interface::mag::MagInterface;
use crate::registry::Phase;
use kestrel_common::error::{HalError, HalResult};
use std::sync::OnceLock;
use tracing::info;

static HAL: OnceLock<Hal> = OnceLock::new();

/// Interfaces in the registering phase.
#[derive(Default)]
pub struct HalBuilder {
    adc: AdcInterface,
    accel: AccelInterface,
    mag: MagInterface,
    baro: BaroInterface,
    gpio: GpioInterface,
}

impl HalBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adc(&mut self) -> &mut AdcInterface {
        &mut self.adc
    }

    pub fn accel(&mut self) -> &mut AccelInterface {
        &mut self.accel
    }

    pub fn mag(&mut self) -> &mut MagInterface {
        &mut self.mag
    }

    pub fn baro(&mut self) -> &mut BaroInterface {
        &mut self.baro
    }

    pub fn gpio(&mut self) -> &mut GpioInterface {
        &mut self.gpio
    }

    /// Close registration on every interface.
    pub fn build(mut self) -> Hal {
        self.adc.start();
        self.accel.start();
        self.mag.start();
        self.baro.start();
        self.gpio.start();
        let hal = Hal {
            adc: self.adc,
            accel: self.accel,
            mag: self.mag,
            baro: self.baro,
            gpio: self.gpio,
        };
        info!("HAL running with {} bound drivers", hal.bound_count());
        hal
    }

    /// Build and publish as the process-wide HAL.
    ///
    /// # Errors
    ///
    /// `AlreadyInstalled` if a HAL was installed before; the new one is dropped.
    pub fn install(self) -> HalResult<&'static Hal> {
        HAL.set(self.build())
            .map_err(|_| HalError::AlreadyInstalled)?;
        hal()
    }
}

/// Running HAL: every domain's capability interface.
pub struct Hal {
    adc: AdcInterface,
    accel: AccelInterface,
    mag: MagInterface,
    baro: BaroInterface,
    gpio: GpioInterface,
}

impl Hal {
    pub fn adc(&self) -> &AdcInterface {
        &self.adc
    }

    pub fn accel(&self) -> &AccelInterface {
        &self.accel
    }

    pub fn mag(&self) -> &MagInterface {
        &self.mag
    }

    pub fn baro(&self) -> &BaroInterface {
        &self.baro
    }

    pub fn gpio(&self) -> &GpioInterface {
        &self.gpio
    }

    pub fn phase(&self) -> Phase {
        self.adc.phase()
    }

    /// Drivers bound across all domains.
    pub fn bound_count(&self) -> usize {
        self.adc.table().bound_count()
            + self.accel.table().bound_count()
            + self.mag.table().bound_count()
            + self.baro.table().bound_count()
            + self.gpio.table().bound_count()
    }

    /// Diagnostic snapshot of every bound driver.
    pub fn describe_all(&self) -> Vec<DriverInfo> {
        let mut all = self.adc.describe_all();
        all.extend(self.accel.describe_all());
        all.extend(self.mag.describe_all());
        all.extend(self.baro.describe_all());
        all.extend(self.gpio.describe_all());
        all
    }
}

/// The installed HAL.
///
/// # Errors
///
/// `NotInstalled` before [`HalBuilder::install`].
pub fn hal() -> HalResult<&'static Hal> {
    HAL.get().ok_or(HalError::NotInstalled)
}
