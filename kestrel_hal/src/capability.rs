//! Driver traits and capability domains.
//!
//! A concrete driver implements [`Driver`] plus the trait of its domain
//! ([`AdcDriver`], [`AccelerometerDriver`], ...). Each domain is also a
//! zero-sized [`Capability`] marker that tells the generic driver table and
//! interface which trait object to store, which value a read produces and
//! which static driver fills empty slots.

use bitflags::bitflags;
use kestrel_common::error::{DriverError, DriverResult};
use kestrel_common::ids::{AccelId, AdcId, BaroId, Domain, DomainId, GpioId, MagId};
use kestrel_common::types::{BaroReading, PinDirection, PinLevel, Vector3};

bitflags! {
    /// Operations a registered driver supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Can be powered up and down.
        const ENABLE = 1 << 0;
        /// Produces readings.
        const READ = 1 << 1;
        /// Accepts output values.
        const WRITE = 1 << 2;
    }
}

/// Operations common to every driver.
///
/// Drivers are shared by reference after registration, so every method takes
/// `&self`; drivers keep mutable state behind their own locks or atomics.
pub trait Driver: Send + Sync {
    /// Human-readable name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Power the peripheral up or down.
    fn set_enabled(&self, enabled: bool) -> DriverResult<()>;
}

/// Analog input channel.
pub trait AdcDriver: Driver {
    /// Sampled voltage in volts.
    fn read_voltage(&self) -> DriverResult<f32>;
}

/// Three-axis accelerometer.
pub trait AccelerometerDriver: Driver {
    /// Specific force in m/s².
    fn read_acceleration(&self) -> DriverResult<Vector3>;
}

/// Three-axis magnetometer.
pub trait MagnetometerDriver: Driver {
    /// Field strength in µT.
    fn read_field(&self) -> DriverResult<Vector3>;
}

/// Pressure sensor.
pub trait BarometerDriver: Driver {
    fn read_pressure(&self) -> DriverResult<BaroReading>;
}

/// Digital I/O line.
pub trait GpioDriver: Driver {
    fn direction(&self) -> PinDirection;
    fn read_level(&self) -> DriverResult<PinLevel>;
    fn write_level(&self, level: PinLevel) -> DriverResult<()>;
}

/// A capability domain.
pub trait Capability: Send + Sync + 'static {
    /// Trait object stored in driver records.
    type Driver: ?Sized + Driver + 'static;
    /// Compile-time id enum of the domain.
    type Id: DomainId;
    /// Value produced by `read`.
    type Value: Clone + Send + 'static;

    const DOMAIN: Domain;
    /// Operations a record gets unless registered with fewer.
    const DEFAULT_CAPABILITIES: Capabilities;

    /// Driver placed in empty slots. Every operation reports `NotEnabled`.
    fn unbound() -> &'static Self::Driver;

    /// Dispatch a read.
    fn read(driver: &Self::Driver) -> DriverResult<Self::Value>;
}

/// A domain whose drivers accept writes.
pub trait WritableCapability: Capability {
    /// Dispatch a write.
    fn write(driver: &Self::Driver, value: Self::Value) -> DriverResult<()>;
}

/// Analog channels.
#[derive(Debug, Clone, Copy)]
pub struct Adc;
/// Accelerometers.
#[derive(Debug, Clone, Copy)]
pub struct Accelerometer;
/// Magnetometers.
#[derive(Debug, Clone, Copy)]
pub struct Magnetometer;
/// Barometers.
#[derive(Debug, Clone, Copy)]
pub struct Barometer;
/// GPIO lines.
#[derive(Debug, Clone, Copy)]
pub struct Gpio;

const SENSOR: Capabilities = Capabilities::ENABLE.union(Capabilities::READ);

impl Capability for Adc {
    type Driver = dyn AdcDriver;
    type Id = AdcId;
    type Value = f32;
    const DOMAIN: Domain = Domain::Adc;
    const DEFAULT_CAPABILITIES: Capabilities = SENSOR;

    fn unbound() -> &'static dyn AdcDriver {
        &UNBOUND
    }

    fn read(driver: &dyn AdcDriver) -> DriverResult<f32> {
        driver.read_voltage()
    }
}

impl Capability for Accelerometer {
    type Driver = dyn AccelerometerDriver;
    type Id = AccelId;
    type Value = Vector3;
    const DOMAIN: Domain = Domain::Accelerometer;
    const DEFAULT_CAPABILITIES: Capabilities = SENSOR;

    fn unbound() -> &'static dyn AccelerometerDriver {
        &UNBOUND
    }

    fn read(driver: &dyn AccelerometerDriver) -> DriverResult<Vector3> {
        driver.read_acceleration()
    }
}

impl Capability for Magnetometer {
    type Driver = dyn MagnetometerDriver;
    type Id = MagId;
    type Value = Vector3;
    const DOMAIN: Domain = Domain::Magnetometer;
    const DEFAULT_CAPABILITIES: Capabilities = SENSOR;

    fn unbound() -> &'static dyn MagnetometerDriver {
        &UNBOUND
    }

    fn read(driver: &dyn MagnetometerDriver) -> DriverResult<Vector3> {
        driver.read_field()
    }
}

impl Capability for Barometer {
    type Driver = dyn BarometerDriver;
    type Id = BaroId;
    type Value = BaroReading;
    const DOMAIN: Domain = Domain::Barometer;
    const DEFAULT_CAPABILITIES: Capabilities = SENSOR;

    fn unbound() -> &'static dyn BarometerDriver {
        &UNBOUND
    }

    fn read(driver: &dyn BarometerDriver) -> DriverResult<BaroReading> {
        driver.read_pressure()
    }
}

impl Capability for Gpio {
    type Driver = dyn GpioDriver;
    type Id = GpioId;
    type Value = PinLevel;
    const DOMAIN: Domain = Domain::Gpio;
    const DEFAULT_CAPABILITIES: Capabilities = Capabilities::all();

    fn unbound() -> &'static dyn GpioDriver {
        &UNBOUND
    }

    fn read(driver: &dyn GpioDriver) -> DriverResult<PinLevel> {
        driver.read_level()
    }
}

impl WritableCapability for Gpio {
    fn write(driver: &dyn GpioDriver, value: PinLevel) -> DriverResult<()> {
        driver.write_level(value)
    }
}

/// Occupant of every empty table slot.
#[derive(Debug)]
pub struct Unbound;

static UNBOUND: Unbound = Unbound;

impl Driver for Unbound {
    fn name(&self) -> &str {
        "unbound"
    }

    fn set_enabled(&self, _enabled: bool) -> DriverResult<()> {
        Err(DriverError::NotEnabled)
    }
}

impl AdcDriver for Unbound {
    fn read_voltage(&self) -> DriverResult<f32> {
        Err(DriverError::NotEnabled)
    }
}

impl AccelerometerDriver for Unbound {
    fn read_acceleration(&self) -> DriverResult<Vector3> {
        Err(DriverError::NotEnabled)
    }
}

impl MagnetometerDriver for Unbound {
    fn read_field(&self) -> DriverResult<Vector3> {
        Err(DriverError::NotEnabled)
    }
}

impl BarometerDriver for Unbound {
    fn read_pressure(&self) -> DriverResult<BaroReading> {
        Err(DriverError::NotEnabled)
    }
}

impl GpioDriver for Unbound {
    fn direction(&self) -> PinDirection {
        PinDirection::Input
    }

    fn read_level(&self) -> DriverResult<PinLevel> {
        Err(DriverError::NotEnabled)
    }

    fn write_level(&self, _level: PinLevel) -> DriverResult<()> {
        Err(DriverError::NotEnabled)
    }
}
