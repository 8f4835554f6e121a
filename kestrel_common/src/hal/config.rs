//! HAL configuration types.
//!
//! ```toml
//! [hub]
//! cycle_time_ms = 10
//!
//! [[hal.adc]]
//! id = 0
//! name = "battery_voltage"
//! value = 12.6
//! noise = 0.05
//!
//! [[hal.accelerometer]]
//! id = 0
//! name = "imu0"
//! value = [0.0, 0.0, -9.81]
//! ```

use crate::config::ConfigError;
use crate::consts::{
    DEFAULT_AWAIT_TIMEOUT_MS, DEFAULT_CYCLE_TIME_MS, DEFAULT_SERVICE_TIMEOUT_MS,
};
use crate::ids::{Domain, DriverId};
use crate::types::{PinDirection, PinLevel, SEA_LEVEL_PRESSURE_PA};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_true() -> bool {
    true
}

fn default_temperature_c() -> f32 {
    15.0
}

fn default_pressure_pa() -> f32 {
    SEA_LEVEL_PRESSURE_PA
}

/// Sensor hub timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Sampling period in milliseconds.
    pub cycle_time_ms: u32,
    /// Timeout consumers use when waiting on a topic.
    pub await_timeout_ms: u32,
    /// Timeout for service calls.
    pub service_timeout_ms: u32,
    /// Emit a status report every N cycles (0 disables reports).
    pub report_every: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            cycle_time_ms: DEFAULT_CYCLE_TIME_MS,
            await_timeout_ms: DEFAULT_AWAIT_TIMEOUT_MS,
            service_timeout_ms: DEFAULT_SERVICE_TIMEOUT_MS,
            report_every: 100,
        }
    }
}

impl HubConfig {
    /// Validate timing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_time_ms == 0 {
            return Err(ConfigError::ValidationError(
                "hub.cycle_time_ms must be > 0".to_string(),
            ));
        }
        if self.await_timeout_ms == 0 || self.service_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "hub timeouts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Simulated ADC channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalogChannelConfig {
    /// Channel id.
    pub id: DriverId,
    /// Human-readable name.
    pub name: String,
    /// Nominal value in volts.
    pub value: f32,
    /// Peak noise amplitude added to each reading.
    #[serde(default)]
    pub noise: f32,
    /// Enable at boot.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inject a communication failure every N reads (0 = never).
    #[serde(default)]
    pub fail_every: u32,
}

/// Simulated accelerometer or magnetometer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InertialChannelConfig {
    /// Sensor id.
    pub id: DriverId,
    /// Human-readable name.
    pub name: String,
    /// Nominal `[x, y, z]` reading.
    pub value: [f32; 3],
    /// Peak noise amplitude per axis.
    #[serde(default)]
    pub noise: f32,
    /// Enable at boot.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inject a communication failure every N reads (0 = never).
    #[serde(default)]
    pub fail_every: u32,
}

/// Simulated barometer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaroChannelConfig {
    /// Sensor id.
    pub id: DriverId,
    /// Human-readable name.
    pub name: String,
    /// Nominal pressure in pascals.
    #[serde(default = "default_pressure_pa")]
    pub pressure_pa: f32,
    /// Nominal temperature in °C.
    #[serde(default = "default_temperature_c")]
    pub temperature_c: f32,
    /// Peak pressure noise in pascals.
    #[serde(default)]
    pub noise: f32,
    /// Enable at boot.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inject a communication failure every N reads (0 = never).
    #[serde(default)]
    pub fail_every: u32,
}

/// Simulated GPIO line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioPinConfig {
    /// Line id.
    pub id: DriverId,
    /// Human-readable name.
    pub name: String,
    /// Line direction.
    #[serde(default)]
    pub direction: PinDirection,
    /// Level at boot.
    #[serde(default)]
    pub initial: PinLevel,
    /// Enable at boot.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Drivers registered at boot, per capability domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    /// ADC channels.
    pub adc: Vec<AnalogChannelConfig>,
    /// Accelerometers.
    pub accelerometer: Vec<InertialChannelConfig>,
    /// Magnetometers.
    pub magnetometer: Vec<InertialChannelConfig>,
    /// Barometers.
    pub barometer: Vec<BaroChannelConfig>,
    /// GPIO lines.
    pub gpio: Vec<GpioPinConfig>,
}

impl HalConfig {
    /// Validate ids and noise figures.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - an id is the sentinel or outside its domain
    /// - two entries of one domain share an id
    /// - a noise amplitude is negative or not finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_entries(
            Domain::Adc,
            self.adc.iter().map(|c| (c.id, c.name.as_str(), c.noise)),
        )?;
        check_entries(
            Domain::Accelerometer,
            self.accelerometer
                .iter()
                .map(|c| (c.id, c.name.as_str(), c.noise)),
        )?;
        check_entries(
            Domain::Magnetometer,
            self.magnetometer
                .iter()
                .map(|c| (c.id, c.name.as_str(), c.noise)),
        )?;
        check_entries(
            Domain::Barometer,
            self.barometer
                .iter()
                .map(|c| (c.id, c.name.as_str(), c.noise)),
        )?;
        check_entries(
            Domain::Gpio,
            self.gpio.iter().map(|c| (c.id, c.name.as_str(), 0.0)),
        )?;
        Ok(())
    }

    /// Total number of configured drivers.
    pub fn driver_count(&self) -> usize {
        self.adc.len()
            + self.accelerometer.len()
            + self.magnetometer.len()
            + self.barometer.len()
            + self.gpio.len()
    }
}

fn check_entries<'a>(
    domain: Domain,
    entries: impl Iterator<Item = (DriverId, &'a str, f32)>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (id, name, noise) in entries {
        if id.index(domain.count()).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "{domain} '{name}': id {id} outside 0..{}",
                domain.count()
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "{domain} '{name}': duplicate id {id}"
            )));
        }
        if !noise.is_finite() || noise < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{domain} '{name}': invalid noise {noise}"
            )));
        }
    }
    Ok(())
}
