//! Canonical sample payloads.
//!
//! One schema per sensor class. Drivers convert their register formats into
//! these types; topics carry them unchanged.
//!
//! | Domain | Payload | Unit |
//! |--------|---------|------|
//! | ADC | `f32` | volts |
//! | Accelerometer | [`Vector3`] | m/s² |
//! | Magnetometer | [`Vector3`] | µT |
//! | Barometer | [`BaroReading`] | Pa, °C |
//! | GPIO | [`PinLevel`] | - |

use serde::{Deserialize, Serialize};

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Sea-level standard pressure in pascals.
pub const SEA_LEVEL_PRESSURE_PA: f32 = 101_325.0;

/// Three-axis vector in the body frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X axis (forward)
    pub x: f32,
    /// Y axis (right)
    pub y: f32,
    /// Z axis (down)
    pub z: f32,
}

impl Vector3 {
    /// All components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from an `[x, y, z]` array.
    pub const fn from_array(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Euclidean length.
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise scale.
    pub fn scaled(&self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl From<[f32; 3]> for Vector3 {
    fn from(v: [f32; 3]) -> Self {
        Self::from_array(v)
    }
}

/// Barometer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaroReading {
    /// Static pressure in pascals
    pub pressure_pa: f32,
    /// Die temperature in degrees Celsius
    pub temperature_c: f32,
}

impl BaroReading {
    /// Pressure altitude relative to `reference_pa` (international barometric formula).
    pub fn altitude_m(&self, reference_pa: f32) -> f32 {
        44_330.0 * (1.0 - (self.pressure_pa / reference_pa).powf(1.0 / 5.255))
    }
}

impl Default for BaroReading {
    fn default() -> Self {
        Self {
            pressure_pa: SEA_LEVEL_PRESSURE_PA,
            temperature_c: 15.0,
        }
    }
}

/// Logic level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    /// Driven or read low.
    #[default]
    Low,
    /// Driven or read high.
    High,
}

impl PinLevel {
    /// True for [`PinLevel::High`].
    pub const fn is_high(self) -> bool {
        matches!(self, PinLevel::High)
    }

    /// Opposite level.
    pub const fn toggled(self) -> Self {
        match self {
            PinLevel::Low => PinLevel::High,
            PinLevel::High => PinLevel::Low,
        }
    }
}

impl From<bool> for PinLevel {
    fn from(high: bool) -> Self {
        if high { PinLevel::High } else { PinLevel::Low }
    }
}

/// Direction of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    /// Line is sampled.
    #[default]
    Input,
    /// Line is driven.
    Output,
}
