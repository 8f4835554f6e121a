//! Driver identities and capability domains.
//!
//! Every capability domain owns a dense id space starting at 0. Ids travel as
//! [`DriverId`], a small signed integer with a reserved [`DriverId::NONE`]
//! sentinel, so that out-of-range values coming from configuration can be
//! represented and rejected instead of being truncated. The per-domain enums
//! generated by [`driver_ids!`](crate::driver_ids) are the compile-time names
//! for those ids.

use crate::consts::{ACCEL_COUNT, ADC_COUNT, BARO_COUNT, GPIO_COUNT, MAG_COUNT};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::fmt;

/// Identity of a driver within one capability domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(i16);

impl DriverId {
    /// Reserved "no driver" sentinel. Never indexes a table.
    pub const NONE: Self = Self(-1);

    /// Wrap a raw id.
    pub const fn new(raw: i16) -> Self {
        Self(raw)
    }

    /// Id for a table slot index.
    pub const fn from_index(index: usize) -> Self {
        Self(index as i16)
    }

    /// Raw integer value.
    pub const fn raw(self) -> i16 {
        self.0
    }

    /// True for the sentinel (and any other negative value).
    pub const fn is_none(self) -> bool {
        self.0 < 0
    }

    /// Slot index in a table of `count` entries.
    ///
    /// Returns `None` for the sentinel and for ids `>= count`.
    pub const fn index(self, count: usize) -> Option<usize> {
        if self.0 < 0 || self.0 as usize >= count {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl Default for DriverId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<i16> for DriverId {
    fn from(raw: i16) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Peripheral category with its own id space and driver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Analog-to-digital converter channels.
    Adc,
    /// Three-axis accelerometers.
    Accelerometer,
    /// Three-axis magnetometers.
    Magnetometer,
    /// Pressure sensors.
    Barometer,
    /// Digital I/O lines.
    Gpio,
}

impl Domain {
    /// Every domain, in table order.
    pub const ALL: [Domain; 5] = [
        Domain::Adc,
        Domain::Accelerometer,
        Domain::Magnetometer,
        Domain::Barometer,
        Domain::Gpio,
    ];

    /// Lowercase name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Domain::Adc => "adc",
            Domain::Accelerometer => "accelerometer",
            Domain::Magnetometer => "magnetometer",
            Domain::Barometer => "barometer",
            Domain::Gpio => "gpio",
        }
    }

    /// Driver table capacity for this domain.
    pub const fn count(self) -> usize {
        match self {
            Domain::Adc => ADC_COUNT,
            Domain::Accelerometer => ACCEL_COUNT,
            Domain::Magnetometer => MAG_COUNT,
            Domain::Barometer => BARO_COUNT,
            Domain::Gpio => GPIO_COUNT,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile-time enumerated id belonging to one domain.
pub trait DomainId: Copy + Into<DriverId> + 'static {
    /// Domain this id space belongs to.
    const DOMAIN: Domain;
    /// Number of ids (and driver table slots).
    const COUNT: usize;

    /// All ids in slot order.
    fn all() -> &'static [Self];

    /// Stable snake_case label, unique across domains.
    fn label(self) -> &'static str;

    /// Slot index of this id.
    fn index(self) -> usize {
        let id: DriverId = self.into();
        id.raw() as usize
    }
}

/// Declare a dense per-domain id enum.
///
/// Generates the enum together with `COUNT`, [`DomainId`], `From<_> for
/// DriverId` and `TryFrom<DriverId>` (which hands the rejected id back).
#[macro_export]
macro_rules! driver_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $domain:path {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        #[repr(i16)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Number of ids in this domain.
            pub const COUNT: usize = [$($name::$variant),+].len();
        }

        impl $crate::ids::DomainId for $name {
            const DOMAIN: $crate::ids::Domain = $domain;
            const COUNT: usize = $name::COUNT;

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl ::core::convert::From<$name> for $crate::ids::DriverId {
            fn from(id: $name) -> Self {
                $crate::ids::DriverId::new(id as i16)
            }
        }

        impl ::core::convert::TryFrom<$crate::ids::DriverId> for $name {
            type Error = $crate::ids::DriverId;

            fn try_from(id: $crate::ids::DriverId) -> Result<Self, Self::Error> {
                match id.raw() {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(id),
                }
            }
        }
    };
}

driver_ids! {
    /// ADC channels.
    pub enum AdcId in Domain::Adc {
        /// Main battery voltage divider.
        BatteryVoltage = 0 => "battery_voltage",
        /// Battery current shunt.
        BatteryCurrent = 1 => "battery_current",
        /// On-board thermistor.
        BoardTemperature = 2 => "board_temperature",
        /// Auxiliary analog input.
        Aux = 3 => "adc_aux",
    }
}

driver_ids! {
    /// Accelerometers.
    pub enum AccelId in Domain::Accelerometer {
        /// Primary IMU accelerometer.
        Primary = 0 => "accel_primary",
        /// Redundant accelerometer.
        Secondary = 1 => "accel_secondary",
    }
}

driver_ids! {
    /// Magnetometers.
    pub enum MagId in Domain::Magnetometer {
        /// On-board compass.
        Primary = 0 => "mag_primary",
        /// External (mast-mounted) compass.
        External = 1 => "mag_external",
    }
}

driver_ids! {
    /// Barometers.
    pub enum BaroId in Domain::Barometer {
        /// On-board pressure sensor.
        Primary = 0 => "baro_primary",
    }
}

driver_ids! {
    /// GPIO lines.
    pub enum GpioId in Domain::Gpio {
        /// Status LED output.
        StatusLed = 0 => "status_led",
        /// Buzzer output.
        Buzzer = 1 => "buzzer",
        /// Arming switch input.
        ArmSwitch = 2 => "arm_switch",
        /// Peripheral power enable output.
        PowerEnable = 3 => "power_enable",
    }
}

const_assert_eq!(AdcId::COUNT, ADC_COUNT);
const_assert_eq!(AccelId::COUNT, ACCEL_COUNT);
const_assert_eq!(MagId::COUNT, MAG_COUNT);
const_assert_eq!(BaroId::COUNT, BARO_COUNT);
const_assert_eq!(GpioId::COUNT, GPIO_COUNT);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_never_indexes() {
        assert!(DriverId::NONE.is_none());
        assert_eq!(DriverId::NONE.index(ADC_COUNT), None);
        assert_eq!(DriverId::default(), DriverId::NONE);
    }

    #[test]
    fn index_bounds() {
        assert_eq!(DriverId::new(0).index(4), Some(0));
        assert_eq!(DriverId::new(3).index(4), Some(3));
        assert_eq!(DriverId::new(4).index(4), None);
        assert_eq!(DriverId::new(i16::MAX).index(4), None);
    }

    #[test]
    fn enum_conversion_roundtrip() {
        for id in AdcId::all() {
            let raw: DriverId = (*id).into();
            assert_eq!(AdcId::try_from(raw), Ok(*id));
            assert_eq!(id.index(), raw.raw() as usize);
        }
        assert_eq!(AdcId::try_from(DriverId::new(4)), Err(DriverId::new(4)));
        assert_eq!(GpioId::try_from(DriverId::NONE), Err(DriverId::NONE));
    }

    #[test]
    fn domain_counts_match_enums() {
        assert_eq!(Domain::Adc.count(), AdcId::COUNT);
        assert_eq!(Domain::Gpio.count(), GpioId::COUNT);
        assert_eq!(<BaroId as DomainId>::DOMAIN, Domain::Barometer);
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = AdcId::all().iter().map(|id| id.label()).collect();
        labels.extend(AccelId::all().iter().map(|id| id.label()));
        labels.extend(MagId::all().iter().map(|id| id.label()));
        labels.extend(BaroId::all().iter().map(|id| id.label()));
        labels.extend(GpioId::all().iter().map(|id| id.label()));
        let total = labels.len();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), total);
        assert_eq!(MagId::External.label(), "mag_external");
    }

    #[test]
    fn display() {
        assert_eq!(DriverId::NONE.to_string(), "none");
        assert_eq!(DriverId::new(2).to_string(), "2");
        assert_eq!(Domain::Magnetometer.to_string(), "magnetometer");
    }
}
