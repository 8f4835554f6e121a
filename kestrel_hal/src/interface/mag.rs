//! Magnetometer interface.

use super::CapabilityInterface;
use crate::capability::Magnetometer;
use crate::registry::DriverRecord;
use kestrel_common::consts::MAG_COUNT;

pub type MagInterface = CapabilityInterface<Magnetometer, MAG_COUNT>;
pub type MagRecord = DriverRecord<Magnetometer>;
