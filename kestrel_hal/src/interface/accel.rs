//! Accelerometer interface.

use super::CapabilityInterface;
use crate::capability::Accelerometer;
use crate::registry::DriverRecord;
use kestrel_common::consts::ACCEL_COUNT;

pub type AccelInterface = CapabilityInterface<Accelerometer, ACCEL_COUNT>;
pub type AccelRecord = DriverRecord<Accelerometer>;
