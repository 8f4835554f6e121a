//! Barometer interface.

use super::CapabilityInterface;
use crate::capability::Barometer;
use crate::registry::DriverRecord;
use kestrel_common::consts::BARO_COUNT;
use kestrel_common::error::HalResult;
use kestrel_common::ids::DriverId;

pub type BaroInterface = CapabilityInterface<Barometer, BARO_COUNT>;
pub type BaroRecord = DriverRecord<Barometer>;

impl BaroInterface {
    /// Pressure altitude of `id` relative to `reference_pa`.
    pub fn altitude_m(&self, id: impl Into<DriverId>, reference_pa: f32) -> HalResult<f32> {
        Ok(self.read(id)?.altitude_m(reference_pa))
    }
}
