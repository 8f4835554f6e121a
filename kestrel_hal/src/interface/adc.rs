//! ADC interface.

use super::CapabilityInterface;
use crate::capability::Adc;
use crate::registry::DriverRecord;
use kestrel_common::consts::ADC_COUNT;

pub type AdcInterface = CapabilityInterface<Adc, ADC_COUNT>;
pub type AdcRecord = DriverRecord<Adc>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{AdcDriver, Driver};
    use kestrel_common::error::{DriverError, DriverResult, HalError};
    use kestrel_common::ids::{AdcId, DriverId};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Divider {
        powered: AtomicBool,
    }

    impl Driver for Divider {
        fn name(&self) -> &str {
            "divider"
        }

        fn set_enabled(&self, enabled: bool) -> DriverResult<()> {
            self.powered.store(enabled, Ordering::SeqCst);
            Ok(())
        }
    }

    impl AdcDriver for Divider {
        fn read_voltage(&self) -> DriverResult<f32> {
            if self.powered.load(Ordering::SeqCst) {
                Ok(3.3)
            } else {
                Err(DriverError::NotEnabled)
            }
        }
    }

    static DIVIDER: Divider = Divider {
        powered: AtomicBool::new(false),
    };

    #[test]
    fn test_enable_read_disable() {
        let mut adc = AdcInterface::new();
        adc.add_driver(AdcRecord::new(AdcId::BatteryVoltage, &DIVIDER))
            .unwrap();
        adc.start();

        assert!(matches!(
            adc.read(AdcId::BatteryVoltage),
            Err(HalError::NotEnabled { .. })
        ));

        adc.set_enabled(AdcId::BatteryVoltage, true).unwrap();
        assert_eq!(adc.read(AdcId::BatteryVoltage), Ok(3.3));
        assert!(adc.is_enabled(AdcId::BatteryVoltage));

        adc.set_enabled(AdcId::BatteryVoltage, false).unwrap();
        assert!(matches!(
            adc.read(AdcId::BatteryVoltage),
            Err(HalError::NotEnabled { .. })
        ));
    }

    #[test]
    fn test_unbound_and_invalid_ids() {
        let adc = AdcInterface::new();
        assert!(matches!(
            adc.set_enabled(AdcId::Aux, true),
            Err(HalError::NotEnabled { .. })
        ));
        assert!(matches!(
            adc.read(DriverId::new(42)),
            Err(HalError::InvalidId { .. })
        ));
        assert!(!adc.is_enabled(DriverId::NONE));
        assert!(!adc.describe(AdcId::Aux).unwrap().bound);
    }
}
