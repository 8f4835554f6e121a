//! Property tests for driver table membership.

use kestrel_common::error::{DriverResult, HalError};
use kestrel_common::ids::DriverId;
use kestrel_hal::capability::{AdcDriver, Driver};
use kestrel_hal::interface::adc::{AdcInterface, AdcRecord};
use proptest::prelude::*;

struct Constant;

impl Driver for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn set_enabled(&self, _enabled: bool) -> DriverResult<()> {
        Ok(())
    }
}

impl AdcDriver for Constant {
    fn read_voltage(&self) -> DriverResult<f32> {
        Ok(1.0)
    }
}

static CONSTANT: Constant = Constant;

proptest! {
    #[test]
    fn registered_ids_are_bound_others_unbound(ids in proptest::collection::vec(0i16..4, 0..8)) {
        let mut adc = AdcInterface::new();
        for &id in &ids {
            adc.add_driver(AdcRecord::new(id, &CONSTANT)).unwrap();
        }
        adc.start();

        for raw in 0i16..4 {
            let bound = adc.describe(raw).unwrap().bound;
            prop_assert_eq!(bound, ids.contains(&raw));
            if !bound {
                let is_not_enabled = matches!(adc.read(raw), Err(HalError::NotEnabled { .. }));
                prop_assert!(is_not_enabled);
            }
        }
    }

    #[test]
    fn out_of_range_ids_rejected(raw in prop_oneof![i16::MIN..0, 4i16..i16::MAX]) {
        let mut adc = AdcInterface::new();
        let rejected = matches!(
            adc.add_driver(AdcRecord::new(raw, &CONSTANT)),
            Err(HalError::IdOutOfRange { .. })
        );
        prop_assert!(rejected);
        let invalid = matches!(adc.read(DriverId::new(raw)), Err(HalError::InvalidId { .. }));
        prop_assert!(invalid);
        prop_assert_eq!(adc.bound_ids().count(), 0);
    }
}
