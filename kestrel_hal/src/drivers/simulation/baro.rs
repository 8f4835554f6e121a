//! Simulated barometer.

use super::channel::{SimChannel, channel_seed};
use crate::capability::{BarometerDriver, Driver};
use kestrel_common::error::DriverResult;
use kestrel_common::hal::config::BaroChannelConfig;
use kestrel_common::ids::Domain;
use kestrel_common::types::BaroReading;

/// Pressure sensor at a fixed nominal altitude. Noise applies to pressure only.
pub struct SimBarometer {
    name: String,
    nominal: BaroReading,
    channel: SimChannel,
}

impl SimBarometer {
    pub fn new(config: &BaroChannelConfig) -> Self {
        Self {
            name: config.name.clone(),
            nominal: BaroReading {
                pressure_pa: config.pressure_pa,
                temperature_c: config.temperature_c,
            },
            channel: SimChannel::new(
                channel_seed(Domain::Barometer, config.id),
                config.noise,
                config.fail_every,
            ),
        }
    }
}

impl Driver for SimBarometer {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.channel.power(enabled);
        Ok(())
    }
}

impl BarometerDriver for SimBarometer {
    fn read_pressure(&self) -> DriverResult<BaroReading> {
        self.channel.sample()?;
        Ok(BaroReading {
            pressure_pa: self.nominal.pressure_pa + self.channel.jitter(),
            temperature_c: self.nominal.temperature_c,
        })
    }
}
