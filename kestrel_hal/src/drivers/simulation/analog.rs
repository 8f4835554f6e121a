//! Simulated ADC channel.

use super::channel::{SimChannel, channel_seed};
use crate::capability::{AdcDriver, Driver};
use kestrel_common::error::DriverResult;
use kestrel_common::hal::config::AnalogChannelConfig;
use kestrel_common::ids::Domain;
use parking_lot::Mutex;

/// ADC channel returning a nominal voltage plus noise.
pub struct SimAdc {
    name: String,
    nominal: Mutex<f32>,
    channel: SimChannel,
}

impl SimAdc {
    pub fn new(config: &AnalogChannelConfig) -> Self {
        Self {
            name: config.name.clone(),
            nominal: Mutex::new(config.value),
            channel: SimChannel::new(
                channel_seed(Domain::Adc, config.id),
                config.noise,
                config.fail_every,
            ),
        }
    }

    /// Move the nominal value, e.g. to simulate a draining battery.
    pub fn set_nominal(&self, volts: f32) {
        *self.nominal.lock() = volts;
    }

    pub fn reads(&self) -> u32 {
        self.channel.reads()
    }
}

impl Driver for SimAdc {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.channel.power(enabled);
        Ok(())
    }
}

impl AdcDriver for SimAdc {
    fn read_voltage(&self) -> DriverResult<f32> {
        self.channel.sample()?;
        Ok(*self.nominal.lock() + self.channel.jitter())
    }
}
