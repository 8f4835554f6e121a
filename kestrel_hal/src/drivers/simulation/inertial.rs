//! Simulated three-axis sensors.

use super::channel::{SimChannel, channel_seed};
use crate::capability::{AccelerometerDriver, Driver, MagnetometerDriver};
use kestrel_common::error::DriverResult;
use kestrel_common::hal::config::InertialChannelConfig;
use kestrel_common::ids::Domain;
use kestrel_common::types::Vector3;

/// Accelerometer or magnetometer with a fixed nominal vector.
///
/// The same type serves both domains; the domain only changes the noise seed
/// and which trait object the record stores.
pub struct SimInertial {
    name: String,
    nominal: Vector3,
    channel: SimChannel,
}

impl SimInertial {
    pub fn new(domain: Domain, config: &InertialChannelConfig) -> Self {
        Self {
            name: config.name.clone(),
            nominal: Vector3::from_array(config.value),
            channel: SimChannel::new(
                channel_seed(domain, config.id),
                config.noise,
                config.fail_every,
            ),
        }
    }

    fn sample(&self) -> DriverResult<Vector3> {
        self.channel.sample()?;
        Ok(Vector3::new(
            self.nominal.x + self.channel.jitter(),
            self.nominal.y + self.channel.jitter(),
            self.nominal.z + self.channel.jitter(),
        ))
    }
}

impl Driver for SimInertial {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.channel.power(enabled);
        Ok(())
    }
}

impl AccelerometerDriver for SimInertial {
    fn read_acceleration(&self) -> DriverResult<Vector3> {
        self.sample()
    }
}

impl MagnetometerDriver for SimInertial {
    fn read_field(&self) -> DriverResult<Vector3> {
        self.sample()
    }
}
