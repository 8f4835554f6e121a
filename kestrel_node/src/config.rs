//! Node configuration.
//!
//! One TOML file: the `[shared]` table common to kestrel binaries, hub
//! timing, battery monitor thresholds and the simulated drivers to register.

use kestrel_common::config::{ConfigError, SharedConfig};
use kestrel_common::hal::config::{HalConfig, HubConfig};
use serde::{Deserialize, Serialize};

/// Battery monitor thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Below this voltage the status LED stays lit.
    pub low_battery_v: f32,
    /// Toggle the status LED every N battery samples while healthy.
    /// A monitor built with 0 never blinks; node files must use N > 0.
    pub heartbeat_every: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            low_battery_v: 10.5,
            heartbeat_every: 50,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub hal: HalConfig,
}

impl NodeConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// The first `ConfigError::ValidationError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.hub.validate()?;
        self.hal.validate()?;
        if self.monitor.heartbeat_every == 0 {
            return Err(ConfigError::ValidationError(
                "monitor.heartbeat_every must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_common::config::ConfigLoader;

    #[test]
    fn test_bundled_config_is_valid() {
        let config = NodeConfig::from_toml(include_str!("../config/node.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.shared.service_name, "kestrel-node-01");
        assert_eq!(config.hal.adc.len(), 3);
        assert!(!config.hal.adc[2].enabled);
        assert_eq!(config.hal.driver_count(), 9);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = NodeConfig::from_toml(
            r#"
[shared]
service_name = "bare"
"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.hub.cycle_time_ms, 10);
        assert_eq!(config.monitor.heartbeat_every, 50);
        assert_eq!(config.hal.driver_count(), 0);
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let mut config = NodeConfig::from_toml("[shared]\nservice_name = \"n\"\n").unwrap();
        config.monitor.heartbeat_every = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
