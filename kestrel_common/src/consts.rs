//! System-wide constants for the kestrel workspace.
//!
//! Single source of truth for table capacities and timing defaults.
//! Imported by all crates; limits are defined nowhere else.

/// Number of ADC channels (driver table capacity).
pub const ADC_COUNT: usize = 4;

/// Number of accelerometers.
pub const ACCEL_COUNT: usize = 2;

/// Number of magnetometers.
pub const MAG_COUNT: usize = 2;

/// Number of barometers.
pub const BARO_COUNT: usize = 1;

/// Number of GPIO lines.
pub const GPIO_COUNT: usize = 4;

/// Maximum number of live subscribers on a single topic.
pub const MAX_SUBSCRIBERS: usize = 16;

/// Default sensor hub cycle time in milliseconds (100 Hz).
pub const DEFAULT_CYCLE_TIME_MS: u32 = 10;

/// Default timeout for consumers waiting on a topic.
pub const DEFAULT_AWAIT_TIMEOUT_MS: u32 = 100;

/// Default timeout for service calls.
pub const DEFAULT_SERVICE_TIMEOUT_MS: u32 = 50;

/// Default node configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kestrel/node.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(ADC_COUNT > 0 && ADC_COUNT <= i16::MAX as usize);
        assert!(ACCEL_COUNT > 0);
        assert!(MAG_COUNT > 0);
        assert!(BARO_COUNT > 0);
        assert!(GPIO_COUNT > 0);
        assert!(MAX_SUBSCRIBERS > 0);
        assert!(DEFAULT_CYCLE_TIME_MS > 0);
    }

    #[test]
    fn await_timeout_covers_several_cycles() {
        assert!(DEFAULT_AWAIT_TIMEOUT_MS >= 2 * DEFAULT_CYCLE_TIME_MS);
    }
}
