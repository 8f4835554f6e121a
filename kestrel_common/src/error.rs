//! HAL error taxonomy.
//!
//! Two layers:
//! - [`DriverError`] - what a concrete driver reports about its own hardware
//! - [`HalError`] - what the registry and capability interfaces return, with the
//!   domain and id of the addressed peripheral attached
//!
//! Nothing in the HAL panics or aborts; every operation returns one of these.

use crate::ids::{Domain, DriverId};
use thiserror::Error;

/// Error reported by a driver implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Bus transfer (SPI/I2C/UART) failed
    #[error("bus transfer failed: {0}")]
    Bus(String),

    /// Device did not answer
    #[error("device did not respond")]
    NoResponse,

    /// Device answered with data that failed validation
    #[error("device returned invalid data")]
    InvalidData,

    /// Driver is powered down or was never enabled
    #[error("driver not enabled")]
    NotEnabled,

    /// Driver does not implement the requested operation
    #[error("operation not supported")]
    Unsupported,
}

/// Error type for registry and capability interface operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Id outside the declared domain (programming error)
    #[error("{domain} id {id} is outside the declared range")]
    InvalidId {
        /// Addressed domain
        domain: Domain,
        /// Offending id
        id: DriverId,
    },

    /// Registration with the sentinel id or an id past the table end
    #[error("{domain} id {id} cannot be registered (table holds {count} slots)")]
    IdOutOfRange {
        /// Addressed domain
        domain: Domain,
        /// Offending id
        id: DriverId,
        /// Table capacity
        count: usize,
    },

    /// Driver unbound or disabled (recoverable by enabling)
    #[error("{domain} driver {id} is not enabled")]
    NotEnabled {
        /// Addressed domain
        domain: Domain,
        /// Addressed id
        id: DriverId,
    },

    /// Backend I/O failure (caller may retry)
    #[error("{domain} driver {id} communication error: {reason}")]
    Communication {
        /// Addressed domain
        domain: Domain,
        /// Addressed id
        id: DriverId,
        /// Driver-provided description
        reason: String,
    },

    /// Driver does not provide the requested capability
    #[error("{domain} driver {id} does not support {operation}")]
    Unsupported {
        /// Addressed domain
        domain: Domain,
        /// Addressed id
        id: DriverId,
        /// Operation name
        operation: &'static str,
    },

    /// Registration attempted after the table entered the running phase
    #[error("{domain} registration is closed")]
    RegistrationClosed {
        /// Addressed domain
        domain: Domain,
    },

    /// Process-wide HAL accessed before installation
    #[error("HAL has not been installed")]
    NotInstalled,

    /// Process-wide HAL installed twice
    #[error("HAL is already installed")]
    AlreadyInstalled,
}

impl HalError {
    /// Translate a driver failure into the shared taxonomy.
    pub fn from_driver(domain: Domain, id: DriverId, err: DriverError) -> Self {
        match err {
            DriverError::NotEnabled => HalError::NotEnabled { domain, id },
            DriverError::Unsupported => HalError::Unsupported {
                domain,
                id,
                operation: "request",
            },
            other => HalError::Communication {
                domain,
                id,
                reason: other.to_string(),
            },
        }
    }

    /// True for errors a caller may clear by retrying the same call.
    pub fn is_transient(&self) -> bool {
        matches!(self, HalError::Communication { .. })
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;

/// Result type for driver implementations.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_error_display() {
        let err = HalError::NotEnabled {
            domain: Domain::Adc,
            id: DriverId::new(0),
        };
        assert_eq!(err.to_string(), "adc driver 0 is not enabled");

        let err = HalError::IdOutOfRange {
            domain: Domain::Gpio,
            id: DriverId::NONE,
            count: 4,
        };
        assert!(err.to_string().contains("gpio id none"));
    }

    #[test]
    fn test_driver_error_mapping() {
        let id = DriverId::new(1);
        assert_eq!(
            HalError::from_driver(Domain::Barometer, id, DriverError::NotEnabled),
            HalError::NotEnabled {
                domain: Domain::Barometer,
                id
            }
        );

        let err = HalError::from_driver(Domain::Barometer, id, DriverError::Bus("nak".into()));
        assert!(err.is_transient());
        assert!(err.to_string().contains("nak"));

        let err = HalError::from_driver(Domain::Adc, id, DriverError::Unsupported);
        assert!(matches!(err, HalError::Unsupported { .. }));
        assert!(!err.is_transient());
    }
}
