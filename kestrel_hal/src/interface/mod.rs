//! Capability interfaces.
//!
//! The stable API callers use: "read the value of id X". An interface owns
//! its domain's [`DriverTable`], checks the record before dispatching and
//! translates driver failures into [`HalError`] with domain and id attached.
//!
//! Reads of a disabled or unbound id return `NotEnabled` without touching the
//! driver. Only the addressed driver is called.

pub mod accel;
pub mod adc;
pub mod baro;
pub mod gpio;
pub mod mag;

use crate::capability::{Capabilities, Capability, Driver, WritableCapability};
use crate::registry::{DriverRecord, DriverTable, Phase};
use kestrel_common::error::{HalError, HalResult};
use kestrel_common::ids::{Domain, DriverId};
use serde::Serialize;
use tracing::{debug, trace};

/// Diagnostic snapshot of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverInfo {
    pub domain: Domain,
    pub id: DriverId,
    pub name: String,
    pub bound: bool,
    pub enabled: bool,
    pub readable: bool,
    pub writable: bool,
}

/// Public API of one capability domain.
pub struct CapabilityInterface<C: Capability, const N: usize> {
    table: DriverTable<C, N>,
}

impl<C: Capability, const N: usize> CapabilityInterface<C, N> {
    pub fn new() -> Self {
        Self {
            table: DriverTable::new(),
        }
    }

    /// Unbind every driver and reopen registration.
    pub fn init(&mut self) {
        self.table.reset();
        debug!("{} interface initialized ({} slots)", C::DOMAIN, N);
    }

    /// Register one driver.
    ///
    /// # Errors
    ///
    /// `IdOutOfRange` or `RegistrationClosed`, see [`DriverTable::register`].
    pub fn add_driver(&mut self, record: DriverRecord<C>) -> HalResult<()> {
        self.table.register(record)
    }

    /// Register several drivers, or none if any id is out of range.
    pub fn add_drivers(&mut self, records: Vec<DriverRecord<C>>) -> HalResult<usize> {
        self.table.register_all(records)
    }

    /// Freeze registration.
    pub fn start(&mut self) {
        self.table.start();
    }

    pub fn phase(&self) -> Phase {
        self.table.phase()
    }

    fn bound_record(&self, id: DriverId) -> HalResult<&DriverRecord<C>> {
        let record = self.table.lookup(id)?;
        if !record.is_bound() {
            return Err(HalError::NotEnabled {
                domain: C::DOMAIN,
                id,
            });
        }
        Ok(record)
    }

    fn require(
        record: &DriverRecord<C>,
        capability: Capabilities,
        operation: &'static str,
    ) -> HalResult<()> {
        if record.capabilities().contains(capability) {
            Ok(())
        } else {
            Err(HalError::Unsupported {
                domain: C::DOMAIN,
                id: record.id(),
                operation,
            })
        }
    }

    /// Power a driver up or down.
    ///
    /// # Errors
    ///
    /// - `InvalidId` for ids outside the domain
    /// - `NotEnabled` for an unbound slot
    /// - `Unsupported` if the record lacks `ENABLE`
    /// - `Communication` if the driver fails; the enable flag is unchanged
    pub fn set_enabled(&self, id: impl Into<DriverId>, enabled: bool) -> HalResult<()> {
        let id = id.into();
        let record = self.bound_record(id)?;
        Self::require(record, Capabilities::ENABLE, "enable")?;
        record
            .driver()
            .set_enabled(enabled)
            .map_err(|e| HalError::from_driver(C::DOMAIN, id, e))?;
        record.set_enabled_flag(enabled);
        debug!(
            "{} {} '{}' {}",
            C::DOMAIN,
            id,
            record.name(),
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Read the current value of `id`.
    ///
    /// # Errors
    ///
    /// - `InvalidId` for ids outside the domain
    /// - `NotEnabled` if unbound or not enabled
    /// - `Unsupported` if the record lacks `READ`
    /// - `Communication` if the driver fails
    pub fn read(&self, id: impl Into<DriverId>) -> HalResult<C::Value> {
        let id = id.into();
        let record = self.enabled_record(id)?;
        Self::require(record, Capabilities::READ, "read")?;
        let value =
            C::read(record.driver()).map_err(|e| HalError::from_driver(C::DOMAIN, id, e))?;
        trace!("{} {} read", C::DOMAIN, id);
        Ok(value)
    }

    fn enabled_record(&self, id: DriverId) -> HalResult<&DriverRecord<C>> {
        let record = self.table.lookup(id)?;
        if !record.is_bound() || !record.is_enabled() {
            return Err(HalError::NotEnabled {
                domain: C::DOMAIN,
                id,
            });
        }
        Ok(record)
    }

    /// False for unbound, disabled and out-of-range ids.
    pub fn is_enabled(&self, id: impl Into<DriverId>) -> bool {
        self.table
            .lookup(id.into())
            .is_ok_and(|r| r.is_bound() && r.is_enabled())
    }

    /// Diagnostic snapshot of a slot.
    ///
    /// # Errors
    ///
    /// `InvalidId` for ids outside the domain.
    pub fn describe(&self, id: impl Into<DriverId>) -> HalResult<DriverInfo> {
        let record = self.table.lookup(id.into())?;
        Ok(DriverInfo {
            domain: C::DOMAIN,
            id: record.id(),
            name: record.name().to_string(),
            bound: record.is_bound(),
            enabled: record.is_enabled(),
            readable: record.capabilities().contains(Capabilities::READ),
            writable: record.capabilities().contains(Capabilities::WRITE),
        })
    }

    /// Snapshots of every bound slot.
    pub fn describe_all(&self) -> Vec<DriverInfo> {
        self.bound_ids()
            .filter_map(|id| self.describe(id).ok())
            .collect()
    }

    /// Ids with a registered driver.
    pub fn bound_ids(&self) -> impl Iterator<Item = DriverId> + '_ {
        self.table.bound_ids()
    }

    /// Ids currently enabled.
    pub fn enabled_ids(&self) -> impl Iterator<Item = DriverId> + '_ {
        self.table
            .records()
            .filter(|r| r.is_bound() && r.is_enabled())
            .map(|r| r.id())
    }

    pub fn table(&self) -> &DriverTable<C, N> {
        &self.table
    }
}

impl<C: WritableCapability, const N: usize> CapabilityInterface<C, N> {
    /// Drive an output.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), with `Unsupported` if the record lacks `WRITE`.
    pub fn write(&self, id: impl Into<DriverId>, value: C::Value) -> HalResult<()> {
        let id = id.into();
        let record = self.enabled_record(id)?;
        Self::require(record, Capabilities::WRITE, "write")?;
        C::write(record.driver(), value).map_err(|e| HalError::from_driver(C::DOMAIN, id, e))?;
        trace!("{} {} written", C::DOMAIN, id);
        Ok(())
    }
}

impl<C: Capability, const N: usize> Default for CapabilityInterface<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
