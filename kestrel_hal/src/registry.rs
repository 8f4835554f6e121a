//! Fixed-capacity driver tables.
//!
//! A [`DriverTable`] holds exactly `N` records, one per id of its domain,
//! indexed by id. Empty slots hold the domain's static unbound driver, so a
//! lookup of any valid id always yields a record. Registration never
//! allocates; it overwrites the slot at the record's id (last writer wins).
//!
//! Tables start in [`Phase::Registering`]. After [`DriverTable::start`] the
//! set of records is frozen and further registration fails with
//! `RegistrationClosed`; per-record enable flags stay mutable.

use crate::capability::{Capabilities, Capability, Driver};
use kestrel_common::error::{HalError, HalResult};
use kestrel_common::ids::{DomainId, DriverId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Registration lifecycle of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Registering,
    Running,
}

/// Reference to a driver owned elsewhere.
pub enum DriverRef<D: ?Sized + 'static> {
    /// Driver with static storage (typical on bare metal).
    Static(&'static D),
    /// Driver constructed at runtime.
    Shared(Arc<D>),
}

impl<D: ?Sized + 'static> Deref for DriverRef<D> {
    type Target = D;

    fn deref(&self) -> &D {
        match self {
            DriverRef::Static(driver) => driver,
            DriverRef::Shared(driver) => driver,
        }
    }
}

impl<D: ?Sized + 'static> Clone for DriverRef<D> {
    fn clone(&self) -> Self {
        match self {
            DriverRef::Static(driver) => DriverRef::Static(*driver),
            DriverRef::Shared(driver) => DriverRef::Shared(Arc::clone(driver)),
        }
    }
}

/// One table slot: id, driver, supported operations and enable flag.
pub struct DriverRecord<C: Capability> {
    id: DriverId,
    driver: DriverRef<C::Driver>,
    capabilities: Capabilities,
    enabled: AtomicBool,
    bound: bool,
}

impl<C: Capability> DriverRecord<C> {
    /// Record for a driver with static storage.
    pub fn new(id: impl Into<DriverId>, driver: &'static C::Driver) -> Self {
        Self::with_ref(id.into(), DriverRef::Static(driver))
    }

    /// Record for a runtime-constructed driver.
    pub fn shared(id: impl Into<DriverId>, driver: Arc<C::Driver>) -> Self {
        Self::with_ref(id.into(), DriverRef::Shared(driver))
    }

    fn with_ref(id: DriverId, driver: DriverRef<C::Driver>) -> Self {
        Self {
            id,
            driver,
            capabilities: C::DEFAULT_CAPABILITIES,
            enabled: AtomicBool::new(false),
            bound: true,
        }
    }

    /// The sentinel occupying an empty slot.
    pub fn unbound(id: DriverId) -> Self {
        Self {
            id,
            driver: DriverRef::Static(C::unbound()),
            capabilities: Capabilities::empty(),
            enabled: AtomicBool::new(false),
            bound: false,
        }
    }

    /// Restrict the operations this record supports.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn id(&self) -> DriverId {
        self.id
    }

    pub fn driver(&self) -> &C::Driver {
        &self.driver
    }

    pub fn name(&self) -> &str {
        self.driver.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// False for the unbound sentinel.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled_flag(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl<C: Capability> fmt::Debug for DriverRecord<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRecord")
            .field("domain", &C::DOMAIN)
            .field("id", &self.id)
            .field("name", &self.name())
            .field("capabilities", &self.capabilities)
            .field("enabled", &self.is_enabled())
            .field("bound", &self.bound)
            .finish()
    }
}

/// Per-domain table of `N` driver records.
pub struct DriverTable<C: Capability, const N: usize> {
    slots: [DriverRecord<C>; N],
    phase: Phase,
}

impl<C: Capability, const N: usize> DriverTable<C, N> {
    /// Table with every slot unbound, open for registration.
    pub fn new() -> Self {
        const { assert!(N == <C::Id as DomainId>::COUNT, "table size must match the id count") };
        Self {
            slots: core::array::from_fn(|i| DriverRecord::unbound(DriverId::from_index(i))),
            phase: Phase::Registering,
        }
    }

    fn slot_index(id: DriverId) -> HalResult<usize> {
        id.index(N).ok_or(HalError::IdOutOfRange {
            domain: C::DOMAIN,
            id,
            count: N,
        })
    }

    fn check_open(&self) -> HalResult<()> {
        match self.phase {
            Phase::Registering => Ok(()),
            Phase::Running => Err(HalError::RegistrationClosed { domain: C::DOMAIN }),
        }
    }

    /// Place `record` in the slot for its id.
    ///
    /// # Errors
    ///
    /// - `IdOutOfRange` for the sentinel or an id `>= N`; the table is unchanged
    /// - `RegistrationClosed` after [`start`](Self::start)
    pub fn register(&mut self, record: DriverRecord<C>) -> HalResult<()> {
        self.check_open()?;
        let index = Self::slot_index(record.id)?;
        let previous = &self.slots[index];
        if previous.is_bound() {
            warn!(
                "{} {}: replacing '{}' with '{}'",
                C::DOMAIN,
                record.id,
                previous.name(),
                record.name()
            );
        }
        debug!("Registered {} {} '{}'", C::DOMAIN, record.id, record.name());
        self.slots[index] = record;
        Ok(())
    }

    /// Register several records, or none if any id is out of range.
    ///
    /// Returns the number registered.
    pub fn register_all(&mut self, records: Vec<DriverRecord<C>>) -> HalResult<usize> {
        self.check_open()?;
        for record in &records {
            Self::slot_index(record.id)?;
        }
        let count = records.len();
        for record in records {
            self.register(record)?;
        }
        Ok(count)
    }

    /// Record at `id`; the unbound sentinel if nothing was registered there.
    ///
    /// # Errors
    ///
    /// `InvalidId` for the sentinel or an id `>= N`.
    pub fn lookup(&self, id: DriverId) -> HalResult<&DriverRecord<C>> {
        id.index(N)
            .map(|index| &self.slots[index])
            .ok_or(HalError::InvalidId {
                domain: C::DOMAIN,
                id,
            })
    }

    /// Freeze registration.
    pub fn start(&mut self) {
        if self.phase == Phase::Registering {
            info!(
                "{} table running with {}/{} drivers",
                C::DOMAIN,
                self.bound_count(),
                N
            );
        }
        self.phase = Phase::Running;
    }

    /// Unbind every slot and reopen registration.
    pub fn reset(&mut self) {
        self.slots = core::array::from_fn(|i| DriverRecord::unbound(DriverId::from_index(i)));
        self.phase = Phase::Registering;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn records(&self) -> impl Iterator<Item = &DriverRecord<C>> {
        self.slots.iter()
    }

    /// Ids of bound slots.
    pub fn bound_ids(&self) -> impl Iterator<Item = DriverId> + '_ {
        self.slots.iter().filter(|r| r.is_bound()).map(|r| r.id)
    }

    pub fn bound_count(&self) -> usize {
        self.bound_ids().count()
    }
}

impl<C: Capability, const N: usize> Default for DriverTable<C, N> {
    fn default() -> Self {
        Self::new()
    }
}
