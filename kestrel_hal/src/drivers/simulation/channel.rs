//! State shared by every simulated sensor.

use kestrel_common::error::{DriverError, DriverResult};
use kestrel_common::ids::{Domain, DriverId};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Deterministic seed for a channel.
pub(crate) fn channel_seed(domain: Domain, id: DriverId) -> u64 {
    let domain_index = Domain::ALL.iter().position(|d| *d == domain).unwrap_or(0);
    ((domain_index as u64) << 16) | (id.raw() as u16 as u64)
}

/// Power state, noise source and fault injection.
pub(crate) struct SimChannel {
    enabled: AtomicBool,
    reads: AtomicU32,
    fail_every: u32,
    noise: f32,
    rng: Mutex<StdRng>,
}

impl SimChannel {
    pub(crate) fn new(seed: u64, noise: f32, fail_every: u32) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            reads: AtomicU32::new(0),
            fail_every,
            noise: noise.abs(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub(crate) fn power(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn is_powered(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Account for one read. Fails when powered down or on an injected fault.
    pub(crate) fn sample(&self) -> DriverResult<()> {
        if !self.is_powered() {
            return Err(DriverError::NotEnabled);
        }
        let n = self.reads.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(DriverError::NoResponse);
        }
        Ok(())
    }

    /// Uniform noise in `[-noise, noise]`.
    pub(crate) fn jitter(&self) -> f32 {
        if self.noise == 0.0 {
            return 0.0;
        }
        self.rng.lock().gen_range(-self.noise..=self.noise)
    }

    pub(crate) fn reads(&self) -> u32 {
        self.reads.load(Ordering::Relaxed)
    }
}
