//! Node tasks.
//!
//! - battery monitor: waits on the battery voltage topic and asks the LED
//!   service to light the status LED on low voltage, or to blink it as a
//!   heartbeat otherwise
//! - LED server: owns the status LED and serves the LED service from its
//!   own thread, so a slow GPIO expander never blocks the monitor

use crate::config::MonitorConfig;
use kestrel_common::ids::GpioId;
use kestrel_common::types::PinLevel;
use kestrel_hal::Hal;
use kestrel_msg::error::ServiceError;
use kestrel_msg::sample::Received;
use kestrel_msg::service::{Delivery, Service, ServiceClient, ServiceServer};
use kestrel_msg::topic::Subscriber;
use kestrel_sync::{HostBackend, Priority, SyncResult, Thread, ThreadHandle, ThreadSpec};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Requests a status LED level; answers whether it was applied.
pub type LedService = Service<PinLevel, bool, HostBackend>;

/// Battery voltage watcher.
pub struct BatteryMonitor {
    subscriber: Subscriber<f32, HostBackend>,
    led: ServiceClient<PinLevel, bool, HostBackend>,
    config: MonitorConfig,
    await_timeout: Duration,
    service_timeout: Duration,
    samples: u64,
    led_level: PinLevel,
    low: bool,
}

impl BatteryMonitor {
    pub fn new(
        subscriber: Subscriber<f32, HostBackend>,
        led: ServiceClient<PinLevel, bool, HostBackend>,
        config: MonitorConfig,
        await_timeout: Duration,
        service_timeout: Duration,
    ) -> Self {
        Self {
            subscriber,
            led,
            config,
            await_timeout,
            service_timeout,
            samples: 0,
            led_level: PinLevel::Low,
            low: false,
        }
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn is_low(&self) -> bool {
        self.low
    }

    /// Wait for one sample and react to it.
    ///
    /// Returns the LED level applied, if the LED changed.
    pub fn step(&mut self) -> Option<PinLevel> {
        let sample = match self.subscriber.await_next(self.await_timeout) {
            Received::Sample(sample) => sample,
            Received::Timeout => {
                debug!(
                    "No battery sample within {}ms",
                    self.await_timeout.as_millis()
                );
                return None;
            }
        };
        self.samples += 1;

        let low = sample.payload < self.config.low_battery_v;
        if low != self.low {
            if low {
                warn!(
                    "Battery low: {:.2}V (threshold {:.2}V)",
                    sample.payload, self.config.low_battery_v
                );
            } else {
                info!("Battery recovered: {:.2}V", sample.payload);
            }
            self.low = low;
        }

        let desired = if low {
            PinLevel::High
        } else if self.samples.checked_rem(u64::from(self.config.heartbeat_every)) == Some(0) {
            self.led_level.toggled()
        } else {
            return None;
        };
        if desired == self.led_level {
            return None;
        }
        self.request_led(desired)
    }

    fn request_led(&mut self, level: PinLevel) -> Option<PinLevel> {
        match self.led.call(&level, self.service_timeout) {
            Ok(response) if response.payload => {
                self.led_level = level;
                Some(level)
            }
            Ok(response) => {
                warn!("LED request #{} not applied", response.sequence_id);
                None
            }
            Err(e) => {
                warn!("LED request failed: {}", e);
                None
            }
        }
    }

    /// Step until `running` clears.
    pub fn run(mut self, running: Arc<AtomicBool>) {
        info!("Battery monitor on '{}'", self.subscriber.topic());
        while running.load(Ordering::SeqCst) {
            self.step();
        }
        info!("Battery monitor stopped after {} samples", self.samples);
    }
}

/// Start the monitor on its own thread.
///
/// # Errors
///
/// `SyncError::SpawnFailed` if the thread cannot be created.
pub fn spawn_monitor(monitor: BatteryMonitor, running: Arc<AtomicBool>) -> SyncResult<ThreadHandle> {
    Thread::create(
        ThreadSpec::new("battery_monitor").with_priority(Priority::Low),
        move || monitor.run(running),
    )
    .start()
}

/// Serve LED requests until `running` clears or the service is unbound.
pub fn serve_led(
    server: ServiceServer<PinLevel, bool, HostBackend>,
    hal: &Hal,
    running: &AtomicBool,
    poll: Duration,
) {
    info!("LED server on '{}'", server.service());
    while running.load(Ordering::SeqCst) {
        let outcome = server.handle_next(poll, |request| {
            match hal.gpio().write(GpioId::StatusLed, *request.data) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Status LED write failed: {}", e);
                    false
                }
            }
        });
        match outcome {
            Ok(Delivery::Delivered) | Err(ServiceError::Timeout) => {}
            Ok(Delivery::Discarded) => debug!("LED response arrived after the caller gave up"),
            Err(e) => {
                warn!("LED server stopping: {}", e);
                break;
            }
        }
    }
}

/// Start the LED server on its own thread.
///
/// # Errors
///
/// `SyncError::SpawnFailed` if the thread cannot be created.
pub fn spawn_led_server(
    server: ServiceServer<PinLevel, bool, HostBackend>,
    hal: &'static Hal,
    running: Arc<AtomicBool>,
    poll: Duration,
) -> SyncResult<ThreadHandle> {
    Thread::create(
        ThreadSpec::new("led_server").with_priority(Priority::High),
        move || serve_led(server, hal, &running, poll),
    )
    .start()
}
