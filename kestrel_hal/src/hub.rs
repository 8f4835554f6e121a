//! Sensor hub.
//!
//! Periodic sampler that reads every enabled sensor through the capability
//! interfaces and publishes the values on one topic per channel. Topic names
//! are the id labels (`battery_voltage`, `accel_primary`, ...).
//!
//! A failing read is counted and logged; it never stops the loop, and the
//! channel keeps its last published sample.

use crate::capability::{Accelerometer, Adc, Barometer, Capability, Magnetometer};
use crate::global::Hal;
use crate::interface::CapabilityInterface;
use kestrel_common::filter::Filter;
use kestrel_common::hal::config::HubConfig;
use kestrel_common::ids::{AccelId, AdcId, BaroId, DomainId, DriverId, MagId};
use kestrel_common::types::{BaroReading, Vector3};
use kestrel_msg::topic::{Publisher, Topic, TopicHandle};
use kestrel_sync::Backend;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timing and throughput counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HubStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Cycles that exceeded the target period
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
    /// Samples published across all topics
    pub samples_published: u64,
    /// Failed driver reads across all channels
    pub read_errors: u64,
}

impl HubStats {
    pub fn avg_cycle_time_us(&self) -> u64 {
        self.total_cycle_time_us
            .checked_div(self.cycle_count)
            .unwrap_or(0)
    }
}

/// Per-channel diagnostic row.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStatus {
    pub topic: &'static str,
    pub id: DriverId,
    pub sequence: u32,
    pub subscribers: usize,
    pub errors: u64,
}

/// Snapshot emitted with every report.
#[derive(Debug, Clone, Serialize)]
pub struct HubStatus {
    pub stats: HubStats,
    pub avg_cycle_time_us: u64,
    pub channels: Vec<ChannelStatus>,
}

struct HubChannel<C: Capability, B: Backend> {
    id: C::Id,
    publisher: Publisher<C::Value, B>,
    filter: Option<Box<dyn Filter<C::Value>>>,
    errors: u64,
}

impl<C: Capability, B: Backend> HubChannel<C, B> {
    fn open<const N: usize>(interface: &CapabilityInterface<C, N>) -> Vec<Self> {
        C::Id::all()
            .iter()
            .copied()
            .filter(|id| interface.is_enabled(*id))
            .map(|id| {
                let (publisher, _) = Topic::new(id.label());
                Self {
                    id,
                    publisher,
                    filter: None,
                    errors: 0,
                }
            })
            .collect()
    }

    /// Read and publish. Returns whether a sample went out.
    fn sample<const N: usize>(&mut self, interface: &CapabilityInterface<C, N>) -> bool {
        match interface.read(self.id) {
            Ok(value) => {
                let value = match self.filter.as_mut() {
                    Some(filter) => filter.apply(value),
                    None => value,
                };
                self.publisher.publish(value);
                true
            }
            Err(e) => {
                self.errors += 1;
                if self.errors <= 10 || self.errors % 1000 == 0 {
                    warn!(
                        "Read error #{} on '{}': {}",
                        self.errors,
                        self.publisher.name(),
                        e
                    );
                }
                false
            }
        }
    }

    fn status(&self) -> ChannelStatus {
        ChannelStatus {
            topic: self.publisher.name(),
            id: self.id.into(),
            sequence: self.publisher.sequence(),
            subscribers: self.publisher.subscriber_count(),
            errors: self.errors,
        }
    }
}

fn find<C: Capability, B: Backend>(
    channels: &[HubChannel<C, B>],
    id: impl Into<DriverId>,
) -> Option<&HubChannel<C, B>> {
    let id = id.into();
    channels
        .iter()
        .find(|c| Into::<DriverId>::into(c.id) == id)
}

/// Sampler publishing every enabled sensor of a [`Hal`].
pub struct SensorHub<'h, B: Backend> {
    hal: &'h Hal,
    adc: Vec<HubChannel<Adc, B>>,
    accel: Vec<HubChannel<Accelerometer, B>>,
    mag: Vec<HubChannel<Magnetometer, B>>,
    baro: Vec<HubChannel<Barometer, B>>,
    cycle_time: Duration,
    report_every: u64,
    running: Arc<AtomicBool>,
    stats: HubStats,
}

impl<'h, B: Backend> SensorHub<'h, B> {
    /// Open one topic per enabled sensor channel.
    ///
    /// Channels enabled after this call are not sampled.
    pub fn new(hal: &'h Hal, config: &HubConfig) -> Self {
        let hub = Self {
            hal,
            adc: HubChannel::open(hal.adc()),
            accel: HubChannel::open(hal.accel()),
            mag: HubChannel::open(hal.mag()),
            baro: HubChannel::open(hal.baro()),
            cycle_time: Duration::from_millis(u64::from(config.cycle_time_ms)),
            report_every: config.report_every,
            running: Arc::new(AtomicBool::new(false)),
            stats: HubStats::default(),
        };
        info!(
            "SensorHub created with {} topics, cycle_time={}ms",
            hub.channel_count(),
            config.cycle_time_ms
        );
        hub
    }

    pub fn channel_count(&self) -> usize {
        self.adc.len() + self.accel.len() + self.mag.len() + self.baro.len()
    }

    pub fn adc_topic(&self, id: AdcId) -> Option<TopicHandle<f32, B>> {
        find(&self.adc, id).map(|c| c.publisher.handle())
    }

    pub fn accel_topic(&self, id: AccelId) -> Option<TopicHandle<Vector3, B>> {
        find(&self.accel, id).map(|c| c.publisher.handle())
    }

    pub fn mag_topic(&self, id: MagId) -> Option<TopicHandle<Vector3, B>> {
        find(&self.mag, id).map(|c| c.publisher.handle())
    }

    pub fn baro_topic(&self, id: BaroId) -> Option<TopicHandle<BaroReading, B>> {
        find(&self.baro, id).map(|c| c.publisher.handle())
    }

    /// Filter an ADC channel before publishing. Returns false if the channel
    /// is not sampled.
    pub fn set_adc_filter(&mut self, id: AdcId, filter: Box<dyn Filter<f32>>) -> bool {
        match self.adc.iter_mut().find(|c| c.id == id) {
            Some(channel) => {
                channel.filter = Some(filter);
                true
            }
            None => false,
        }
    }

    /// Sample every channel once. Returns the number of samples published.
    pub fn cycle(&mut self) -> usize {
        let hal = self.hal;
        let outcomes = self
            .adc
            .iter_mut()
            .map(|c| c.sample(hal.adc()))
            .chain(self.accel.iter_mut().map(|c| c.sample(hal.accel())))
            .chain(self.mag.iter_mut().map(|c| c.sample(hal.mag())))
            .chain(self.baro.iter_mut().map(|c| c.sample(hal.baro())));

        let (mut published, mut failed) = (0usize, 0u64);
        for ok in outcomes {
            if ok {
                published += 1;
            } else {
                failed += 1;
            }
        }
        self.stats.samples_published += published as u64;
        self.stats.read_errors += failed;
        published
    }

    /// Flag that stops [`run`](Self::run) when cleared.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn stats(&self) -> &HubStats {
        &self.stats
    }

    pub fn status(&self) -> HubStatus {
        let mut channels: Vec<ChannelStatus> = self.adc.iter().map(HubChannel::status).collect();
        channels.extend(self.accel.iter().map(HubChannel::status));
        channels.extend(self.mag.iter().map(HubChannel::status));
        channels.extend(self.baro.iter().map(HubChannel::status));
        HubStatus {
            stats: self.stats.clone(),
            avg_cycle_time_us: self.stats.avg_cycle_time_us(),
            channels,
        }
    }

    /// Sample at the configured period until stopped or `max_cycles` ran.
    ///
    /// `on_report` receives a status snapshot every `report_every` cycles.
    pub fn run(&mut self, max_cycles: Option<u64>, mut on_report: impl FnMut(&HubStatus)) {
        info!(
            "Starting SensorHub loop (cycle_time={}ms)...",
            self.cycle_time.as_millis()
        );
        self.running.store(true, Ordering::SeqCst);
        let target_us = self.cycle_time.as_micros() as u64;
        let mut executed = 0u64;

        while self.running.load(Ordering::SeqCst) && max_cycles.is_none_or(|max| executed < max) {
            let cycle_start = Instant::now();
            self.cycle();
            executed += 1;

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            self.stats.cycle_count += 1;
            self.stats.total_cycle_time_us += cycle_time_us;
            self.stats.max_cycle_time_us = self.stats.max_cycle_time_us.max(cycle_time_us);

            if cycle_time_us > target_us {
                self.stats.timing_violations += 1;
                if self.stats.timing_violations <= 10 || self.stats.timing_violations % 1000 == 0 {
                    warn!(
                        "Timing violation #{}: cycle took {}us (target {}us)",
                        self.stats.timing_violations, cycle_time_us, target_us
                    );
                }
            }

            if self.report_every > 0 && self.stats.cycle_count % self.report_every == 0 {
                debug!(
                    "Hub loop: {} cycles, avg={}us, max={}us, violations={}, errors={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_time_us(),
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations,
                    self.stats.read_errors
                );
                on_report(&self.status());
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.cycle_time {
                std::thread::sleep(self.cycle_time - elapsed);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "SensorHub stopped after {} cycles ({} samples, {} read errors)",
            self.stats.cycle_count, self.stats.samples_published, self.stats.read_errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation;
    use crate::global::HalBuilder;
    use kestrel_common::hal::config::{AnalogChannelConfig, BaroChannelConfig, HalConfig};
    use kestrel_sync::HostBackend;

    fn config(fail_every: u32) -> HalConfig {
        HalConfig {
            adc: vec![
                AnalogChannelConfig {
                    id: DriverId::new(0),
                    name: "vbat".to_string(),
                    value: 12.0,
                    noise: 0.0,
                    enabled: true,
                    fail_every,
                },
                AnalogChannelConfig {
                    id: DriverId::new(2),
                    name: "temp".to_string(),
                    value: 1.1,
                    noise: 0.0,
                    enabled: false,
                    fail_every: 0,
                },
            ],
            barometer: vec![BaroChannelConfig {
                id: DriverId::new(0),
                name: "baro".to_string(),
                pressure_pa: 100_000.0,
                temperature_c: 20.0,
                noise: 0.0,
                enabled: true,
                fail_every: 0,
            }],
            ..HalConfig::default()
        }
    }

    fn build(fail_every: u32) -> Hal {
        let mut builder = HalBuilder::new();
        simulation::register(&mut builder, &config(fail_every)).unwrap();
        builder.build()
    }

    struct Halve;

    impl Filter<f32> for Halve {
        fn apply(&mut self, input: f32) -> f32 {
            input / 2.0
        }
    }

    #[test]
    fn test_only_enabled_channels_get_topics() {
        let hal = build(0);
        let hub = SensorHub::<HostBackend>::new(&hal, &HubConfig::default());
        assert_eq!(hub.channel_count(), 2);
        assert!(hub.adc_topic(AdcId::BatteryVoltage).is_some());
        assert!(hub.adc_topic(AdcId::BoardTemperature).is_none());
        assert_eq!(
            hub.baro_topic(BaroId::Primary).map(|t| t.name()),
            Some("baro_primary")
        );
    }

    #[test]
    fn test_cycle_publishes_each_channel() {
        let hal = build(0);
        let mut hub = SensorHub::<HostBackend>::new(&hal, &HubConfig::default());
        let vbat = hub.adc_topic(AdcId::BatteryVoltage).unwrap();

        assert_eq!(hub.cycle(), 2);
        assert_eq!(hub.cycle(), 2);
        let sample = vbat.current().unwrap();
        assert_eq!(sample.sequence_id, 2);
        assert_eq!(sample.payload, 12.0);
        assert_eq!(hub.stats().samples_published, 4);
    }

    #[test]
    fn test_read_errors_counted_not_fatal() {
        let hal = build(2);
        let mut hub = SensorHub::<HostBackend>::new(&hal, &HubConfig::default());
        let vbat = hub.adc_topic(AdcId::BatteryVoltage).unwrap();

        hub.cycle();
        hub.cycle();
        hub.cycle();
        assert_eq!(hub.stats().read_errors, 1);
        assert_eq!(vbat.sequence(), 2);

        let status = hub.status();
        let row = status
            .channels
            .iter()
            .find(|c| c.topic == "battery_voltage")
            .unwrap();
        assert_eq!(row.errors, 1);
    }

    #[test]
    fn test_adc_filter_applied() {
        let hal = build(0);
        let mut hub = SensorHub::<HostBackend>::new(&hal, &HubConfig::default());
        assert!(hub.set_adc_filter(AdcId::BatteryVoltage, Box::new(Halve)));
        assert!(!hub.set_adc_filter(AdcId::Aux, Box::new(Halve)));

        hub.cycle();
        let vbat = hub.adc_topic(AdcId::BatteryVoltage).unwrap();
        assert_eq!(vbat.current().unwrap().payload, 6.0);
    }

    #[test]
    fn test_run_bounded_reports() {
        let hal = build(0);
        let config = HubConfig {
            cycle_time_ms: 1,
            report_every: 2,
            ..HubConfig::default()
        };
        let mut hub = SensorHub::<HostBackend>::new(&hal, &config);
        let mut reports = Vec::new();
        hub.run(Some(4), |status| reports.push(status.stats.cycle_count));

        assert_eq!(reports, vec![2, 4]);
        assert_eq!(hub.stats().cycle_count, 4);
        assert!(!hub.running_flag().load(Ordering::SeqCst));
    }
}
