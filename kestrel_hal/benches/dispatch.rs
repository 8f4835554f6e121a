//! Capability interface dispatch benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use kestrel_common::hal::config::{
    AnalogChannelConfig, HalConfig, HubConfig, InertialChannelConfig,
};
use kestrel_common::ids::{AccelId, AdcId, DriverId};
use kestrel_hal::drivers::simulation;
use kestrel_hal::{Hal, HalBuilder, SensorHub};
use kestrel_sync::HostBackend;
use std::hint::black_box;

fn board() -> Option<Hal> {
    let config = HalConfig {
        adc: vec![AnalogChannelConfig {
            id: DriverId::new(0),
            name: "vbat".to_string(),
            value: 12.6,
            noise: 0.05,
            enabled: true,
            fail_every: 0,
        }],
        accelerometer: vec![InertialChannelConfig {
            id: DriverId::new(0),
            name: "imu".to_string(),
            value: [0.0, 0.0, -9.81],
            noise: 0.02,
            enabled: true,
            fail_every: 0,
        }],
        ..HalConfig::default()
    };
    let mut builder = HalBuilder::new();
    simulation::register(&mut builder, &config).ok()?;
    Some(builder.build())
}

/// Single read through the interface
fn bench_read(c: &mut Criterion) {
    let Some(hal) = board() else { return };
    c.bench_function("adc_read", |b| {
        b.iter(|| black_box(hal.adc().read(black_box(AdcId::BatteryVoltage))));
    });
    c.bench_function("accel_read", |b| {
        b.iter(|| black_box(hal.accel().read(black_box(AccelId::Primary))));
    });
    c.bench_function("read_unbound", |b| {
        b.iter(|| black_box(hal.adc().read(black_box(AdcId::Aux))));
    });
}

/// One hub cycle: read and publish every enabled channel
fn bench_hub_cycle(c: &mut Criterion) {
    let Some(hal) = board() else { return };
    let mut hub = SensorHub::<HostBackend>::new(&hal, &HubConfig::default());
    c.bench_function("hub_cycle", |b| {
        b.iter(|| black_box(hub.cycle()));
    });
}

criterion_group!(benches, bench_read, bench_hub_cycle);
criterion_main!(benches);
