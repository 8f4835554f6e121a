//! Battery monitor driving an LED service.

use kestrel_common::types::PinLevel;
use kestrel_msg::topic::Topic;
use kestrel_node::{BatteryMonitor, LedService, MonitorConfig};
use kestrel_sync::HostBackend;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_millis(20);

fn monitor_with_log(
    heartbeat_every: u32,
) -> (
    kestrel_msg::topic::Publisher<f32, HostBackend>,
    BatteryMonitor,
    Arc<Mutex<Vec<PinLevel>>>,
) {
    let (publisher, handle) = Topic::<f32, HostBackend>::new("battery_voltage");
    let applied = Arc::new(Mutex::new(Vec::new()));
    let led = LedService::new("status_led");
    let log = Arc::clone(&applied);
    led.bind(move |request| {
        log.lock().push(*request.data);
        true
    })
    .unwrap();

    let monitor = BatteryMonitor::new(
        handle.subscribe().unwrap(),
        led.client(),
        MonitorConfig {
            low_battery_v: 10.5,
            heartbeat_every,
        },
        WAIT,
        WAIT,
    );
    (publisher, monitor, applied)
}

#[test]
fn test_timeout_without_samples() {
    let (_publisher, mut monitor, applied) = monitor_with_log(1);
    assert_eq!(monitor.step(), None);
    assert_eq!(monitor.samples(), 0);
    assert!(applied.lock().is_empty());
}

#[test]
fn test_heartbeat_toggles_led() {
    let (mut publisher, mut monitor, applied) = monitor_with_log(2);

    publisher.publish(12.4);
    assert_eq!(monitor.step(), None);
    publisher.publish(12.4);
    assert_eq!(monitor.step(), Some(PinLevel::High));
    publisher.publish(12.3);
    assert_eq!(monitor.step(), None);
    publisher.publish(12.3);
    assert_eq!(monitor.step(), Some(PinLevel::Low));

    assert_eq!(*applied.lock(), vec![PinLevel::High, PinLevel::Low]);
}

#[test]
fn test_low_battery_holds_led_on() {
    let (mut publisher, mut monitor, applied) = monitor_with_log(1000);

    publisher.publish(9.8);
    assert_eq!(monitor.step(), Some(PinLevel::High));
    assert!(monitor.is_low());

    publisher.publish(9.7);
    assert_eq!(monitor.step(), None);

    publisher.publish(12.0);
    assert_eq!(monitor.step(), None);
    assert!(!monitor.is_low());
    assert_eq!(*applied.lock(), vec![PinLevel::High]);
}

#[test]
fn test_zero_heartbeat_never_blinks() {
    let (mut publisher, mut monitor, applied) = monitor_with_log(0);

    for volts in [12.4, 12.3, 12.2] {
        publisher.publish(volts);
        assert_eq!(monitor.step(), None);
    }
    assert_eq!(monitor.samples(), 3);

    publisher.publish(9.9);
    assert_eq!(monitor.step(), Some(PinLevel::High));
    assert_eq!(*applied.lock(), vec![PinLevel::High]);
}
