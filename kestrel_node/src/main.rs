//! # Kestrel Node Binary
//!
//! Registers simulated drivers, installs the HAL and samples every enabled
//! sensor into topics until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Run with the bundled configuration
//! kestrel_node --config kestrel_node/config/node.toml
//!
//! # Verbose logging, stop after 1000 cycles
//! kestrel_node -c node.toml -v --cycles 1000
//!
//! # JSON logs with a status snapshot per report
//! kestrel_node -c node.toml --json
//! ```

use clap::Parser;
use kestrel_common::config::{ConfigLoader, LogLevel};
use kestrel_common::consts::DEFAULT_CONFIG_PATH;
use kestrel_common::ids::AdcId;
use kestrel_hal::drivers::simulation;
use kestrel_hal::{HalBuilder, HubStatus, SensorHub};
use kestrel_node::tasks::{self, BatteryMonitor, LedService};
use kestrel_node::NodeConfig;
use kestrel_sync::HostBackend;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Kestrel node - simulated sensors sampled into sequenced topics
#[derive(Parser, Debug)]
#[command(name = "kestrel_node")]
#[command(version)]
#[command(about = "Driver dispatch and sequenced messaging demo node")]
#[command(long_about = None)]
struct Args {
    /// Path to node configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Stop after N hub cycles
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Node failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = NodeConfig::load(&args.config);
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    let config = config?;
    config.validate()?;
    info!(
        "Kestrel node v{} '{}' starting...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let mut builder = HalBuilder::new();
    let board = simulation::register(&mut builder, &config.hal)?;
    let hal = builder.install()?;
    info!(
        "HAL installed: {} drivers registered, {} bound",
        board.registered(),
        hal.bound_count()
    );

    let mut hub = SensorHub::<HostBackend>::new(hal, &config.hub);
    let running = hub.running_flag();
    running.store(true, Ordering::SeqCst);
    {
        let running = hub.running_flag();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let await_timeout = Duration::from_millis(u64::from(config.hub.await_timeout_ms));
    let service_timeout = Duration::from_millis(u64::from(config.hub.service_timeout_ms));

    let led = LedService::new("status_led");
    let led_server = tasks::spawn_led_server(
        led.attach_server()?,
        hal,
        hub.running_flag(),
        await_timeout,
    )?;

    let monitor = match hub.adc_topic(AdcId::BatteryVoltage) {
        Some(topic) => {
            let monitor = BatteryMonitor::new(
                topic.subscribe()?,
                led.client(),
                config.monitor.clone(),
                await_timeout,
                service_timeout,
            );
            Some(tasks::spawn_monitor(monitor, hub.running_flag())?)
        }
        None => {
            warn!("Battery voltage channel disabled; monitor not started");
            None
        }
    };

    let json = args.json;
    hub.run(args.cycles, |status| report(status, json));

    running.store(false, Ordering::SeqCst);
    if let Some(monitor) = monitor {
        monitor.join()?;
    }
    led_server.join()?;
    report(&hub.status(), json);

    info!("Kestrel node shutdown complete");
    Ok(())
}

fn report(status: &HubStatus, json: bool) {
    if json {
        match serde_json::to_string(status) {
            Ok(snapshot) => info!(status = %snapshot, "hub status"),
            Err(e) => warn!("Failed to serialize hub status: {}", e),
        }
    } else {
        info!(
            "Hub: {} cycles, avg={}us, max={}us, violations={}, samples={}, errors={}",
            status.stats.cycle_count,
            status.avg_cycle_time_us,
            status.stats.max_cycle_time_us,
            status.stats.timing_violations,
            status.stats.samples_published,
            status.stats.read_errors
        );
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose { "debug" } else { level.as_str() };

    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| tracing::Level::INFO.into()),
    );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
