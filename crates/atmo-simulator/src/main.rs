//! Desktop simulator for the atmo weather node.
//!
//! Runs the real sampling loop from atmo-core against a synthetic barometer
//! and a messaging transport that writes to the log instead of a broker, so
//! the loop can be watched without hardware or a WiFi network.
//!
//! Run with `RUST_LOG=info` (or `debug`) to see the published readings.

use std::convert::Infallible;
use std::process;

use embassy_executor::Executor;
use log::{error, info, trace};
use static_cell::StaticCell;

use atmo_core::config::SAMPLE_INTERVAL_MS;
use atmo_core::sampling::Sampler;
use atmo_core::sensors::{Barometer, SensorError};
use atmo_core::telemetry::Messaging;

/// Topic prefix the fake transport reports in its log lines.
const TOPIC_PREFIX: &str = "atmo/sim";

// ---------------------------------------------------------------------------
// Synthetic sensor
// ---------------------------------------------------------------------------

/// Generates plausible weather readings that vary over time.
struct SyntheticBarometer {
    /// Simulated seconds since startup, advanced once per cycle.
    elapsed_secs: f64,
}

impl SyntheticBarometer {
    fn new() -> Self {
        Self { elapsed_secs: 0.0 }
    }
}

impl Barometer for SyntheticBarometer {
    async fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    async fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.elapsed_secs += f64::from(SAMPLE_INTERVAL_MS) / 1000.0;
        let t = self.elapsed_secs;

        // Temperature: 20-26 °C sinusoidal with slow drift
        Ok((23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos()) as f32)
    }

    async fn read_pressure(&mut self) -> Result<f32, SensorError> {
        let t = self.elapsed_secs;

        // Pressure: around one standard atmosphere with a long swell
        Ok((101_325.0 + 180.0 * (t / 300.0).sin() + 40.0 * (t / 41.0).cos()) as f32)
    }
}

// ---------------------------------------------------------------------------
// Fake transport
// ---------------------------------------------------------------------------

/// Messaging transport that logs instead of talking to a broker.
struct LogPublisher;

impl Messaging for LogPublisher {
    type Error = Infallible;

    async fn upkeep(&mut self) -> Result<(), Self::Error> {
        trace!("mqtt(SIM): upkeep tick");

        Ok(())
    }

    async fn publish(&mut self, subtopic: &str, payload: &str) -> Result<(), Self::Error> {
        info!("mqtt(SIM): topic='{TOPIC_PREFIX}/{subtopic}' payload={payload}");

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[embassy_executor::task]
async fn run_sampler() {
    let sampler = Sampler::new(SyntheticBarometer::new(), LogPublisher, embassy_time::Delay);
    let halted = sampler.run().await;

    // Mirrors the firmware's terminal halt, but a process can say so in its
    // exit status.
    error!("Sampling halted: {halted}");
    process::exit(1);
}

fn main() {
    env_logger::init();
    info!("Starting atmo simulator");
    info!("Publishing a synthetic reading every {SAMPLE_INTERVAL_MS} ms under '{TOPIC_PREFIX}'");

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(run_sampler()).unwrap();
    });
}
