//! The sampling loop: bring the barometer up, then measure, publish, and
//! wait, forever.

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info, warn};
use thiserror_no_std::Error;

use crate::{
    config::{READINGS_SUBTOPIC, SAMPLE_INTERVAL_MS},
    reading::Reading,
    sensors::{Barometer, SensorError},
    telemetry::Messaging,
};

/// Reasons the sampling loop gave up for good.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halted {
    /// The barometer failed its bring-up. Nothing was published and nothing
    /// ever will be.
    #[error("barometer unavailable: {0}")]
    SensorUnavailable(SensorError),
}

/// Owns the measure-publish-wait cycle over whatever barometer, messaging
/// transport, and clock the platform supplies.
pub struct Sampler<B, M, D> {
    barometer: B,
    messaging: M,
    delay: D,
}

impl<B, M, D> Sampler<B, M, D>
where
    B: Barometer,
    M: Messaging,
    D: DelayNs,
{
    pub fn new(barometer: B, messaging: M, delay: D) -> Self {
        Self {
            barometer,
            messaging,
            delay,
        }
    }

    /// Initializes the barometer and samples forever.
    ///
    /// Returns only if the barometer fails its bring-up. Failures within a
    /// cycle (a bad read, a rejected publish) are logged and the loop moves
    /// on to the next cycle.
    pub async fn run(mut self) -> Halted {
        if let Err(error) = self.barometer.init().await {
            error!("Sensor not found");
            return Halted::SensorUnavailable(error);
        }

        info!("Barometer initialized, sampling every {SAMPLE_INTERVAL_MS} ms");

        loop {
            self.run_cycle().await;
        }
    }

    /// One full cycle: messaging upkeep, measure, publish, wait.
    ///
    /// The closing wait is unconditional so a struggling sensor or broker
    /// cannot turn the loop into a busy spin.
    async fn run_cycle(&mut self) {
        if let Err(error) = self.messaging.upkeep().await {
            warn!("Messaging upkeep failed: {error:?}");
        }

        if let Some(reading) = self.capture().await {
            let payload = reading.to_payload();

            info!("Published Sensor Reading: {payload}");

            if let Err(error) = self.messaging.publish(READINGS_SUBTOPIC, &payload).await {
                warn!("Failed to publish reading: {error:?}");
            }
        }

        self.delay.delay_ms(SAMPLE_INTERVAL_MS).await;
    }

    /// Reads both channels, or logs and skips the cycle's publish if either
    /// read fails.
    async fn capture(&mut self) -> Option<Reading> {
        let temperature = match self.barometer.read_temperature().await {
            Ok(value) => value,
            Err(error) => {
                warn!("Temperature read failed: {error}");
                return None;
            }
        };

        let pressure = match self.barometer.read_pressure().await {
            Ok(value) => value,
            Err(error) => {
                warn!("Pressure read failed: {error}");
                return None;
            }
        };

        debug!("Sampled {temperature:.2} C, {pressure:.1} Pa");

        Some(Reading {
            temperature,
            pressure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::cell::RefCell;

    use embassy_futures::block_on;

    use crate::reading::Payload;

    const INIT_FAILURE: SensorError = SensorError::NotDetected { sensor: "BMP085" };

    struct ScriptedBarometer {
        present: bool,
        reads_fail: bool,
        temperature: f32,
        pressure: f32,
    }

    impl ScriptedBarometer {
        fn healthy(temperature: f32, pressure: f32) -> Self {
            Self {
                present: true,
                reads_fail: false,
                temperature,
                pressure,
            }
        }

        fn missing() -> Self {
            Self {
                present: false,
                reads_fail: false,
                temperature: 0.0,
                pressure: 0.0,
            }
        }

        fn flaky() -> Self {
            Self {
                present: true,
                reads_fail: true,
                temperature: 0.0,
                pressure: 0.0,
            }
        }
    }

    impl Barometer for ScriptedBarometer {
        async fn init(&mut self) -> Result<(), SensorError> {
            if self.present { Ok(()) } else { Err(INIT_FAILURE) }
        }

        async fn read_temperature(&mut self) -> Result<f32, SensorError> {
            if self.reads_fail {
                return Err(SensorError::ReadFailed {
                    sensor: "BMP085",
                    operation: "temperature",
                    details: "bus stuck",
                });
            }

            Ok(self.temperature)
        }

        async fn read_pressure(&mut self) -> Result<f32, SensorError> {
            if self.reads_fail {
                return Err(SensorError::ReadFailed {
                    sensor: "BMP085",
                    operation: "pressure",
                    details: "bus stuck",
                });
            }

            Ok(self.pressure)
        }
    }

    #[derive(Default)]
    struct MessagingLog {
        published: heapless::Vec<(heapless::String<32>, Payload), 8>,
        upkeep_calls: usize,
        reject_publishes: bool,
    }

    struct RecordingMessaging<'a> {
        log: &'a RefCell<MessagingLog>,
    }

    impl Messaging for RecordingMessaging<'_> {
        type Error = &'static str;

        async fn upkeep(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().upkeep_calls += 1;

            Ok(())
        }

        async fn publish(&mut self, subtopic: &str, payload: &str) -> Result<(), Self::Error> {
            let mut log = self.log.borrow_mut();
            if log.reject_publishes {
                return Err("broker rejected the publish");
            }

            let mut topic = heapless::String::new();
            topic.push_str(subtopic).unwrap();
            let mut body = Payload::new();
            body.push_str(payload).unwrap();
            log.published.push((topic, body)).unwrap();

            Ok(())
        }
    }

    struct RecordingDelay<'a> {
        requested_ms: &'a RefCell<heapless::Vec<u32, 16>>,
    }

    impl DelayNs for RecordingDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.requested_ms.borrow_mut().push(ns / 1_000_000).unwrap();
        }

        // Overridden so a 10 s wait lands as a single entry instead of the
        // split the provided method would produce.
        async fn delay_ms(&mut self, ms: u32) {
            self.requested_ms.borrow_mut().push(ms).unwrap();
        }
    }

    #[test]
    fn test_halts_without_publishing_when_sensor_init_fails() {
        let log = RefCell::new(MessagingLog::default());
        let delays = RefCell::new(heapless::Vec::new());

        let sampler = Sampler::new(
            ScriptedBarometer::missing(),
            RecordingMessaging { log: &log },
            RecordingDelay {
                requested_ms: &delays,
            },
        );

        let halted = block_on(sampler.run());

        assert_eq!(halted, Halted::SensorUnavailable(INIT_FAILURE));
        assert_eq!(log.borrow().upkeep_calls, 0, "no upkeep after a halt");
        assert!(log.borrow().published.is_empty(), "no publish after a halt");
    }

    #[test]
    fn test_cycle_publishes_reading_to_readings_subtopic() {
        let log = RefCell::new(MessagingLog::default());
        let delays = RefCell::new(heapless::Vec::new());

        let mut sampler = Sampler::new(
            ScriptedBarometer::healthy(22.5, 101_301.0),
            RecordingMessaging { log: &log },
            RecordingDelay {
                requested_ms: &delays,
            },
        );

        block_on(sampler.run_cycle());

        let log = log.borrow();
        assert_eq!(log.published.len(), 1);
        assert_eq!(log.published[0].0.as_str(), "readings");
        assert_eq!(
            log.published[0].1.as_str(),
            "{\"temperature\": 22.50, \"pressure\": 101301 } "
        );
    }

    #[test]
    fn test_waits_the_full_interval_every_cycle() {
        let log = RefCell::new(MessagingLog::default());
        let delays = RefCell::new(heapless::Vec::new());

        let mut sampler = Sampler::new(
            ScriptedBarometer::healthy(21.0, 100_000.0),
            RecordingMessaging { log: &log },
            RecordingDelay {
                requested_ms: &delays,
            },
        );

        block_on(async {
            sampler.run_cycle().await;
            sampler.run_cycle().await;
            sampler.run_cycle().await;
        });

        assert_eq!(delays.borrow().as_slice(), &[10_000, 10_000, 10_000]);
    }

    #[test]
    fn test_upkeep_runs_even_when_reads_fail() {
        let log = RefCell::new(MessagingLog::default());
        let delays = RefCell::new(heapless::Vec::new());

        let mut sampler = Sampler::new(
            ScriptedBarometer::flaky(),
            RecordingMessaging { log: &log },
            RecordingDelay {
                requested_ms: &delays,
            },
        );

        block_on(async {
            sampler.run_cycle().await;
            sampler.run_cycle().await;
        });

        assert_eq!(log.borrow().upkeep_calls, 2);
        assert!(log.borrow().published.is_empty());
        assert_eq!(delays.borrow().as_slice(), &[10_000, 10_000]);
    }

    #[test]
    fn test_rejected_publish_does_not_stop_the_loop() {
        let log = RefCell::new(MessagingLog {
            reject_publishes: true,
            ..Default::default()
        });
        let delays = RefCell::new(heapless::Vec::new());

        let mut sampler = Sampler::new(
            ScriptedBarometer::healthy(19.0, 101_325.0),
            RecordingMessaging { log: &log },
            RecordingDelay {
                requested_ms: &delays,
            },
        );

        block_on(async {
            sampler.run_cycle().await;
            sampler.run_cycle().await;
        });

        assert_eq!(log.borrow().upkeep_calls, 2);
        assert!(log.borrow().published.is_empty());
        assert_eq!(delays.borrow().as_slice(), &[10_000, 10_000]);
    }
}
