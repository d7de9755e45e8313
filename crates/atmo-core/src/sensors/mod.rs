//! Sensor abstractions and the drivers behind them.

pub mod bmp085;

use thiserror_no_std::Error;

/// Errors shared by every sensor driver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not answer its identity probe, or answered with the
    /// wrong chip id. Usually a wiring or bus address problem.
    #[error("{sensor} not detected on the bus")]
    NotDetected { sensor: &'static str },

    /// The device answered but could not be brought up.
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },

    /// A measurement could not be taken.
    #[error("{sensor} {operation} failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },

    /// A measurement was requested before [`Barometer::init`] succeeded.
    #[error("{sensor} used before initialization")]
    NotInitialized { sensor: &'static str },
}

/// A barometric sensor that reports temperature and pressure.
pub trait Barometer {
    /// Probes the device and loads whatever device state the measurements
    /// need. Must complete successfully before either read is called.
    fn init(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Measures the ambient temperature in degrees Celsius.
    fn read_temperature(&mut self) -> impl Future<Output = Result<f32, SensorError>>;

    /// Measures the barometric pressure in pascals.
    fn read_pressure(&mut self) -> impl Future<Output = Result<f32, SensorError>>;
}
