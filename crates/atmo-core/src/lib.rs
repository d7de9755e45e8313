//! # Atmo Core
//!
//! The hardware-independent heart of the atmo weather node. This crate owns
//! everything that does not need a radio or a real I2C bus: the sensor and
//! messaging abstractions, the BMP085 barometer driver, the wire payload
//! format, and the sampling loop that ties them together.
//!
//! The firmware and the simulator both depend on this crate and only supply
//! the platform pieces (WiFi, MQTT, clocks) behind the traits defined here.
#![no_std]

pub mod config;
pub mod reading;
pub mod sampling;
pub mod sensors;
pub mod telemetry;
