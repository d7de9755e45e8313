//! ESP32-C6 firmware-specific modules for the atmo weather node.
//!
//! This crate contains the hardware-facing code that cannot compile on
//! desktop targets: peripheral bring-up, WiFi connection management, and
//! the MQTT session the sampling loop publishes through.

#![no_std]

pub mod config;
pub mod mqtt;
pub mod net;
