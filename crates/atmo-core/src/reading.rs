//! A single environmental observation and its wire format.

use core::fmt::Write;

/// Upper bound on the rendered payload length. A realistic body is around
/// 45 bytes; 128 leaves headroom for extreme float values.
pub const PAYLOAD_CAPACITY: usize = 128;

/// A rendered, ready-to-publish payload.
pub type Payload = heapless::String<PAYLOAD_CAPACITY>;

/// One observation from the barometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Ambient temperature in degrees Celsius.
    pub temperature: f32,
    /// Barometric pressure in pascals.
    pub pressure: f32,
}

impl Reading {
    /// Renders the reading into the JSON body the backend expects.
    ///
    /// The format is fixed: temperature with exactly two decimal places,
    /// pressure truncated toward zero to whole pascals, a space after each
    /// colon, and a space on either side of the closing brace:
    ///
    /// ```text
    /// {"temperature": 22.50, "pressure": 101301 }
    /// ```
    ///
    /// Consumers parse this byte-for-byte, so the spacing is part of the
    /// contract.
    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        // PAYLOAD_CAPACITY fits any two f32 values, so this cannot fail.
        write!(
            payload,
            "{{\"temperature\": {:.2}, \"pressure\": {} }} ",
            self.temperature, self.pressure as i32
        )
        .ok();
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_format_is_byte_exact() {
        let reading = Reading {
            temperature: 22.5,
            pressure: 101_301.0,
        };

        assert_eq!(
            reading.to_payload().as_str(),
            "{\"temperature\": 22.50, \"pressure\": 101301 } "
        );
    }

    #[test]
    fn test_pressure_truncates_toward_zero() {
        let reading = Reading {
            temperature: 20.0,
            pressure: 101_325.7,
        };

        assert_eq!(
            reading.to_payload().as_str(),
            "{\"temperature\": 20.00, \"pressure\": 101325 } "
        );
    }

    #[test]
    fn test_negative_temperature_keeps_two_decimals() {
        let reading = Reading {
            temperature: -3.1,
            pressure: 99_800.9,
        };

        assert_eq!(
            reading.to_payload().as_str(),
            "{\"temperature\": -3.10, \"pressure\": 99800 } "
        );
    }
}
