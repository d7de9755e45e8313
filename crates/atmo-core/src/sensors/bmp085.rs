//! Driver for the Bosch BMP085 barometric pressure sensor.
//!
//! The device exposes a single control/data register pair. Each measurement
//! writes a conversion command to the control register, waits out the
//! conversion time, and reads the raw result back from the data register.
//! Raw values are meaningless on their own and must be run through the
//! integer compensation pipeline with per-device coefficients read from the
//! calibration EEPROM during [`Barometer::init`].

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use super::{Barometer, SensorError};

const SENSOR_NAME: &str = "BMP085";

/// Fixed 7-bit bus address. The BMP085 has no address pins.
const ADDRESS: u8 = 0x77;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIBRATION: u8 = 0xAA;
const REG_CONTROL: u8 = 0xF4;
const REG_DATA: u8 = 0xF6;

/// Value the chip id register must answer with.
const CHIP_ID: u8 = 0x55;

const CMD_READ_TEMPERATURE: u8 = 0x2E;
const CMD_READ_PRESSURE: u8 = 0x34;

/// Temperature conversions always take at most 4.5 ms.
const TEMPERATURE_CONVERSION_MS: u32 = 5;

/// Pressure oversampling setting. Higher settings average more internal
/// samples per conversion, trading conversion time for noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    UltraLowPower = 0,
    Standard = 1,
    HighResolution = 2,
    UltraHighResolution = 3,
}

impl Oversampling {
    /// Worst-case pressure conversion time for this setting.
    fn conversion_delay_ms(self) -> u32 {
        match self {
            Self::UltraLowPower => 5,
            Self::Standard => 8,
            Self::HighResolution => 14,
            Self::UltraHighResolution => 26,
        }
    }
}

/// Per-device compensation coefficients from the calibration EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Calibration {
    ac1: i16,
    ac2: i16,
    ac3: i16,
    ac4: u16,
    ac5: u16,
    ac6: u16,
    b1: i16,
    b2: i16,
    mc: i16,
    md: i16,
}

impl Calibration {
    /// Parses the 22-byte EEPROM block. Words are big-endian, laid out
    /// AC1..AC6, B1, B2, MB, MC, MD. MB is present in the EEPROM map but
    /// unused by the compensation formulas, so it is not kept.
    fn from_eeprom(raw: &[u8; 22]) -> Self {
        let word_i16 = |index: usize| i16::from_be_bytes([raw[index], raw[index + 1]]);
        let word_u16 = |index: usize| u16::from_be_bytes([raw[index], raw[index + 1]]);

        Self {
            ac1: word_i16(0),
            ac2: word_i16(2),
            ac3: word_i16(4),
            ac4: word_u16(6),
            ac5: word_u16(8),
            ac6: word_u16(10),
            b1: word_i16(12),
            b2: word_i16(14),
            mc: word_i16(18),
            md: word_i16(20),
        }
    }
}

/// Fine-temperature term shared by the temperature and pressure outputs.
fn compute_b5(calibration: &Calibration, raw_temperature: i32) -> i32 {
    let x1 =
        ((raw_temperature - i32::from(calibration.ac6)) * i32::from(calibration.ac5)) >> 15;
    let x2 = (i32::from(calibration.mc) << 11) / (x1 + i32::from(calibration.md));
    x1 + x2
}

/// True temperature in tenths of a degree Celsius.
fn compensate_temperature(b5: i32) -> i32 {
    (b5 + 8) >> 4
}

/// True pressure in pascals, from the raw pressure reading and the B5 term
/// of a temperature conversion taken moments before.
fn compensate_pressure(
    calibration: &Calibration,
    b5: i32,
    raw_pressure: i32,
    oversampling: Oversampling,
) -> i32 {
    let oss = oversampling as u8;

    let b6 = b5 - 4000;
    let mut x1 = (i32::from(calibration.b2) * ((b6 * b6) >> 12)) >> 11;
    let mut x2 = (i32::from(calibration.ac2) * b6) >> 11;
    let mut x3 = x1 + x2;
    let b3 = (((i32::from(calibration.ac1) * 4 + x3) << oss) + 2) / 4;

    x1 = (i32::from(calibration.ac3) * b6) >> 13;
    x2 = (i32::from(calibration.b1) * ((b6 * b6) >> 12)) >> 16;
    x3 = (x1 + x2 + 2) >> 2;
    let b4 = (u32::from(calibration.ac4) * ((x3 + 32768) as u32)) >> 15;
    let b7 = ((raw_pressure - b3) as u32) * (50_000_u32 >> oss);

    // B7 stays below 2^31 for pressures the sensor can physically report,
    // but the datasheet still splits the scaling to avoid the overflow.
    let pressure = if b7 < 0x8000_0000 {
        ((b7 * 2) / b4) as i32
    } else {
        ((b7 / b4) * 2) as i32
    };

    x1 = (pressure >> 8) * (pressure >> 8);
    x1 = (x1 * 3038) >> 16;
    x2 = (-7357 * pressure) >> 16;

    pressure + ((x1 + x2 + 3791) >> 4)
}

/// Driver for the BMP085 behind any async I2C bus.
///
/// [`Barometer::init`] must succeed before the first measurement; it checks
/// the chip id and loads the calibration coefficients the compensation
/// pipeline depends on.
pub struct Bmp085<I, D> {
    i2c: I,
    delay: D,
    oversampling: Oversampling,
    calibration: Option<Calibration>,
}

impl<I, D> Bmp085<I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Creates a driver with the highest oversampling setting.
    pub fn new(i2c: I, delay: D) -> Self {
        Self::with_oversampling(i2c, delay, Oversampling::UltraHighResolution)
    }

    pub fn with_oversampling(i2c: I, delay: D, oversampling: Oversampling) -> Self {
        Self {
            i2c,
            delay,
            oversampling,
            calibration: None,
        }
    }

    async fn register_read(&mut self, register: u8, buffer: &mut [u8]) -> Result<(), I::Error> {
        self.i2c.write_read(ADDRESS, &[register], buffer).await
    }

    async fn command(&mut self, command: u8) -> Result<(), I::Error> {
        self.i2c.write(ADDRESS, &[REG_CONTROL, command]).await
    }

    fn calibration(&self) -> Result<Calibration, SensorError> {
        self.calibration.ok_or(SensorError::NotInitialized {
            sensor: SENSOR_NAME,
        })
    }

    /// Uncompensated temperature (UT in the datasheet).
    async fn read_raw_temperature(&mut self) -> Result<i32, SensorError> {
        self.command(CMD_READ_TEMPERATURE).await.map_err(|error| {
            log::error!("Failed to start BMP085 temperature conversion: {error:?}");
            SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "temperature",
                details: "conversion start rejected",
            }
        })?;

        self.delay.delay_ms(TEMPERATURE_CONVERSION_MS).await;

        let mut raw = [0u8; 2];
        self.register_read(REG_DATA, &mut raw).await.map_err(|error| {
            log::error!("Failed to read BMP085 temperature data: {error:?}");
            SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "temperature",
                details: "data register read failed",
            }
        })?;

        Ok(i32::from(u16::from_be_bytes(raw)))
    }

    /// Uncompensated pressure (UP in the datasheet), already shifted for
    /// the active oversampling setting.
    async fn read_raw_pressure(&mut self) -> Result<i32, SensorError> {
        let oss = self.oversampling as u8;

        self.command(CMD_READ_PRESSURE | (oss << 6))
            .await
            .map_err(|error| {
                log::error!("Failed to start BMP085 pressure conversion: {error:?}");
                SensorError::ReadFailed {
                    sensor: SENSOR_NAME,
                    operation: "pressure",
                    details: "conversion start rejected",
                }
            })?;

        self.delay
            .delay_ms(self.oversampling.conversion_delay_ms())
            .await;

        let mut raw = [0u8; 3];
        self.register_read(REG_DATA, &mut raw).await.map_err(|error| {
            log::error!("Failed to read BMP085 pressure data: {error:?}");
            SensorError::ReadFailed {
                sensor: SENSOR_NAME,
                operation: "pressure",
                details: "data register read failed",
            }
        })?;

        let raw = (u32::from(raw[0]) << 16) | (u32::from(raw[1]) << 8) | u32::from(raw[2]);
        Ok((raw >> (8 - oss)) as i32)
    }
}

impl<I, D> Barometer for Bmp085<I, D>
where
    I: I2c,
    D: DelayNs,
{
    async fn init(&mut self) -> Result<(), SensorError> {
        let mut chip_id = [0u8; 1];
        self.register_read(REG_CHIP_ID, &mut chip_id)
            .await
            .map_err(|error| {
                log::error!("BMP085 did not answer the chip id probe: {error:?}");
                SensorError::NotDetected {
                    sensor: SENSOR_NAME,
                }
            })?;

        if chip_id[0] != CHIP_ID {
            log::error!(
                "Unexpected chip id 0x{:02X} at bus address 0x{ADDRESS:02X} (expected 0x{CHIP_ID:02X})",
                chip_id[0]
            );
            return Err(SensorError::NotDetected {
                sensor: SENSOR_NAME,
            });
        }

        let mut eeprom = [0u8; 22];
        self.register_read(REG_CALIBRATION, &mut eeprom)
            .await
            .map_err(|error| {
                log::error!("Failed to read BMP085 calibration EEPROM: {error:?}");
                SensorError::InitializationFailed {
                    sensor: SENSOR_NAME,
                    details: "calibration EEPROM read failed",
                }
            })?;

        let calibration = Calibration::from_eeprom(&eeprom);
        log::debug!("BMP085 calibration loaded: {calibration:?}");
        self.calibration = Some(calibration);

        Ok(())
    }

    async fn read_temperature(&mut self) -> Result<f32, SensorError> {
        let calibration = self.calibration()?;
        let raw = self.read_raw_temperature().await?;
        let b5 = compute_b5(&calibration, raw);

        Ok(compensate_temperature(b5) as f32 / 10.0)
    }

    async fn read_pressure(&mut self) -> Result<f32, SensorError> {
        let calibration = self.calibration()?;

        // The compensation needs the fine-temperature term from a conversion
        // taken moments before, so every pressure read starts with a fresh
        // temperature conversion.
        let raw_temperature = self.read_raw_temperature().await?;
        let b5 = compute_b5(&calibration, raw_temperature);
        let raw_pressure = self.read_raw_pressure().await?;

        Ok(compensate_pressure(&calibration, b5, raw_pressure, self.oversampling) as f32)
    }
}
