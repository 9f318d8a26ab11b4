use std::fs;
use std::path::PathBuf;

use crate::error::SensorError;

use super::TemperatureSensor;

/// Thermocouple exposed by a kernel driver as a sysfs attribute.
///
/// Linux IIO and hwmon drivers (e.g. MAX31856 `in_temp_input`,
/// `temp1_input`) publish the temperature as an integer in millidegrees
/// Celsius; `scale` converts the raw integer into degrees.
pub struct IioSensor {
    path: PathBuf,
    scale: f64,
}

impl IioSensor {
    pub fn new(path: PathBuf, scale: f64) -> Self {
        Self { path, scale }
    }
}

impl TemperatureSensor for IioSensor {
    fn read_celsius(&self) -> Result<f64, SensorError> {
        let raw = fs::read_to_string(&self.path)?;
        let trimmed = raw.trim();
        let value: f64 = trimmed.parse().map_err(|_| SensorError::InvalidReading {
            raw: trimmed.to_string(),
        })?;
        let celsius = value * self.scale;
        if !celsius.is_finite() {
            return Err(SensorError::InvalidReading {
                raw: trimmed.to_string(),
            });
        }
        Ok(celsius)
    }

    fn name(&self) -> &str {
        "iio"
    }
}
