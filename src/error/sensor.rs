// Sensor error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sensor error code constants
///
/// Error code range: 1001-1004
pub struct SensorErrorCodes {}

impl SensorErrorCodes {
    /// Sensor did not answer or reported a fault
    pub const UNAVAILABLE: i32 = 1001;

    /// Sensor answered with something that is not a temperature
    pub const INVALID_READING: i32 = 1002;

    /// I/O failure talking to the sensor
    pub const IO: i32 = 1003;

    /// Scripted sensor has no readings left
    pub const EXHAUSTED: i32 = 1004;
}

/// Log a sensor error with structured context
///
/// Read failures are transient; callers log them and skip the tick.
pub fn log_sensor_error(err: &SensorError, context: &str) {
    error!(
        "Sensor error in {}: code={}, component=TemperatureSensor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Temperature sensor read failures
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Sensor not reachable or reported a fault
    Unavailable { details: String },

    /// Raw value could not be interpreted as a temperature
    InvalidReading { raw: String },

    /// Underlying I/O error
    Io { details: String },

    /// No more scripted readings
    Exhausted,
}

impl ErrorCode for SensorError {
    fn code(&self) -> i32 {
        match self {
            SensorError::Unavailable { .. } => SensorErrorCodes::UNAVAILABLE,
            SensorError::InvalidReading { .. } => SensorErrorCodes::INVALID_READING,
            SensorError::Io { .. } => SensorErrorCodes::IO,
            SensorError::Exhausted => SensorErrorCodes::EXHAUSTED,
        }
    }

    fn message(&self) -> String {
        match self {
            SensorError::Unavailable { details } => format!("Sensor unavailable: {}", details),
            SensorError::InvalidReading { raw } => {
                format!("Sensor returned an invalid reading: {:?}", raw)
            }
            SensorError::Io { details } => format!("Sensor I/O error: {}", details),
            SensorError::Exhausted => "Sensor script exhausted".to_string(),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensorError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SensorError {}

impl From<std::io::Error> for SensorError {
    fn from(err: std::io::Error) -> Self {
        SensorError::Io {
            details: err.to_string(),
        }
    }
}
