use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::SensorError;

use super::TemperatureSensor;

/// Sensor that replays a fixed script of readings.
///
/// Once the script runs out every read fails with [`SensorError::Exhausted`],
/// which the acquisition loop treats like any other skipped tick.
pub struct ScriptedSensor {
    script: Mutex<VecDeque<Result<f64, SensorError>>>,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Result<f64, SensorError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }

    /// Script of successful Celsius readings.
    pub fn from_celsius(readings: &[f64]) -> Self {
        Self::new(readings.iter().copied().map(Ok).collect())
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|script| script.len()).unwrap_or(0)
    }
}

impl TemperatureSensor for ScriptedSensor {
    fn read_celsius(&self) -> Result<f64, SensorError> {
        let mut script = self.script.lock().map_err(|_| SensorError::Unavailable {
            details: "scripted sensor lock poisoned".to_string(),
        })?;
        script.pop_front().unwrap_or(Err(SensorError::Exhausted))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
