use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SensorError;

use super::TemperatureSensor;

const AMBIENT_C: f64 = 20.0;
const PLATEAU_C: f64 = 235.0;
/// Approach rate per read towards the plateau (first-order response).
const RATE: f64 = 0.004;
const JITTER_C: f64 = 0.3;

/// Simulated thermocouple following a roast-like heating curve.
///
/// Used when no hardware is attached. Each read moves the bean temperature a
/// small step towards the plateau and adds a little jitter; a configurable
/// fraction of reads fail to exercise the skipped-tick path.
pub struct SimulatedSensor {
    state: Mutex<SimulatedState>,
    failure_rate: f64,
}

struct SimulatedState {
    temperature_c: f64,
    rng: StdRng,
}

impl SimulatedSensor {
    pub fn new(failure_rate: f64) -> Self {
        Self::with_rng(failure_rate, StdRng::from_entropy())
    }

    /// Deterministic simulator for tests.
    pub fn seeded(failure_rate: f64, seed: u64) -> Self {
        Self::with_rng(failure_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(failure_rate: f64, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                temperature_c: AMBIENT_C,
                rng,
            }),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

impl TemperatureSensor for SimulatedSensor {
    fn read_celsius(&self) -> Result<f64, SensorError> {
        let mut state = self.state.lock().map_err(|_| SensorError::Unavailable {
            details: "simulated sensor lock poisoned".to_string(),
        })?;

        if self.failure_rate > 0.0 && state.rng.gen_bool(self.failure_rate) {
            return Err(SensorError::Unavailable {
                details: "simulated thermocouple fault".to_string(),
            });
        }

        state.temperature_c += (PLATEAU_C - state.temperature_c) * RATE;
        let jitter = state.rng.gen_range(-JITTER_C..=JITTER_C);
        Ok(state.temperature_c + jitter)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
