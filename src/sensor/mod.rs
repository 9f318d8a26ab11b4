//! Sensor adapter abstractions for the acquisition loop.
//!
//! The loop only needs two capabilities: something that yields a Celsius
//! reading (or fails), and something that tells the time. Both are traits so
//! the concrete adapter is chosen once, from configuration, when the
//! [`AcquisitionContext`](crate::context::AcquisitionContext) is built.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::{SensorConfig, SensorKind};
use crate::error::SensorError;

mod iio;
mod scripted;
mod simulated;

pub use iio::IioSensor;
pub use scripted::ScriptedSensor;
pub use simulated::SimulatedSensor;

/// Trait implemented by temperature sources.
///
/// Implementations must tolerate being called at ~1 Hz for the lifetime of
/// the process without leaking resources.
pub trait TemperatureSensor: Send + Sync {
    fn read_celsius(&self) -> Result<f64, SensorError>;
    fn name(&self) -> &str;
}

/// Trait representing the time source used to timestamp samples.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time that never steps backwards.
///
/// The wall-clock anchor is captured once; later timestamps add the
/// monotonic `Instant` offset, so elapsed-time series stay non-decreasing
/// even if the system clock is adjusted mid-roast.
pub struct SystemClock {
    wall_anchor: DateTime<Utc>,
    instant_anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            wall_anchor: Utc::now(),
            instant_anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let offset = TimeDelta::from_std(self.instant_anchor.elapsed())
            .unwrap_or_else(|_| TimeDelta::zero());
        self.wall_anchor
            .checked_add_signed(offset)
            .unwrap_or(self.wall_anchor)
    }
}

/// Deterministic clock for tests and headless demos.
///
/// Each call to `now()` returns the current time and then advances it by a
/// fixed step, so consecutive samples are exactly `step` apart.
pub struct SteppedClock {
    start: DateTime<Utc>,
    step_ms: i64,
    ticks: AtomicI64,
}

impl SteppedClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            start,
            step_ms: step.as_millis() as i64,
            ticks: AtomicI64::new(0),
        }
    }

    /// One-second steps starting at the Unix epoch.
    pub fn one_hertz() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, Duration::from_secs(1))
    }
}

impl Clock for SteppedClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + TimeDelta::milliseconds(tick * self.step_ms)
    }
}

/// Build the sensor adapter named by the configuration.
pub fn create_sensor(config: &SensorConfig) -> Result<Arc<dyn TemperatureSensor>, SensorError> {
    match config.kind {
        SensorKind::Simulated => Ok(Arc::new(SimulatedSensor::new(config.failure_rate))),
        SensorKind::Iio => {
            let path = config.path.clone().ok_or_else(|| SensorError::Unavailable {
                details: "sensor.path is required for the iio sensor".to_string(),
            })?;
            Ok(Arc::new(IioSensor::new(path, config.scale)))
        }
    }
}
