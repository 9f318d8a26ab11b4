//! Configuration management
//!
//! Runtime configuration is loaded from a JSON file so sampling cadence,
//! buffer sizes, sensor selection, and storage location can change without
//! recompilation. Any missing or malformed file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::units::TemperatureUnit;

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "ROAST_MONITOR_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/roast_monitor.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Acquisition loop and buffer sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Delay between sensor reads
    pub sample_interval_ms: u64,
    /// Samples kept for the live chart (180 = three minutes at 1 Hz)
    pub live_window: usize,
    /// Samples a recording may hold before it is force-stopped (30 min at 1 Hz)
    pub recording_capacity: usize,
    /// Unit samples are converted into at acquisition time
    pub display_unit: TemperatureUnit,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            live_window: 180,
            recording_capacity: 1800,
            display_unit: TemperatureUnit::Fahrenheit,
        }
    }
}

impl AcquisitionConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}

/// Which sensor adapter to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[default]
    Simulated,
    Iio,
}

/// Sensor adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,
    /// sysfs attribute holding the raw reading (iio only)
    pub path: Option<PathBuf>,
    /// Multiplier from the raw integer to degrees Celsius
    pub scale: f64,
    /// Fraction of simulated reads that fail
    pub failure_rate: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Simulated,
            path: None,
            scale: 0.001,
            failure_rate: 0.0,
        }
    }
}

/// Roast storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/roasts"),
        }
    }
}

/// HTTP presentation layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8050".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or defaults if the file doesn't exist or the
    /// JSON is invalid. Out-of-range values are replaced by their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        };
        config.sanitized()
    }

    /// Load configuration from `$ROAST_MONITOR_CONFIG` or the default path
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from_file(path)
    }

    /// Replace values the acquisition core cannot run with
    pub fn sanitized(mut self) -> Self {
        let defaults = AcquisitionConfig::default();
        let acquisition = &mut self.acquisition;

        if acquisition.sample_interval_ms == 0 {
            log::warn!("[Config] sample_interval_ms must be > 0, using default");
            acquisition.sample_interval_ms = defaults.sample_interval_ms;
        }
        if acquisition.live_window == 0 {
            log::warn!("[Config] live_window must be > 0, using default");
            acquisition.live_window = defaults.live_window;
        }
        if acquisition.recording_capacity == 0 {
            log::warn!("[Config] recording_capacity must be > 0, using default");
            acquisition.recording_capacity = defaults.recording_capacity;
        }
        if !(0.0..=1.0).contains(&self.sensor.failure_rate) {
            log::warn!("[Config] sensor.failure_rate must be within 0..=1, using 0");
            self.sensor.failure_rate = 0.0;
        }
        self
    }
}
