//! Persisted representation of a finished roast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acquisition::Sample;
use crate::error::StoreError;

use super::marker::MilestoneKind;
use super::session::FinishedSession;

/// Finalized roast as written to the store.
///
/// Temperatures are always Fahrenheit. Elapsed times are seconds since the
/// first recorded sample, so `elapsed_seconds[0] == 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_time: DateTime<Utc>,
    pub elapsed_seconds: Vec<f64>,
    pub temperatures: Vec<f64>,
    #[serde(default)]
    pub bean_info: Option<String>,
    #[serde(default)]
    pub first_crack_elapsed_seconds: Option<f64>,
    #[serde(default)]
    pub first_crack_temp: Option<f64>,
    #[serde(default)]
    pub second_crack_elapsed_seconds: Option<f64>,
    #[serde(default)]
    pub second_crack_temp: Option<f64>,
    #[serde(default)]
    pub tasting_comments: Option<String>,
}

/// Elapsed seconds of each timestamp relative to the first one
pub fn elapsed_seconds(timestamps: &[DateTime<Utc>]) -> Vec<f64> {
    let Some(reference) = timestamps.first() else {
        return Vec::new();
    };
    timestamps
        .iter()
        .map(|timestamp| seconds_between(*reference, *timestamp))
        .collect()
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1_000.0)
}

impl SessionRecord {
    /// Build the persisted record from a finished session.
    ///
    /// Returns `None` for an empty session; those are never persisted.
    pub fn from_finished(session: &FinishedSession) -> Option<Self> {
        let first = session.samples.first()?;
        let start = first.timestamp;

        let timestamps: Vec<DateTime<Utc>> =
            session.samples.iter().map(|sample| sample.timestamp).collect();
        let temperatures = session.samples.iter().map(Sample::temperature_f).collect();

        let marker = |kind: MilestoneKind| {
            session
                .markers
                .get(kind)
                .map(|sample| (seconds_between(start, sample.timestamp), sample.temperature_f()))
        };
        let first_crack = marker(MilestoneKind::FirstCrackStart);
        let second_crack = marker(MilestoneKind::SecondCrackStart);

        Some(Self {
            start_time: start,
            elapsed_seconds: elapsed_seconds(&timestamps),
            temperatures,
            bean_info: session.bean_info.clone(),
            first_crack_elapsed_seconds: first_crack.map(|(t, _)| t),
            first_crack_temp: first_crack.map(|(_, temp)| temp),
            second_crack_elapsed_seconds: second_crack.map(|(t, _)| t),
            second_crack_temp: second_crack.map(|(_, temp)| temp),
            tasting_comments: None,
        })
    }

    /// Check the structural invariants of the schema
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.elapsed_seconds.len() != self.temperatures.len() {
            return Err(StoreError::InvalidRecord {
                reason: format!(
                    "elapsed_seconds has {} entries but temperatures has {}",
                    self.elapsed_seconds.len(),
                    self.temperatures.len()
                ),
            });
        }
        if self.temperatures.is_empty() {
            return Err(StoreError::InvalidRecord {
                reason: "record has no samples".to_string(),
            });
        }
        Ok(())
    }

    /// Elapsed time and temperature of a milestone, when both are present
    pub fn milestone(&self, kind: MilestoneKind) -> Option<(f64, f64)> {
        match kind {
            MilestoneKind::FirstCrackStart => {
                self.first_crack_elapsed_seconds.zip(self.first_crack_temp)
            }
            MilestoneKind::SecondCrackStart => {
                self.second_crack_elapsed_seconds.zip(self.second_crack_temp)
            }
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.elapsed_seconds.last().copied().unwrap_or(0.0)
    }
}
