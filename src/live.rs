//! Live View Refresher.
//!
//! Turns a snapshot of the live window into a rendering-ready series. The
//! snapshot is taken under the acquisition lock by
//! [`AcquisitionContext::get_live_series`](crate::context::AcquisitionContext::get_live_series);
//! everything in this module works on owned copies and never touches shared
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acquisition::Sample;
use crate::recording::{MilestoneKind, MilestoneMarker};
use crate::units::{reference_lines, ReferenceLine, RoastStage, TemperatureUnit};

/// Padding applied above and below the plotted temperature range
pub const Y_PADDING: f64 = 5.0;

/// Axis range used before any sample exists
pub const EMPTY_Y_RANGE: [f64; 2] = [0.0, 100.0];

/// A set milestone positioned on the live chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMarker {
    pub kind: MilestoneKind,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSeries {
    pub timestamps: Vec<DateTime<Utc>>,
    pub temperatures: Vec<f64>,
    pub unit: TemperatureUnit,
    pub markers: Vec<LiveMarker>,
    pub y_range: [f64; 2],
    pub reference_lines: Vec<ReferenceLine>,
    pub last_updated: Option<DateTime<Utc>>,
    pub recording: bool,
    /// Roast stage reached by the latest reading
    pub stage: Option<RoastStage>,
}

/// Result of a live-view refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LiveView {
    /// The live window is still empty
    NoData { recording: bool },
    Series(LiveSeries),
}

impl LiveView {
    pub fn is_empty(&self) -> bool {
        matches!(self, LiveView::NoData { .. })
    }

    pub fn series(&self) -> Option<&LiveSeries> {
        match self {
            LiveView::Series(series) => Some(series),
            LiveView::NoData { .. } => None,
        }
    }
}

/// Everything copied out of the shared buffers for one refresh
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub samples: Vec<Sample>,
    pub markers: Vec<MilestoneMarker>,
    pub last_updated: Option<DateTime<Utc>>,
    pub recording: bool,
}

/// `[min - padding, max + padding]`, or `None` for no values
pub fn padded_range<I>(values: I, padding: f64) -> Option<[f64; 2]>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .fold(None, |range: Option<[f64; 2]>, value| match range {
            None => Some([value, value]),
            Some([lo, hi]) => Some([lo.min(value), hi.max(value)]),
        })
        .map(|[lo, hi]| [lo - padding, hi + padding])
}

/// Build the live view in `unit` from a snapshot
pub fn build_live_view(snapshot: LiveSnapshot, unit: TemperatureUnit) -> LiveView {
    if snapshot.samples.is_empty() {
        return LiveView::NoData {
            recording: snapshot.recording,
        };
    }

    let in_unit = |sample: &Sample| sample.temperature_in(unit);

    let timestamps = snapshot.samples.iter().map(|s| s.timestamp).collect();
    let temperatures: Vec<f64> = snapshot.samples.iter().map(in_unit).collect();
    let markers = snapshot
        .markers
        .iter()
        .filter_map(|marker| {
            marker.sample.as_ref().map(|sample| LiveMarker {
                kind: marker.kind,
                label: marker.kind.label().to_string(),
                timestamp: sample.timestamp,
                temperature: in_unit(sample),
            })
        })
        .collect();
    let stage = snapshot
        .samples
        .last()
        .and_then(|latest| RoastStage::for_temperature_f(latest.temperature_f()));
    let y_range =
        padded_range(temperatures.iter().copied(), Y_PADDING).unwrap_or(EMPTY_Y_RANGE);

    LiveView::Series(LiveSeries {
        timestamps,
        temperatures,
        unit,
        markers,
        y_range,
        reference_lines: reference_lines(unit),
        last_updated: snapshot.last_updated,
        recording: snapshot.recording,
        stage,
    })
}
