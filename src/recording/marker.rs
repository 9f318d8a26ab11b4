//! Milestone markers tying a roast phase to the sample at which it was seen.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::acquisition::Sample;

/// Roast phases a user can mark during a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    FirstCrackStart,
    SecondCrackStart,
}

impl MilestoneKind {
    pub const ALL: [MilestoneKind; 2] = [
        MilestoneKind::FirstCrackStart,
        MilestoneKind::SecondCrackStart,
    ];

    /// Button label shown to the roaster
    pub fn label(self) -> &'static str {
        match self {
            MilestoneKind::FirstCrackStart => "1st Crack Start",
            MilestoneKind::SecondCrackStart => "2nd Crack Start",
        }
    }

    /// Identifier used in URLs and JSON
    pub fn slug(self) -> &'static str {
        match self {
            MilestoneKind::FirstCrackStart => "first_crack_start",
            MilestoneKind::SecondCrackStart => "second_crack_start",
        }
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MilestoneKind {
    type Err = String;

    /// Accepts the slug (`first_crack_start`), kebab case, or the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        MilestoneKind::ALL
            .iter()
            .copied()
            .find(|kind| {
                normalized == kind.slug()
                    || normalized == kind.label().to_ascii_lowercase().replace(' ', "_")
            })
            .ok_or_else(|| format!("unknown milestone: {}", s))
    }
}

/// A milestone and the sample it was attributed to, if it has been set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MilestoneMarker {
    pub kind: MilestoneKind,
    pub sample: Option<Sample>,
}

/// Per-kind marker state, used to enable or disable milestone buttons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerState {
    pub kind: MilestoneKind,
    pub label: String,
    pub set: bool,
    /// A marker can be triggered only while recording and only once
    pub enabled: bool,
}

/// Markers of one recording session. First write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: BTreeMap<MilestoneKind, Sample>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the marker for `kind` unless it is already set.
    ///
    /// Returns `true` when this call set the marker.
    pub fn set_once(&mut self, kind: MilestoneKind, sample: Sample) -> bool {
        if self.markers.contains_key(&kind) {
            return false;
        }
        self.markers.insert(kind, sample);
        true
    }

    pub fn get(&self, kind: MilestoneKind) -> Option<&Sample> {
        self.markers.get(&kind)
    }

    pub fn is_set(&self, kind: MilestoneKind) -> bool {
        self.markers.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// One marker per known kind; unset kinds have no sample
    pub fn markers(&self) -> Vec<MilestoneMarker> {
        MilestoneKind::ALL
            .iter()
            .map(|kind| MilestoneMarker {
                kind: *kind,
                sample: self.markers.get(kind).copied(),
            })
            .collect()
    }

    pub fn states(&self, recording: bool) -> Vec<MarkerState> {
        MilestoneKind::ALL
            .iter()
            .map(|kind| {
                let set = self.is_set(*kind);
                MarkerState {
                    kind: *kind,
                    label: kind.label().to_string(),
                    set,
                    enabled: recording && !set,
                }
            })
            .collect()
    }
}
