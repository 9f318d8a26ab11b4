// BroadcastChannelManager: tokio broadcast channels for live streaming
// Single Responsibility: channel lifecycle and subscription

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::acquisition::Sample;
use crate::recording::{MilestoneKind, StopReason};
use crate::store::RoastId;

/// Sample channel depth: several minutes of backlog at 1 Hz
const SAMPLE_CHANNEL_CAPACITY: usize = 256;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Recording lifecycle notifications for streaming clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecordingEvent {
    Started {
        started_at: DateTime<Utc>,
        bean_info: Option<String>,
    },
    Stopped {
        reason: StopReason,
        sample_count: usize,
        /// Id assigned by the store, absent when nothing was saved
        roast_id: Option<RoastId>,
    },
    MilestoneSet {
        kind: MilestoneKind,
        sample: Sample,
    },
}

/// Owns the sample and recording-event broadcast channels
///
/// Both channels exist for the lifetime of the manager, so publishing never
/// races with initialization. Publishing with no subscribers is not an error;
/// subscribers that fall behind observe `RecvError::Lagged`.
pub struct BroadcastChannelManager {
    samples: broadcast::Sender<Sample>,
    events: broadcast::Sender<RecordingEvent>,
}

impl BroadcastChannelManager {
    pub fn new() -> Self {
        let (samples, _) = broadcast::channel(SAMPLE_CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { samples, events }
    }

    // ========================================================================
    // SAMPLE CHANNEL
    // ========================================================================

    /// Publish an acquired sample; returns the number of receivers reached
    pub fn publish_sample(&self, sample: Sample) -> usize {
        self.samples.send(sample).unwrap_or(0)
    }

    pub fn subscribe_samples(&self) -> broadcast::Receiver<Sample> {
        self.samples.subscribe()
    }

    // ========================================================================
    // RECORDING EVENT CHANNEL
    // ========================================================================

    pub fn publish_event(&self, event: RecordingEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecordingEvent> {
        self.events.subscribe()
    }

    pub fn subscriber_counts(&self) -> (usize, usize) {
        (self.samples.receiver_count(), self.events.receiver_count())
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
