//! Recording session state machine.
//!
//! `RecordingController` is not synchronized on its own: it is owned by
//! [`SharedBuffers`](crate::acquisition::SharedBuffers) and every call happens
//! while the acquisition lock is held. Anything that does I/O (persisting a
//! finished session) receives a [`FinishedSession`] copy and runs after the
//! lock is released.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::acquisition::{Sample, SampleBuffer};
use crate::error::RecordingError;

use super::marker::{MarkerSet, MarkerState, MilestoneKind, MilestoneMarker};

/// Recording controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Why a session left the `Recording` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// User toggled recording off
    UserToggle,
    /// Recording buffer reached capacity
    BufferFull,
}

/// Session being recorded right now
#[derive(Debug, Clone)]
pub struct RecordingSession {
    started_at: DateTime<Utc>,
    samples: SampleBuffer,
    bean_info: Option<String>,
    markers: MarkerSet,
}

impl RecordingSession {
    fn new(started_at: DateTime<Utc>, capacity: usize, bean_info: Option<String>) -> Self {
        Self {
            started_at,
            samples: SampleBuffer::new(capacity),
            bean_info,
            markers: MarkerSet::new(),
        }
    }

    fn finish(mut self, reason: StopReason) -> FinishedSession {
        FinishedSession {
            started_at: self.started_at,
            samples: self.samples.drain(),
            bean_info: self.bean_info,
            markers: self.markers,
            reason,
        }
    }
}

/// Copy of a session taken out of the shared buffers at stop time
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSession {
    /// When recording was toggled on
    pub started_at: DateTime<Utc>,
    pub samples: Vec<Sample>,
    pub bean_info: Option<String>,
    pub markers: MarkerSet,
    pub reason: StopReason,
}

/// Result of a milestone trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneUpdate {
    pub kind: MilestoneKind,
    /// `false` when the marker was already set and the call was a no-op
    pub newly_set: bool,
    pub marker: MilestoneMarker,
    pub markers: Vec<MarkerState>,
}

/// Snapshot of the controller for the view layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub state: RecordingState,
    pub started_at: Option<DateTime<Utc>>,
    pub sample_count: usize,
    pub capacity: usize,
    pub bean_info: Option<String>,
    pub markers: Vec<MilestoneMarker>,
    pub marker_states: Vec<MarkerState>,
    pub forced_stop_pending: bool,
}

/// Idle/Recording state machine with bounded recording buffer
#[derive(Debug)]
pub struct RecordingController {
    session: Option<RecordingSession>,
    capacity: usize,
    forced_stop_pending: bool,
}

impl RecordingController {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "recording capacity must be greater than 0");
        Self {
            session: None,
            capacity,
            forced_stop_pending: false,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.session.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `Idle → Recording`. Starts from an empty buffer and marker map.
    ///
    /// Returns `false` (and changes nothing) if already recording.
    pub fn start(&mut self, now: DateTime<Utc>, bean_info: Option<String>) -> bool {
        if self.session.is_some() {
            return false;
        }
        self.session = Some(RecordingSession::new(now, self.capacity, bean_info));
        // A fresh toggle-on supersedes an unpolled forced stop.
        self.forced_stop_pending = false;
        true
    }

    /// `Recording → Idle` on user request.
    ///
    /// `bean_info`, when given, replaces the text captured at start. Returns
    /// the session copy to persist, or `None` when idle or when nothing was
    /// recorded (empty sessions are discarded).
    pub fn stop(&mut self, bean_info: Option<String>) -> Option<FinishedSession> {
        let mut session = self.session.take()?;
        if bean_info.is_some() {
            session.bean_info = bean_info;
        }
        if session.samples.is_empty() {
            log::warn!(
                "[RecordingSession] Recording stopped with no samples; nothing will be saved"
            );
            return None;
        }
        Some(session.finish(StopReason::UserToggle))
    }

    /// Append a sample to the active session.
    ///
    /// When the append fills the recording buffer the session is force-stopped
    /// immediately, the one-shot forced-stop flag is raised, and the finished
    /// session is returned so the caller can persist it after unlocking.
    pub fn append(&mut self, sample: Sample) -> Option<FinishedSession> {
        let session = self.session.as_mut()?;
        session.samples.push(sample);
        if !session.samples.is_full() {
            return None;
        }

        let finished = self.session.take()?.finish(StopReason::BufferFull);
        self.forced_stop_pending = true;
        log::info!(
            "[RecordingSession] Recording buffer reached capacity ({} samples); forcing stop",
            self.capacity
        );
        Some(finished)
    }

    /// Mark a milestone at the most recently recorded sample.
    ///
    /// First write wins: re-triggering a kind that is already set returns the
    /// existing marker with `newly_set == false`.
    pub fn trigger_milestone(
        &mut self,
        kind: MilestoneKind,
    ) -> Result<MilestoneUpdate, RecordingError> {
        let session = self.session.as_mut().ok_or(RecordingError::NotRecording)?;

        let newly_set = if session.markers.is_set(kind) {
            false
        } else {
            let latest = *session
                .samples
                .latest()
                .ok_or(RecordingError::NoSamplesYet { kind })?;
            session.markers.set_once(kind, latest)
        };

        if newly_set {
            if let Some(sample) = session.markers.get(kind) {
                log::info!(
                    "[RecordingSession] {} marked at {} with temp {:.1}",
                    kind,
                    sample.timestamp,
                    sample.temperature
                );
            }
        }

        Ok(MilestoneUpdate {
            kind,
            newly_set,
            marker: MilestoneMarker {
                kind,
                sample: session.markers.get(kind).copied(),
            },
            markers: session.markers.states(true),
        })
    }

    /// Check-and-clear the forced-stop flag
    pub fn take_forced_stop(&mut self) -> bool {
        std::mem::take(&mut self.forced_stop_pending)
    }

    /// Markers of the active session (all unset when idle)
    pub fn markers(&self) -> Vec<MilestoneMarker> {
        self.session
            .as_ref()
            .map(|session| session.markers.markers())
            .unwrap_or_else(|| MarkerSet::new().markers())
    }

    pub fn status(&self) -> RecordingStatus {
        let recording = self.session.is_some();
        let empty = MarkerSet::new();
        let markers = self
            .session
            .as_ref()
            .map(|session| &session.markers)
            .unwrap_or(&empty);

        RecordingStatus {
            state: self.state(),
            started_at: self.session.as_ref().map(|session| session.started_at),
            sample_count: self.session.as_ref().map_or(0, |s| s.samples.len()),
            capacity: self.capacity,
            bean_info: self
                .session
                .as_ref()
                .and_then(|session| session.bean_info.clone()),
            markers: markers.markers(),
            marker_states: markers.states(recording),
            forced_stop_pending: self.forced_stop_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TemperatureUnit;
    use chrono::TimeDelta;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs)
    }

    fn sample(secs: i64, temp: f64) -> Sample {
        Sample::new(at(secs), temp, TemperatureUnit::Fahrenheit)
    }

    #[test]
    fn test_new_controller_is_idle() {
        let controller = RecordingController::new(10);
        assert_eq!(controller.state(), RecordingState::Idle);
        assert_eq!(controller.status().sample_count, 0);
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut controller = RecordingController::new(10);
        assert!(controller.start(at(0), Some("Ethiopia".into())));
        controller.append(sample(1, 70.0));
        assert!(!controller.start(at(5), None));
        assert_eq!(controller.status().sample_count, 1);
        assert_eq!(controller.status().bean_info.as_deref(), Some("Ethiopia"));
    }

    #[test]
    fn test_stop_without_samples_discards_session() {
        let mut controller = RecordingController::new(10);
        controller.start(at(0), None);
        assert!(controller.stop(None).is_none());
        assert_eq!(controller.state(), RecordingState::Idle);
    }

    #[test]
    fn test_stop_when_idle_returns_none() {
        let mut controller = RecordingController::new(10);
        assert!(controller.stop(Some("beans".into())).is_none());
    }

    #[test]
    fn test_stop_returns_samples_and_overrides_bean_info() {
        let mut controller = RecordingController::new(10);
        controller.start(at(0), Some("draft".into()));
        controller.append(sample(1, 70.0));
        controller.append(sample(2, 71.0));

        let finished = controller.stop(Some("Kenya AA".into())).unwrap();
        assert_eq!(finished.samples.len(), 2);
        assert_eq!(finished.bean_info.as_deref(), Some("Kenya AA"));
        assert_eq!(finished.reason, StopReason::UserToggle);
        assert_eq!(controller.state(), RecordingState::Idle);
    }

    #[test]
    fn test_append_when_idle_is_ignored() {
        let mut controller = RecordingController::new(2);
        assert!(controller.append(sample(0, 70.0)).is_none());
        assert!(!controller.take_forced_stop());
    }

    #[test]
    fn test_forced_stop_at_capacity() {
        let mut controller = RecordingController::new(3);
        controller.start(at(0), None);
        assert!(controller.append(sample(1, 70.0)).is_none());
        assert!(controller.append(sample(2, 71.0)).is_none());

        let finished = controller.append(sample(3, 72.0)).unwrap();
        assert_eq!(finished.samples.len(), 3);
        assert_eq!(finished.reason, StopReason::BufferFull);
        assert_eq!(controller.state(), RecordingState::Idle);

        assert!(controller.take_forced_stop());
        assert!(!controller.take_forced_stop());
    }

    #[test]
    fn test_start_clears_unpolled_forced_stop() {
        let mut controller = RecordingController::new(1);
        controller.start(at(0), None);
        assert!(controller.append(sample(1, 70.0)).is_some());
        assert!(controller.status().forced_stop_pending);

        controller.start(at(2), None);
        assert!(!controller.take_forced_stop());
    }

    #[test]
    fn test_milestone_requires_recording() {
        let mut controller = RecordingController::new(10);
        assert_eq!(
            controller.trigger_milestone(MilestoneKind::FirstCrackStart),
            Err(RecordingError::NotRecording)
        );
    }

    #[test]
    fn test_milestone_requires_a_sample() {
        let mut controller = RecordingController::new(10);
        controller.start(at(0), None);
        assert_eq!(
            controller.trigger_milestone(MilestoneKind::FirstCrackStart),
            Err(RecordingError::NoSamplesYet {
                kind: MilestoneKind::FirstCrackStart
            })
        );
    }

    #[test]
    fn test_milestone_first_write_wins() {
        let mut controller = RecordingController::new(10);
        controller.start(at(0), None);
        controller.append(sample(1, 390.0));

        let first = controller
            .trigger_milestone(MilestoneKind::FirstCrackStart)
            .unwrap();
        assert!(first.newly_set);
        assert_eq!(first.marker.sample, Some(sample(1, 390.0)));

        controller.append(sample(2, 395.0));
        let second = controller
            .trigger_milestone(MilestoneKind::FirstCrackStart)
            .unwrap();
        assert!(!second.newly_set);
        assert_eq!(second.marker.sample, Some(sample(1, 390.0)));
        assert!(!second.markers[0].enabled);
        assert!(second.markers[1].enabled);
    }

    #[test]
    fn test_markers_reset_with_new_session() {
        let mut controller = RecordingController::new(10);
        controller.start(at(0), None);
        controller.append(sample(1, 390.0));
        controller
            .trigger_milestone(MilestoneKind::FirstCrackStart)
            .unwrap();
        let finished = controller.stop(None).unwrap();
        assert!(finished.markers.is_set(MilestoneKind::FirstCrackStart));

        controller.start(at(10), None);
        assert!(controller.markers().iter().all(|m| m.sample.is_none()));
    }
}
