// AcquisitionContext: Dependency Injection Container
// Owns every piece of shared state the acquisition loop and the presentation
// layer have in common

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::acquisition::{AcquisitionCounters, AcquisitionStats, Sample, SharedBuffers};
use crate::config::{AcquisitionConfig, AppConfig};
use crate::error::{log_recording_error, log_store_error, RecordingError, SensorError, StoreError};
use crate::history::{self, HistoryComparison, HistoryEntry};
use crate::live::{build_live_view, LiveSnapshot, LiveView};
use crate::managers::{BroadcastChannelManager, RecordingEvent};
use crate::recording::{
    FinishedSession, MilestoneKind, MilestoneUpdate, RecordingStatus, SessionRecord, StopReason,
};
use crate::sensor::{create_sensor, Clock, SystemClock, TemperatureSensor};
use crate::store::{JsonFileStore, RoastId, RoastStore};

/// AcquisitionContext: dependency injection container for the roast monitor
///
/// Holds, behind a single mutex, the live sample window and the recording
/// controller, plus the collaborators chosen at construction time:
/// - TemperatureSensor adapter (simulated, IIO, or scripted)
/// - Clock used to timestamp samples
/// - RoastStore that receives finished sessions
/// - Broadcast channels for streaming clients
///
/// The acquisition loop and request handlers share one `Arc<AcquisitionContext>`.
/// Lock hold time is limited to in-memory copies; persistence always runs
/// after the guard is dropped.
pub struct AcquisitionContext {
    config: AcquisitionConfig,
    sensor: Arc<dyn TemperatureSensor>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn RoastStore>,
    shared: Mutex<SharedBuffers>,
    counters: AcquisitionCounters,
    broadcasts: BroadcastChannelManager,
}

impl AcquisitionContext {
    /// Create a context from explicit collaborators
    ///
    /// Zero buffer sizes are raised to 1; use [`AppConfig::sanitized`] to
    /// get the documented defaults instead.
    pub fn new(
        config: AcquisitionConfig,
        sensor: Arc<dyn TemperatureSensor>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn RoastStore>,
    ) -> Self {
        let shared = SharedBuffers::new(
            config.live_window.max(1),
            config.recording_capacity.max(1),
        );
        Self {
            config,
            sensor,
            clock,
            store,
            shared: Mutex::new(shared),
            counters: AcquisitionCounters::new(),
            broadcasts: BroadcastChannelManager::new(),
        }
    }

    /// Build the production context: configured sensor, system clock, and a
    /// JSON file store under `store.data_dir`
    pub fn from_config(config: &AppConfig) -> Result<Self, SensorError> {
        let sensor = create_sensor(&config.sensor)?;
        log::info!(
            "[AcquisitionContext] Using {} sensor, roasts stored in {:?}",
            sensor.name(),
            config.store.data_dir
        );
        Ok(Self::new(
            config.acquisition.clone(),
            sensor,
            Arc::new(SystemClock::new()),
            Arc::new(JsonFileStore::new(config.store.data_dir.clone())),
        ))
    }

    // ========================================================================
    // LOCK HELPER
    // Safe lock acquisition with typed error handling (no unwrap/expect)
    // ========================================================================

    fn lock_shared(&self) -> Result<MutexGuard<'_, SharedBuffers>, RecordingError> {
        self.shared.lock().map_err(|_| RecordingError::LockPoisoned {
            component: "shared_buffers".to_string(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn sensor(&self) -> &dyn TemperatureSensor {
        self.sensor.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn store(&self) -> &dyn RoastStore {
        self.store.as_ref()
    }

    pub(crate) fn counters(&self) -> &AcquisitionCounters {
        &self.counters
    }

    // ========================================================================
    // ACQUISITION SIDE (driven by AcquisitionLoop)
    // ========================================================================

    /// Append a sample to the shared buffers and publish it
    ///
    /// Returns the finished session when the append filled the recording
    /// buffer; the acquisition loop queues it for [`finalize`](Self::finalize)
    /// on its persist worker.
    pub(crate) fn ingest(&self, sample: Sample) -> Result<Option<FinishedSession>, RecordingError> {
        let forced = {
            let mut shared = self.lock_shared()?;
            shared.ingest(sample)
        };
        self.broadcasts.publish_sample(sample);
        Ok(forced)
    }

    /// Persist a finished session. Must be called without the lock held.
    ///
    /// Empty sessions are discarded. Store failures are logged and counted;
    /// the session is not retried.
    pub(crate) fn finalize(&self, finished: FinishedSession) -> Option<RoastId> {
        let reason = finished.reason;
        let sample_count = finished.samples.len();

        let roast_id = match SessionRecord::from_finished(&finished) {
            None => {
                log::warn!("[AcquisitionContext] Finished session has no samples, discarding");
                None
            }
            Some(record) => match self.store.save(&record) {
                Ok(id) => {
                    self.counters.record_persist(true);
                    log::info!(
                        "[AcquisitionContext] Saved roast {} ({} samples, {:?})",
                        id,
                        sample_count,
                        reason
                    );
                    Some(id)
                }
                Err(err) => {
                    self.counters.record_persist(false);
                    log_store_error(&err, "finalize");
                    None
                }
            },
        };

        self.broadcasts.publish_event(RecordingEvent::Stopped {
            reason,
            sample_count,
            roast_id,
        });
        roast_id
    }

    // ========================================================================
    // PRESENTATION API
    // ========================================================================

    /// Read-only snapshot of the live window for charting
    ///
    /// Returns [`LiveView::NoData`] until the first successful read.
    pub fn get_live_series(&self) -> Result<LiveView, RecordingError> {
        let snapshot = {
            let shared = self.lock_shared()?;
            LiveSnapshot {
                samples: shared.live.snapshot(),
                markers: shared.recording.markers(),
                last_updated: shared.last_updated,
                recording: shared.recording.is_recording(),
            }
        };
        Ok(build_live_view(snapshot, self.config.display_unit))
    }

    /// Start or stop recording
    ///
    /// Toggling into the current state is a no-op. Toggle-off always completes
    /// the transition to idle; the finished session is persisted after the
    /// lock is released and a failed save does not fail the toggle.
    /// `bean_info` given at stop replaces the text given at start.
    pub fn toggle_recording(
        &self,
        on: bool,
        bean_info: Option<String>,
    ) -> Result<RecordingStatus, RecordingError> {
        let bean_info = bean_info
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if on {
            let now = self.clock.now();
            let (started, status) = {
                let mut shared = self.lock_shared().map_err(|err| {
                    log_recording_error(&err, "toggle_recording");
                    err
                })?;
                let started = shared.recording.start(now, bean_info.clone());
                (started, shared.recording.status())
            };
            if started {
                log::info!("[AcquisitionContext] Recording started at {}", now);
                self.broadcasts.publish_event(RecordingEvent::Started {
                    started_at: now,
                    bean_info,
                });
            }
            return Ok(status);
        }

        let (was_recording, finished, status) = {
            let mut shared = self.lock_shared().map_err(|err| {
                log_recording_error(&err, "toggle_recording");
                err
            })?;
            let was_recording = shared.recording.is_recording();
            let finished = shared.recording.stop(bean_info);
            (was_recording, finished, shared.recording.status())
        };

        if was_recording {
            log::info!("[AcquisitionContext] Recording stopped by user");
            match finished {
                Some(finished) => {
                    self.finalize(finished);
                }
                None => {
                    self.broadcasts.publish_event(RecordingEvent::Stopped {
                        reason: StopReason::UserToggle,
                        sample_count: 0,
                        roast_id: None,
                    });
                }
            }
        }
        Ok(status)
    }

    /// Mark a milestone at the most recent recorded sample (first write wins)
    pub fn trigger_milestone(&self, kind: MilestoneKind) -> Result<MilestoneUpdate, RecordingError> {
        let update = {
            let mut shared = self.lock_shared()?;
            shared.recording.trigger_milestone(kind)
        }
        .map_err(|err| {
            log_recording_error(&err, "trigger_milestone");
            err
        })?;

        if update.newly_set {
            if let Some(sample) = update.marker.sample {
                self.broadcasts
                    .publish_event(RecordingEvent::MilestoneSet { kind, sample });
            }
        }
        Ok(update)
    }

    /// One-shot check-and-clear of the forced-stop flag
    pub fn poll_forced_stop(&self) -> Result<bool, RecordingError> {
        Ok(self.lock_shared()?.recording.take_forced_stop())
    }

    pub fn recording_status(&self) -> Result<RecordingStatus, RecordingError> {
        Ok(self.lock_shared()?.recording.status())
    }

    pub fn acquisition_stats(&self) -> AcquisitionStats {
        self.counters.snapshot()
    }

    pub fn subscribe_samples(&self) -> broadcast::Receiver<Sample> {
        self.broadcasts.subscribe_samples()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecordingEvent> {
        self.broadcasts.subscribe_events()
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        history::list_history(self.store.as_ref())
    }

    pub fn compare_roasts(&self, ids: &[RoastId]) -> Result<HistoryComparison, StoreError> {
        history::compare_roasts(self.store.as_ref(), ids)
    }

    pub fn load_roast(&self, id: RoastId) -> Result<SessionRecord, StoreError> {
        self.store.load(id)
    }

    pub fn update_bean_info(&self, id: RoastId, bean_info: Option<String>) -> Result<(), StoreError> {
        let bean_info = bean_info
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self.store.update_bean_info(id, bean_info).map_err(|err| {
            log_store_error(&err, "update_bean_info");
            err
        })
    }

    pub fn delete_roast(&self, id: RoastId) -> Result<(), StoreError> {
        self.store.delete(id).map_err(|err| {
            log_store_error(&err, "delete_roast");
            err
        })
    }
}

// ========================================================================
// TEST SUPPORT
// ========================================================================

#[cfg(test)]
impl AcquisitionContext {
    /// Context with a scripted sensor, 1 Hz stepped clock, and in-memory store
    pub fn new_test(
        celsius: &[f64],
        recording_capacity: usize,
    ) -> (Self, Arc<crate::store::InMemoryStore>) {
        let store = Arc::new(crate::store::InMemoryStore::new());
        let config = AcquisitionConfig {
            live_window: 10,
            recording_capacity,
            ..AcquisitionConfig::default()
        };
        let ctx = Self::new(
            config,
            Arc::new(crate::sensor::ScriptedSensor::from_celsius(celsius)),
            Arc::new(crate::sensor::SteppedClock::one_hertz()),
            store.clone(),
        );
        (ctx, store)
    }

    /// Read the sensor once and ingest, persisting any forced stop
    fn step(&self) {
        let celsius = self.sensor.read_celsius().unwrap();
        let sample = Sample::new(
            self.clock.now(),
            self.config.display_unit.from_celsius(celsius),
            self.config.display_unit,
        );
        if let Some(finished) = self.ingest(sample).unwrap() {
            self.finalize(finished);
        }
    }
}
