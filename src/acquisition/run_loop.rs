// AcquisitionLoop - background sampling on a fixed interval
//
// One tick: read the sensor, timestamp and convert the reading, ingest it
// under the shared lock, then (lock released) hand any session the append
// force-stopped to the persist worker. The tick never waits on the store.
// A failed read skips the tick and never ends the loop.
// `spawn` runs ticks on a dedicated thread until the handle is stopped or
// dropped.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::context::AcquisitionContext;
use crate::error::{RecordingError, SensorError};

use super::buffer::Sample;
use super::persist::PersistWorker;

/// What a single tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Sample appended to the live window (and recording buffer if active)
    Sampled(Sample),
    /// Sample filled the recording buffer; the session was queued for saving
    ForcedStop { sample: Sample, sample_count: usize },
    /// Sensor read failed; buffers untouched
    ReadFailed(SensorError),
    /// Shared buffers unavailable; buffers untouched
    LockFailed(RecordingError),
}

pub struct AcquisitionLoop {
    context: Arc<AcquisitionContext>,
    interval: Duration,
    persist: PersistWorker,
}

impl AcquisitionLoop {
    /// Loop using the context's configured sample interval
    ///
    /// Starts the persist worker thread.
    pub fn new(context: Arc<AcquisitionContext>) -> std::io::Result<Self> {
        let interval = context.config().sample_interval();
        Self::with_interval(context, interval)
    }

    pub fn with_interval(
        context: Arc<AcquisitionContext>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let persist = PersistWorker::spawn(context.clone())?;
        Ok(Self {
            context,
            interval,
            persist,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until every force-stopped session queued so far is saved
    pub fn flush_persist(&self) -> bool {
        self.persist.flush()
    }

    /// Run one acquisition iteration
    pub fn tick(&self) -> TickOutcome {
        let ctx = &self.context;
        ctx.counters().record_tick();

        let celsius = match ctx.sensor().read_celsius() {
            Ok(celsius) => celsius,
            Err(err) => {
                ctx.counters().record_read(false);
                tracing::warn!("[AcquisitionLoop] Sensor read failed, skipping tick: {}", err);
                return TickOutcome::ReadFailed(err);
            }
        };
        ctx.counters().record_read(true);

        let unit = ctx.config().display_unit;
        let sample = Sample::new(ctx.clock().now(), unit.from_celsius(celsius), unit);
        tracing::debug!(
            "[AcquisitionLoop] {:.1}{} at {}",
            sample.temperature,
            unit.symbol(),
            sample.timestamp
        );

        match ctx.ingest(sample) {
            Ok(None) => TickOutcome::Sampled(sample),
            Ok(Some(finished)) => {
                ctx.counters().record_forced_stop();
                let sample_count = finished.samples.len();
                tracing::info!(
                    "[AcquisitionLoop] Recording buffer full after {} samples, forced stop",
                    sample_count
                );
                if let Err(finished) = self.persist.submit(finished) {
                    tracing::error!(
                        "[AcquisitionLoop] Persist worker gone, saving on the acquisition thread"
                    );
                    ctx.finalize(finished);
                }
                TickOutcome::ForcedStop {
                    sample,
                    sample_count,
                }
            }
            Err(err) => {
                tracing::error!("[AcquisitionLoop] Cannot ingest sample: {}", err);
                TickOutcome::LockFailed(err)
            }
        }
    }

    /// Tick every interval until `shutdown` receives a message or its sender
    /// is dropped
    pub fn run(&self, shutdown: mpsc::Receiver<()>) {
        tracing::info!(
            "[AcquisitionLoop] Starting with {} sensor every {:?}",
            self.context.sensor().name(),
            self.interval
        );
        loop {
            self.tick();
            match shutdown.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::info!("[AcquisitionLoop] Shutdown requested, exiting");
    }

    /// Run on a dedicated thread named `acquisition`
    ///
    /// The thread drains the persist queue before it exits.
    pub fn spawn(self) -> std::io::Result<AcquisitionHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || self.run(shutdown_rx))?;
        Ok(AcquisitionHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

/// Handle to a spawned acquisition thread
///
/// Dropping the handle signals the loop to stop without waiting for it.
pub struct AcquisitionHandle {
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AcquisitionHandle {
    /// Signal the loop and wait for the current tick and any queued saves
    pub fn stop(mut self) {
        self.signal();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("[AcquisitionLoop] Acquisition thread panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |thread| thread.is_finished())
    }

    fn signal(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // Receiver gone means the loop already exited.
            let _ = tx.send(());
        }
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AcquisitionConfig;
    use crate::error::StoreError;
    use crate::recording::{RecordingState, SessionRecord};
    use crate::sensor::{ScriptedSensor, SteppedClock};
    use crate::store::{InMemoryStore, RoastId, RoastStore, RoastSummary};
    use crate::units::TemperatureUnit;
    use std::sync::Mutex;
    use std::time::Instant;

    fn context_with_store(
        script: Vec<Result<f64, SensorError>>,
        capacity: usize,
        store: Arc<dyn RoastStore>,
    ) -> Arc<AcquisitionContext> {
        let config = AcquisitionConfig {
            live_window: 4,
            recording_capacity: capacity,
            display_unit: TemperatureUnit::Fahrenheit,
            ..AcquisitionConfig::default()
        };
        Arc::new(AcquisitionContext::new(
            config,
            Arc::new(ScriptedSensor::new(script)),
            Arc::new(SteppedClock::one_hertz()),
            store,
        ))
    }

    fn context(
        script: Vec<Result<f64, SensorError>>,
        capacity: usize,
    ) -> (Arc<AcquisitionContext>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (context_with_store(script, capacity, store.clone()), store)
    }

    /// Store whose `save` blocks until released (or five seconds pass)
    struct GatedStore {
        inner: InMemoryStore,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl RoastStore for GatedStore {
        fn save(&self, record: &SessionRecord) -> Result<RoastId, StoreError> {
            if let Ok(release) = self.release.lock() {
                let _ = release.recv_timeout(Duration::from_secs(5));
            }
            self.inner.save(record)
        }

        fn list_summaries(&self) -> Result<Vec<RoastSummary>, StoreError> {
            self.inner.list_summaries()
        }

        fn load(&self, id: RoastId) -> Result<SessionRecord, StoreError> {
            self.inner.load(id)
        }

        fn update_bean_info(&self, id: RoastId, bean_info: Option<String>) -> Result<(), StoreError> {
            self.inner.update_bean_info(id, bean_info)
        }

        fn delete(&self, id: RoastId) -> Result<(), StoreError> {
            self.inner.delete(id)
        }
    }

    #[test]
    fn test_tick_converts_to_display_unit() {
        let (ctx, _store) = context(vec![Ok(100.0)], 5);
        let acquisition = AcquisitionLoop::new(ctx).unwrap();
        match acquisition.tick() {
            TickOutcome::Sampled(sample) => {
                assert_eq!(sample.unit, TemperatureUnit::Fahrenheit);
                assert!((sample.temperature - 212.0).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_skips_tick() {
        let (ctx, _store) = context(
            vec![
                Ok(20.0),
                Err(SensorError::Unavailable {
                    details: "thermocouple unplugged".into(),
                }),
                Ok(22.0),
            ],
            5,
        );
        let acquisition = AcquisitionLoop::new(ctx.clone()).unwrap();

        assert!(matches!(acquisition.tick(), TickOutcome::Sampled(_)));
        assert!(matches!(acquisition.tick(), TickOutcome::ReadFailed(_)));
        assert!(matches!(acquisition.tick(), TickOutcome::Sampled(_)));

        let view = ctx.get_live_series().unwrap();
        assert_eq!(view.series().unwrap().temperatures.len(), 2);

        let stats = ctx.acquisition_stats();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.successful_reads, 2);
        assert_eq!(stats.read_failures, 1);
    }

    #[test]
    fn test_forced_stop_outcome() {
        let (ctx, store) = context(vec![Ok(20.0), Ok(21.0), Ok(22.0)], 2);
        let acquisition = AcquisitionLoop::new(ctx.clone()).unwrap();
        ctx.toggle_recording(true, None).unwrap();

        assert!(matches!(acquisition.tick(), TickOutcome::Sampled(_)));
        assert!(matches!(
            acquisition.tick(),
            TickOutcome::ForcedStop {
                sample_count: 2,
                ..
            }
        ));
        assert!(matches!(acquisition.tick(), TickOutcome::Sampled(_)));
        assert!(acquisition.flush_persist());

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load(1).unwrap().temperatures.len(), 2);
        assert_eq!(ctx.acquisition_stats().forced_stops, 1);
        assert_eq!(
            ctx.recording_status().unwrap().state,
            RecordingState::Idle
        );
    }

    #[test]
    fn test_forced_stop_does_not_wait_for_store() {
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: InMemoryStore::new(),
            release: Mutex::new(release_rx),
        });
        let ctx = context_with_store(vec![Ok(20.0), Ok(21.0), Ok(22.0)], 2, store.clone());
        let acquisition = AcquisitionLoop::new(ctx.clone()).unwrap();
        ctx.toggle_recording(true, None).unwrap();
        acquisition.tick();

        let started = Instant::now();
        assert!(matches!(
            acquisition.tick(),
            TickOutcome::ForcedStop { .. }
        ));
        assert!(matches!(acquisition.tick(), TickOutcome::Sampled(_)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(store.inner.save_count(), 0);
        assert_eq!(
            ctx.recording_status().unwrap().state,
            RecordingState::Idle
        );

        release_tx.send(()).unwrap();
        assert!(acquisition.flush_persist());
        assert_eq!(store.inner.save_count(), 1);
        assert_eq!(ctx.acquisition_stats().sessions_saved, 1);
    }

    #[test]
    fn test_spawned_loop_stops_on_request() {
        let (ctx, _store) = context(vec![Ok(20.0); 1000], 5);
        let handle = AcquisitionLoop::with_interval(ctx.clone(), Duration::from_millis(5))
            .unwrap()
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while ctx.acquisition_stats().ticks < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        handle.stop();

        let ticks = ctx.acquisition_stats().ticks;
        assert!(ticks >= 3);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(ctx.acquisition_stats().ticks, ticks);
    }

    #[test]
    fn test_stop_waits_for_queued_saves() {
        let (ctx, store) = context(vec![Ok(20.0); 1000], 2);
        ctx.toggle_recording(true, None).unwrap();
        let handle = AcquisitionLoop::with_interval(ctx.clone(), Duration::from_millis(2))
            .unwrap()
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while ctx.acquisition_stats().forced_stops < 1 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        handle.stop();

        assert_eq!(ctx.acquisition_stats().forced_stops, 1);
        assert_eq!(store.save_count(), 1);
    }
}
