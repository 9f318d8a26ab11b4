// SharedBuffers - everything guarded by the single acquisition lock
//
// The live window, the recording controller (recording buffer + markers) and
// the last-updated timestamp are only ever touched while the one mutex in
// `AcquisitionContext` is held. Methods here are plain in-memory operations;
// callers copy what they need out and release the lock before doing I/O.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recording::{FinishedSession, RecordingController};

use super::buffer::{Sample, SampleBuffer};

#[derive(Debug)]
pub struct SharedBuffers {
    pub live: SampleBuffer,
    pub recording: RecordingController,
    /// Timestamp of the most recent successful read
    pub last_updated: Option<DateTime<Utc>>,
}

impl SharedBuffers {
    pub fn new(live_window: usize, recording_capacity: usize) -> Self {
        Self {
            live: SampleBuffer::new(live_window),
            recording: RecordingController::new(recording_capacity),
            last_updated: None,
        }
    }

    /// Append one sample to the live window and, while recording, to the
    /// recording buffer.
    ///
    /// Returns the finished session when this append forced a stop.
    pub fn ingest(&mut self, sample: Sample) -> Option<FinishedSession> {
        self.live.push(sample);
        self.last_updated = Some(sample.timestamp);
        self.recording.append(sample)
    }
}

/// Counters updated by the acquisition loop and the finalize step
#[derive(Debug, Default)]
pub struct AcquisitionCounters {
    ticks: AtomicU64,
    successful_reads: AtomicU64,
    read_failures: AtomicU64,
    forced_stops: AtomicU64,
    sessions_saved: AtomicU64,
    persist_failures: AtomicU64,
}

/// Point-in-time copy of [`AcquisitionCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionStats {
    pub ticks: u64,
    pub successful_reads: u64,
    pub read_failures: u64,
    pub forced_stops: u64,
    pub sessions_saved: u64,
    pub persist_failures: u64,
}

impl AcquisitionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read(&self, ok: bool) {
        let counter = if ok {
            &self.successful_reads
        } else {
            &self.read_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forced_stop(&self) {
        self.forced_stops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist(&self, ok: bool) {
        let counter = if ok {
            &self.sessions_saved
        } else {
            &self.persist_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AcquisitionStats {
        AcquisitionStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            successful_reads: self.successful_reads.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            forced_stops: self.forced_stops.load(Ordering::Relaxed),
            sessions_saved: self.sessions_saved.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}
