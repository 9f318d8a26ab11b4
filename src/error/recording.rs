// Recording session error types and constants

use crate::error::ErrorCode;
use crate::recording::MilestoneKind;
use log::error;
use std::fmt;

/// Recording error code constants
///
/// Error code range: 2001-2003
pub struct RecordingErrorCodes {}

impl RecordingErrorCodes {
    /// Operation requires an active recording session
    pub const NOT_RECORDING: i32 = 2001;

    /// Shared buffer lock was poisoned
    pub const LOCK_POISONED: i32 = 2002;

    /// Milestone triggered before the session recorded any sample
    pub const NO_SAMPLES_YET: i32 = 2003;
}

/// Log a recording error with structured context
pub fn log_recording_error(err: &RecordingError, context: &str) {
    error!(
        "Recording error in {}: code={}, component=RecordingController, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Recording session errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// No recording session is active
    NotRecording,

    /// Mutex guarding the shared buffers was poisoned
    LockPoisoned { component: String },

    /// Milestone requested while the recording buffer is still empty
    NoSamplesYet { kind: MilestoneKind },
}

impl ErrorCode for RecordingError {
    fn code(&self) -> i32 {
        match self {
            RecordingError::NotRecording => RecordingErrorCodes::NOT_RECORDING,
            RecordingError::LockPoisoned { .. } => RecordingErrorCodes::LOCK_POISONED,
            RecordingError::NoSamplesYet { .. } => RecordingErrorCodes::NO_SAMPLES_YET,
        }
    }

    fn message(&self) -> String {
        match self {
            RecordingError::NotRecording => {
                "No recording in progress. Toggle recording on first.".to_string()
            }
            RecordingError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            RecordingError::NoSamplesYet { kind } => {
                format!("Cannot mark {} before the first sample is recorded", kind)
            }
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordingError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for RecordingError {}
