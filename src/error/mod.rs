// Error types for the roast monitor
//
// One enum per concern (sensor, recording, store), each carrying a numeric
// error code so the HTTP layer and CLI can report failures uniformly.

mod recording;
mod sensor;
mod store;

pub use recording::{log_recording_error, RecordingError, RecordingErrorCodes};
pub use sensor::{log_sensor_error, SensorError, SensorErrorCodes};
pub use store::{log_store_error, StoreError, StoreErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
