//! Sample acquisition: ring buffers, the lock-guarded shared state, the
//! background loop that feeds them, and the worker that persists
//! force-stopped sessions.

pub mod buffer;
pub mod persist;
pub mod run_loop;
pub mod shared;

pub use buffer::{Sample, SampleBuffer};
pub use persist::PersistWorker;
pub use run_loop::{AcquisitionHandle, AcquisitionLoop, TickOutcome};
pub use shared::{AcquisitionCounters, AcquisitionStats, SharedBuffers};
