// Roast Monitor Core
// Temperature acquisition, roast recording, and saved-roast history

// Module declarations
pub mod acquisition;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod live;
pub mod managers;
pub mod recording;
pub mod sensor;
pub mod store;
pub mod units;

#[cfg(feature = "http")]
pub mod http;

// Re-exports for convenience
pub use acquisition::{AcquisitionLoop, Sample, TickOutcome};
pub use config::AppConfig;
pub use context::AcquisitionContext;
pub use live::LiveView;
pub use recording::{MilestoneKind, RecordingState, SessionRecord};
pub use units::TemperatureUnit;
