//! Recording sessions: milestone markers, the Idle/Recording state machine,
//! and the persisted session record.

pub mod marker;
pub mod record;
pub mod session;

pub use marker::{MarkerSet, MarkerState, MilestoneKind, MilestoneMarker};
pub use record::{elapsed_seconds, SessionRecord};
pub use session::{
    FinishedSession, MilestoneUpdate, RecordingController, RecordingSession, RecordingState,
    RecordingStatus, StopReason,
};
