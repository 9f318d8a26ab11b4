// Managers Module
//
// Focused manager types extracted from AcquisitionContext.
//
// - BroadcastChannelManager: tokio broadcast channels for samples and
//   recording lifecycle events

pub mod broadcast_manager;

pub use broadcast_manager::{BroadcastChannelManager, RecordingEvent};
