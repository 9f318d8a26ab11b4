//! Roast persistence.
//!
//! The acquisition core only needs [`RoastStore::save`]; the history view and
//! CLI use the listing, loading and editing operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::recording::SessionRecord;

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::InMemoryStore;

/// Identifier assigned by the store on save
pub type RoastId = u64;

/// One row of the saved-roast listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoastSummary {
    pub id: RoastId,
    pub start_time: DateTime<Utc>,
    pub bean_info: Option<String>,
}

impl RoastSummary {
    pub fn from_record(id: RoastId, record: &SessionRecord) -> Self {
        Self {
            id,
            start_time: record.start_time,
            bean_info: record.bean_info.clone(),
        }
    }
}

/// Durable store for finished roasts.
///
/// Implementations are shared between the acquisition loop (which persists
/// force-stopped sessions from its persist worker) and request handlers.
pub trait RoastStore: Send + Sync {
    /// Persist a record and return its new id
    fn save(&self, record: &SessionRecord) -> Result<RoastId, StoreError>;

    /// Summaries of every saved roast, newest first
    fn list_summaries(&self) -> Result<Vec<RoastSummary>, StoreError>;

    fn load(&self, id: RoastId) -> Result<SessionRecord, StoreError>;

    /// Replace the bean description of a saved roast
    fn update_bean_info(&self, id: RoastId, bean_info: Option<String>) -> Result<(), StoreError>;

    fn delete(&self, id: RoastId) -> Result<(), StoreError>;
}

/// Sort newest first; ties broken by the higher id
pub(crate) fn sort_newest_first(summaries: &mut [RoastSummary]) {
    summaries.sort_by(|a, b| {
        b.start_time
            .cmp(&a.start_time)
            .then_with(|| b.id.cmp(&a.id))
    });
}
