// InMemoryStore - mutex-guarded map of roasts, used by tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::recording::SessionRecord;

use super::{sort_newest_first, RoastId, RoastStore, RoastSummary};

#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<BTreeMap<RoastId, SessionRecord>>,
    save_count: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Saved records in id order
    pub fn records(&self) -> Result<Vec<(RoastId, SessionRecord)>, StoreError> {
        Ok(self
            .lock_records()?
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, BTreeMap<RoastId, SessionRecord>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl RoastStore for InMemoryStore {
    fn save(&self, record: &SessionRecord) -> Result<RoastId, StoreError> {
        record.validate()?;
        let mut records = self.lock_records()?;
        let id = records.keys().next_back().map_or(1, |last| last + 1);
        records.insert(id, record.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    fn list_summaries(&self) -> Result<Vec<RoastSummary>, StoreError> {
        let mut summaries: Vec<RoastSummary> = self
            .lock_records()?
            .iter()
            .map(|(id, record)| RoastSummary::from_record(*id, record))
            .collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    fn load(&self, id: RoastId) -> Result<SessionRecord, StoreError> {
        self.lock_records()?
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    fn update_bean_info(&self, id: RoastId, bean_info: Option<String>) -> Result<(), StoreError> {
        let mut records = self.lock_records()?;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        record.bean_info = bean_info;
        Ok(())
    }

    fn delete(&self, id: RoastId) -> Result<(), StoreError> {
        self.lock_records()?
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { id })
    }
}
