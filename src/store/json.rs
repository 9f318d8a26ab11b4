// JsonFileStore - one pretty-printed JSON file per roast
//
// Files are named `roast_<id>.json` inside the data directory. Ids are
// allocated as max existing id + 1 under a process-local write lock, and every
// write goes through a temp file that is renamed into place so a crash never
// leaves a half-written roast behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::recording::SessionRecord;

use super::{sort_newest_first, RoastId, RoastStore, RoastSummary};

const FILE_PREFIX: &str = "roast_";
const FILE_EXTENSION: &str = "json";

pub struct JsonFileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store rooted at `data_dir`; the directory is created on first save
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, id: RoastId) -> PathBuf {
        self.data_dir
            .join(format!("{}{:05}.{}", FILE_PREFIX, id, FILE_EXTENSION))
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Ids of every roast file in the data directory, ascending
    fn ids(&self) -> Result<Vec<RoastId>, StoreError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if let Some(id) = parse_id(&path) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn write_record(&self, id: RoastId, record: &SessionRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(record)?;

        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read_record(&self, id: RoastId) -> Result<SessionRecord, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound { id });
        }
        let json = fs::read_to_string(&path)?;
        let record: SessionRecord = serde_json::from_str(&json)?;
        Ok(record)
    }
}

fn parse_id(path: &Path) -> Option<RoastId> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.strip_prefix(FILE_PREFIX))
        .and_then(|digits| digits.parse().ok())
}

impl RoastStore for JsonFileStore {
    fn save(&self, record: &SessionRecord) -> Result<RoastId, StoreError> {
        record.validate()?;
        let _guard = self.lock_writes()?;

        let id = self.ids()?.last().map_or(1, |last| last + 1);
        self.write_record(id, record)?;
        log::info!(
            "[JsonFileStore] Saved roast {} ({} samples) to {:?}",
            id,
            record.temperatures.len(),
            self.path_for(id)
        );
        Ok(id)
    }

    fn list_summaries(&self) -> Result<Vec<RoastSummary>, StoreError> {
        let mut summaries = Vec::new();
        for id in self.ids()? {
            match self.read_record(id) {
                Ok(record) => summaries.push(RoastSummary::from_record(id, &record)),
                Err(err) => {
                    log::warn!("[JsonFileStore] Skipping unreadable roast {}: {}", id, err);
                }
            }
        }
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    fn load(&self, id: RoastId) -> Result<SessionRecord, StoreError> {
        self.read_record(id)
    }

    fn update_bean_info(&self, id: RoastId, bean_info: Option<String>) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        let mut record = self.read_record(id)?;
        record.bean_info = bean_info;
        self.write_record(id, &record)
    }

    fn delete(&self, id: RoastId) -> Result<(), StoreError> {
        let _guard = self.lock_writes()?;
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound { id });
        }
        fs::remove_file(&path)?;
        log::info!("[JsonFileStore] Deleted roast {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};

    fn record(start_secs: i64, bean: Option<&str>) -> SessionRecord {
        SessionRecord {
            start_time: DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(start_secs),
            elapsed_seconds: vec![0.0, 1.0, 2.0],
            temperatures: vec![68.0, 69.8, 71.6],
            bean_info: bean.map(str::to_string),
            first_crack_elapsed_seconds: Some(1.0),
            first_crack_temp: Some(69.8),
            second_crack_elapsed_seconds: None,
            second_crack_temp: None,
            tasting_comments: None,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("roasts"));

        let original = record(1_700_000_000, Some("Ethiopia Guji"));
        let id = store.save(&original).unwrap();
        assert_eq!(id, 1);
        assert_eq!(store.load(id).unwrap(), original);
    }

    #[test]
    fn test_ids_continue_after_max() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let first = store.save(&record(0, None)).unwrap();
        let second = store.save(&record(10, None)).unwrap();
        store.delete(first).unwrap();
        let third = store.save(&record(20, None)).unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
    }

    #[test]
    fn test_list_summaries_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(&record(100, Some("first"))).unwrap();
        store.save(&record(300, Some("third"))).unwrap();
        store.save(&record(200, Some("second"))).unwrap();

        let beans: Vec<_> = store
            .list_summaries()
            .unwrap()
            .into_iter()
            .map(|s| s.bean_info.unwrap())
            .collect();
        assert_eq!(beans, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent"));
        assert!(store.list_summaries().unwrap().is_empty());
    }

    #[test]
    fn test_unrelated_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        fs::write(dir.path().join("roast_abc.json"), "{}").unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.save(&record(0, None)).unwrap(), 1);
        assert_eq!(store.list_summaries().unwrap().len(), 1);
    }

    #[test]
    fn test_update_bean_info_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let id = store.save(&record(0, Some("old"))).unwrap();

        store.update_bean_info(id, Some("new".into())).unwrap();
        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.load(id).unwrap().bean_info.as_deref(), Some("new"));
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.load(7), Err(StoreError::NotFound { id: 7 }));
        assert_eq!(
            store.update_bean_info(7, None),
            Err(StoreError::NotFound { id: 7 })
        );
        assert_eq!(store.delete(7), Err(StoreError::NotFound { id: 7 }));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("roast_00004.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(
            store.load(4),
            Err(StoreError::Serialization { .. })
        ));
        assert!(store.list_summaries().unwrap().is_empty());
    }
}
