//! JSON file user store
//!
//! Keeps every record in memory and rewrites one pretty-printed JSON file
//! after each successful write.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{CasOutcome, RecordMap, StoreError, UserId, UserRecord, UserStore, Versioned};

/// Store file version for compatibility checking
const STORE_VERSION: u32 = 1;

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    users: Vec<Versioned<UserRecord>>,
}

/// Get the default store file path
pub fn default_store_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "stockverse", "StockVerse") {
        let mut path = proj_dirs.data_local_dir().to_path_buf();
        path.push("users.json");
        path
    } else {
        PathBuf::from("./users.json")
    }
}

/// File-backed store
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<RecordMap>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let data = fs::read_to_string(&path)
                .map_err(|e| StoreError::Unavailable(format!("failed to read {:?}: {}", path, e)))?;
            let file: StoreFile = serde_json::from_str(&data)
                .map_err(|e| StoreError::Corrupt(format!("failed to parse {:?}: {}", path, e)))?;
            if file.version != STORE_VERSION {
                return Err(StoreError::Corrupt(format!(
                    "store version mismatch: expected {}, found {}",
                    STORE_VERSION, file.version
                )));
            }
            log::info!("Loaded {} user records from {:?}", file.users.len(), path);
            RecordMap::from_records(file.users)?
        } else {
            log::info!("No user store at {:?}, starting empty", path);
            RecordMap::default()
        };

        Ok(Self { path, records: Mutex::new(records) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole map; the caller holds the lock
    fn persist(&self, records: &RecordMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let file = StoreFile { version: STORE_VERSION, users: records.sorted() };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        log::debug!("User store saved to {:?}", self.path);
        Ok(())
    }
}

impl UserStore for JsonFileStore {
    fn load(&self, id: &UserId) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        Ok(self.records.lock().get(id))
    }

    fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let id = record.id.clone();
        records.insert(record)?;

        if let Err(e) = self.persist(&records) {
            records.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: UserRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut records = self.records.lock();
        let (outcome, previous) = records.compare_and_swap(expected_version, record)?;

        if let Some(previous) = previous {
            if let Err(e) = self.persist(&records) {
                records.restore(previous);
                return Err(e);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("stockverse-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&path);
        path.push("users.json");
        path
    }

    #[test]
    fn test_survives_reopen() {
        let path = temp_path("reopen");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.insert(UserRecord::new("alice".into())).unwrap();
            let next = UserRecord { id: "alice".into(), xp: 2500, level: 3 };
            assert_eq!(store.compare_and_swap(1, next), Ok(CasOutcome::Swapped(2)));
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        let loaded = reopened.load(&"alice".into()).unwrap().unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.value, UserRecord { id: "alice".into(), xp: 2500, level: 3 });
    }

    #[test]
    fn test_conflict_does_not_write() {
        let path = temp_path("conflict");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(UserRecord::new("bob".into())).unwrap();

        let stale = UserRecord { id: "bob".into(), xp: 99, level: 1 };
        assert_eq!(store.compare_and_swap(7, stale), Ok(CasOutcome::Conflict));

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.load(&"bob".into()).unwrap().unwrap().value.xp, 0);
    }

    #[test]
    fn test_rejects_garbage_file() {
        let path = temp_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_duplicate_user() {
        let path = temp_path("duplicate");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"version":1,"users":[
                {"version":3,"value":{"id":"eve","xp":5000,"level":5}},
                {"version":1,"value":{"id":"eve","xp":10,"level":1}}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let path = temp_path("rollback");
        let store = JsonFileStore::open(&path).unwrap();
        store.insert(UserRecord::new("alice".into())).unwrap();

        // A directory where the temp file goes makes every write fail
        fs::create_dir_all(path.with_extension("json.tmp")).unwrap();

        let next = UserRecord { id: "alice".into(), xp: 500, level: 1 };
        assert!(matches!(store.compare_and_swap(1, next), Err(StoreError::Unavailable(_))));
        let kept = store.load(&"alice".into()).unwrap().unwrap();
        assert_eq!((kept.version, kept.value.xp), (1, 0));

        assert!(matches!(
            store.insert(UserRecord::new("bob".into())),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.load(&"bob".into()).unwrap(), None);

        // The file on disk still holds the last good state
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.load(&"alice".into()).unwrap().unwrap().value.xp, 0);
        assert_eq!(reopened.load(&"bob".into()).unwrap(), None);
    }

    #[test]
    fn test_rejects_negative_xp() {
        let path = temp_path("negative");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"version":1,"users":[{"version":1,"value":{"id":"eve","xp":-5,"level":1}}]}"#,
        )
        .unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_newer_version() {
        let path = temp_path("version");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"version":2,"users":[]}"#).unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Corrupt(_))));
    }
}
