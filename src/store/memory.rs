//! In-process user store

use parking_lot::Mutex;

use super::{CasOutcome, RecordMap, StoreError, UserId, UserRecord, UserStore, Versioned};

/// Mutex-guarded map; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<RecordMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, every record at version 1. Fails on a repeated id.
    pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Result<Self, StoreError> {
        let map = RecordMap::from_records(
            records.into_iter().map(|value| Versioned { version: 1, value }),
        )?;
        Ok(Self { records: Mutex::new(map) })
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStore for MemoryStore {
    fn load(&self, id: &UserId) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        Ok(self.records.lock().get(id))
    }

    fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        self.records.lock().insert(record)
    }

    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: UserRecord,
    ) -> Result<CasOutcome, StoreError> {
        let (outcome, _) = self.records.lock().compare_and_swap(expected_version, record)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_records() {
        let store = MemoryStore::with_records([UserRecord { id: "alice".into(), xp: 1500, level: 2 }]).unwrap();
        assert_eq!(store.len(), 1);

        let loaded = store.load(&"alice".into()).unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.value.xp, 1500);
        assert_eq!(store.load(&"bob".into()).unwrap(), None);

        let twice = MemoryStore::with_records([
            UserRecord::new("alice".into()),
            UserRecord::new("alice".into()),
        ]);
        assert!(matches!(twice, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_versions_advance() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.insert(UserRecord::new("alice".into())).unwrap();

        let next = UserRecord { id: "alice".into(), xp: 5, level: 1 };
        assert_eq!(store.compare_and_swap(1, next.clone()), Ok(CasOutcome::Swapped(2)));
        assert_eq!(store.compare_and_swap(1, next), Ok(CasOutcome::Conflict));
    }
}
