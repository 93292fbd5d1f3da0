//! User record storage
//!
//! The gateway only needs point reads, inserts and a versioned
//! compare-and-swap; any document store offering those can back it.

pub mod memory;
pub mod json_file;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use json_file::{JsonFileStore, default_store_path};
pub use memory::MemoryStore;

/// Opaque, externally assigned user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Progression fields of a user document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub xp: u64,
    /// Cached `level_for_xp(xp)`
    pub level: u32,
}

impl UserRecord {
    /// Fresh account: no XP, level 1
    pub fn new(id: UserId) -> Self {
        Self { id, xp: 0, level: 1 }
    }
}

/// A stored value and the version it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Written; carries the new version
    Swapped(u64),
    /// Someone else wrote first
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no record for user {0}")]
    NotFound(UserId),

    #[error("record for user {0} already exists")]
    AlreadyExists(UserId),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("{0}")]
    Unavailable(String),
}

/// Backing store for user progression records
pub trait UserStore: Send + Sync {
    fn load(&self, id: &UserId) -> Result<Option<Versioned<UserRecord>>, StoreError>;

    /// Create a record; fails if the id is taken
    fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    /// Replace the record only if it is still at `expected_version`
    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: UserRecord,
    ) -> Result<CasOutcome, StoreError>;
}

/// In-memory record map shared by the bundled stores.
///
/// Callers hold the surrounding lock for the duration of each call.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordMap {
    records: HashMap<UserId, Versioned<UserRecord>>,
}

impl RecordMap {
    /// Build from stored entries; an id listed twice is corrupt data
    pub(crate) fn from_records(
        records: impl IntoIterator<Item = Versioned<UserRecord>>,
    ) -> Result<Self, StoreError> {
        let mut map = HashMap::new();
        for record in records {
            let id = record.value.id.clone();
            if map.insert(id.clone(), record).is_some() {
                return Err(StoreError::Corrupt(format!("user {} is stored twice", id)));
            }
        }
        Ok(Self { records: map })
    }

    pub(crate) fn get(&self, id: &UserId) -> Option<Versioned<UserRecord>> {
        self.records.get(id).cloned()
    }

    pub(crate) fn insert(&mut self, record: UserRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        self.records.insert(record.id.clone(), Versioned { version: 1, value: record });
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &UserId) -> Option<Versioned<UserRecord>> {
        self.records.remove(id)
    }

    /// Returns the previous entry on success so callers can roll back
    pub(crate) fn compare_and_swap(
        &mut self,
        expected_version: u64,
        record: UserRecord,
    ) -> Result<(CasOutcome, Option<Versioned<UserRecord>>), StoreError> {
        let entry = self
            .records
            .get_mut(&record.id)
            .ok_or_else(|| StoreError::NotFound(record.id.clone()))?;

        if entry.version != expected_version {
            return Ok((CasOutcome::Conflict, None));
        }

        let version = entry.version + 1;
        let previous = std::mem::replace(entry, Versioned { version, value: record });
        Ok((CasOutcome::Swapped(version), Some(previous)))
    }

    pub(crate) fn restore(&mut self, previous: Versioned<UserRecord>) {
        self.records.insert(previous.value.id.clone(), previous);
    }

    /// Records sorted by id
    pub(crate) fn sorted(&self) -> Vec<Versioned<UserRecord>> {
        let mut all: Vec<_> = self.records.values().cloned().collect();
        all.sort_by(|a, b| a.value.id.cmp(&b.value.id));
        all
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut map = RecordMap::default();
        map.insert(UserRecord::new("alice".into())).unwrap();

        let stored = map.get(&"alice".into()).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.value, UserRecord::new("alice".into()));

        assert_eq!(
            map.insert(UserRecord::new("alice".into())),
            Err(StoreError::AlreadyExists("alice".into()))
        );
    }

    #[test]
    fn test_compare_and_swap() {
        let mut map = RecordMap::default();
        map.insert(UserRecord::new("bob".into())).unwrap();

        let updated = UserRecord { id: "bob".into(), xp: 10, level: 1 };
        let (outcome, previous) = map.compare_and_swap(1, updated.clone()).unwrap();
        assert_eq!(outcome, CasOutcome::Swapped(2));
        assert_eq!(previous.unwrap().value.xp, 0);

        // Stale version loses
        let (outcome, _) = map.compare_and_swap(1, updated).unwrap();
        assert_eq!(outcome, CasOutcome::Conflict);
        assert_eq!(map.get(&"bob".into()).unwrap().value.xp, 10);
    }

    #[test]
    fn test_cas_missing_user() {
        let mut map = RecordMap::default();
        let result = map.compare_and_swap(1, UserRecord::new("ghost".into()));
        assert_eq!(result, Err(StoreError::NotFound("ghost".into())));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let records = vec![
            Versioned { version: 3, value: UserRecord { id: "eve".into(), xp: 5000, level: 5 } },
            Versioned { version: 1, value: UserRecord { id: "eve".into(), xp: 10, level: 1 } },
        ];
        assert!(matches!(RecordMap::from_records(records), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_sorted_by_id() {
        let mut map = RecordMap::default();
        for id in ["carol", "alice", "bob"] {
            map.insert(UserRecord::new(id.into())).unwrap();
        }
        let ids: Vec<_> = map.sorted().into_iter().map(|r| r.value.id.to_string()).collect();
        assert_eq!(ids, ["alice", "bob", "carol"]);
        assert_eq!(map.len(), 3);
    }
}
