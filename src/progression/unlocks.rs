//! Level-gated feature unlocks
//!
//! A static table of `(min_level, feature)` entries. Unlocks are cumulative:
//! a player has every feature whose `min_level` is at or below their level.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ProgressionError, Result};

/// One gated feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUnlock {
    /// Lowest level at which the feature is available
    pub min_level: u32,
    /// Stable key used by callers, e.g. `"trading-challenge"`
    pub key: String,
    /// Display name
    pub name: String,
    /// Shown while locked; defaults to "Reach level N to unlock <name>"
    #[serde(default)]
    pub message: Option<String>,
}

impl FeatureUnlock {
    pub fn new(min_level: u32, key: &str, name: &str) -> Self {
        Self {
            min_level,
            key: key.to_string(),
            name: name.to_string(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Message explaining how to unlock this feature
    pub fn lock_message(&self) -> String {
        match &self.message {
            Some(msg) => msg.clone(),
            None => format!("Reach level {} to unlock {}", self.min_level, self.name),
        }
    }
}

/// Why a feature is locked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRequirement {
    pub min_level: u32,
    pub message: String,
}

/// Result of a gate check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGate {
    pub locked: bool,
    /// Present whenever the feature is listed in the table
    pub requirement: Option<UnlockRequirement>,
}

impl FeatureGate {
    /// Gate for a feature the table knows nothing about
    pub fn open() -> Self {
        Self { locked: false, requirement: None }
    }
}

/// Validated unlock table, sorted by `min_level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureUnlock>", into = "Vec<FeatureUnlock>")]
pub struct UnlockTable {
    entries: Vec<FeatureUnlock>,
}

impl UnlockTable {
    /// Build a table, rejecting unsorted levels, level 0 and duplicate keys
    pub fn new(entries: Vec<FeatureUnlock>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut prev_level = 1;

        for entry in &entries {
            if entry.key.trim().is_empty() {
                return Err(ProgressionError::Configuration("feature key must not be empty".into()));
            }
            if entry.min_level == 0 {
                return Err(ProgressionError::Configuration(format!(
                    "feature '{}' has min_level 0; levels start at 1",
                    entry.key
                )));
            }
            if entry.min_level < prev_level {
                return Err(ProgressionError::Configuration(format!(
                    "unlock table is not sorted by level: '{}' (level {}) follows level {}",
                    entry.key, entry.min_level, prev_level
                )));
            }
            if !seen.insert(entry.key.as_str()) {
                return Err(ProgressionError::Configuration(format!(
                    "feature '{}' is listed twice",
                    entry.key
                )));
            }
            prev_level = entry.min_level;
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FeatureUnlock] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&FeatureUnlock> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Every feature available at `level`
    pub fn unlocked_at(&self, level: u32) -> Vec<&FeatureUnlock> {
        self.entries.iter().filter(|e| e.min_level <= level).collect()
    }

    /// Features whose `min_level` lies in `(old_level, new_level]`
    pub fn unlocked_between(&self, old_level: u32, new_level: u32) -> Vec<&FeatureUnlock> {
        self.entries
            .iter()
            .filter(|e| e.min_level > old_level && e.min_level <= new_level)
            .collect()
    }

    /// Check `feature_key` at `level`. Unknown keys are never locked.
    pub fn resolve_gate(&self, level: u32, feature_key: &str) -> FeatureGate {
        match self.get(feature_key) {
            Some(entry) => FeatureGate {
                locked: level < entry.min_level,
                requirement: Some(UnlockRequirement {
                    min_level: entry.min_level,
                    message: entry.lock_message(),
                }),
            },
            None => FeatureGate::open(),
        }
    }
}

impl Default for UnlockTable {
    fn default() -> Self {
        Self { entries: default_unlocks() }
    }
}

impl TryFrom<Vec<FeatureUnlock>> for UnlockTable {
    type Error = ProgressionError;

    fn try_from(entries: Vec<FeatureUnlock>) -> Result<Self> {
        Self::new(entries)
    }
}

impl From<UnlockTable> for Vec<FeatureUnlock> {
    fn from(table: UnlockTable) -> Self {
        table.entries
    }
}

/// The stock StockVerse unlock ladder
pub fn default_unlocks() -> Vec<FeatureUnlock> {
    vec![
        // Available from the start
        FeatureUnlock::new(1, "trading", "Stock Trading"),
        FeatureUnlock::new(1, "portfolio", "Portfolio"),
        FeatureUnlock::new(1, "quizzes", "Market Quizzes"),

        FeatureUnlock::new(2, "mini-games", "Mini Games"),
        FeatureUnlock::new(3, "trading-challenge", "Trading Challenge")
            .with_message("Reach level 3 to unlock Trading Challenges"),
        FeatureUnlock::new(5, "fantasy-league", "Fantasy League"),
        FeatureUnlock::new(7, "watchlists", "Watchlists"),
        FeatureUnlock::new(10, "leaderboard", "Global Leaderboard"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = UnlockTable::new(default_unlocks()).unwrap();
        assert_eq!(table, UnlockTable::default());
        assert_eq!(table.get("trading-challenge").unwrap().min_level, 3);
    }

    #[test]
    fn test_gate_locked_below_level() {
        let table = UnlockTable::default();

        let gate = table.resolve_gate(2, "trading-challenge");
        assert!(gate.locked);
        let req = gate.requirement.unwrap();
        assert_eq!(req.min_level, 3);
        assert_eq!(req.message, "Reach level 3 to unlock Trading Challenges");

        assert!(!table.resolve_gate(3, "trading-challenge").locked);
        assert!(!table.resolve_gate(40, "trading-challenge").locked);
    }

    #[test]
    fn test_default_message() {
        let table = UnlockTable::default();
        let gate = table.resolve_gate(1, "fantasy-league");
        assert_eq!(
            gate.requirement.unwrap().message,
            "Reach level 5 to unlock Fantasy League"
        );
    }

    #[test]
    fn test_unknown_feature_fails_open() {
        let table = UnlockTable::default();
        for level in [1, 2, 50] {
            assert_eq!(table.resolve_gate(level, "nonexistent-key"), FeatureGate::open());
        }
    }

    #[test]
    fn test_unlocked_at_is_cumulative() {
        let table = UnlockTable::default();
        let keys: Vec<_> = table.unlocked_at(5).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            ["trading", "portfolio", "quizzes", "mini-games", "trading-challenge", "fantasy-league"]
        );
        assert_eq!(table.unlocked_at(5), table.unlocked_at(5)); // Idempotent
    }

    #[test]
    fn test_unlocked_between_is_half_open() {
        let table = UnlockTable::default();
        let keys: Vec<_> = table.unlocked_between(2, 5).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["trading-challenge", "fantasy-league"]);
        assert!(table.unlocked_between(3, 3).is_empty());
    }

    #[test]
    fn test_rejects_bad_tables() {
        let unsorted = vec![
            FeatureUnlock::new(3, "a", "A"),
            FeatureUnlock::new(2, "b", "B"),
        ];
        assert!(matches!(UnlockTable::new(unsorted), Err(ProgressionError::Configuration(_))));

        let duplicate = vec![
            FeatureUnlock::new(2, "a", "A"),
            FeatureUnlock::new(4, "a", "A again"),
        ];
        assert!(UnlockTable::new(duplicate).is_err());

        assert!(UnlockTable::new(vec![FeatureUnlock::new(0, "a", "A")]).is_err());
        assert!(UnlockTable::new(vec![FeatureUnlock::new(1, " ", "Blank")]).is_err());
    }
}
